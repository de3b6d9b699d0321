use std::collections::HashMap;

use pos_webhooks::{config::Config, server::Server};

pub async fn spawn_server() -> String {
    spawn_server_with(HashMap::new()).await
}

/// Spawn a server on an ephemeral port with extra config overrides.
#[allow(dead_code)]
pub async fn spawn_server_with(overrides: HashMap<String, String>) -> String {
    let config = {
        let mut config = Config::load_with_overrides(overrides).unwrap();
        config.server.host = "localhost".to_string();
        config.server.port = 0;
        config
    };

    let server = Server::new(&config).await.unwrap();

    let port = server.port().unwrap();
    tokio::spawn(server.run());

    format!("http://{}:{}", config.server.host, port)
}
