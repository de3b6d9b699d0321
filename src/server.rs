mod handlers;
mod responses;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::outbound::webhook::WebhookHttpClient;
use crate::server::handlers::health::health_check;
use crate::server::handlers::root::home;
use crate::server::handlers::webhooks::test_webhook;
use axum::http::Method;
use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, Result};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Debug, Clone)]
/// The global application state shared between all request handlers.
struct AppState {
    http_client: WebhookHttpClient,
    rate_limiter: RateLimiter,
}

pub struct Server {
    router: Router,
    listener: TcpListener,
    rate_limiter: RateLimiter,
    sweep_interval: Duration,
}

impl Server {
    /// Creates a new HTTP server.
    pub async fn new(config: &Config) -> Result<Self> {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("request", method = %request.method(), uri)
            });

        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

        let http_client =
            WebhookHttpClient::with_options(config.webhook.timeout(), &config.webhook.user_agent)
                .wrap_err("Failed to build webhook HTTP client")?;
        let rate_limiter = RateLimiter::new(config.rate_limit.limiter_config());

        let state = AppState {
            http_client,
            rate_limiter: rate_limiter.clone(),
        };

        let router = Router::new()
            .route("/", get(home))
            .route("/health", get(health_check))
            .route("/api/webhooks/test", post(test_webhook))
            .layer(cors_layer)
            .layer(trace_layer)
            .with_state(state);

        let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await
            .wrap_err_with(|| format!("Failed to bind to port {}", config.server.port))?;

        Ok(Self {
            router,
            listener,
            rate_limiter,
            sweep_interval: config.rate_limit.sweep_interval(),
        })
    }

    pub fn port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Runs the HTTP server. The rate limit sweeper lives exactly as long as
    /// the server does.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Server listening on {}", self.listener.local_addr()?);

        let sweeper = self.rate_limiter.start_sweeper(self.sweep_interval);
        let served = axum::serve(self.listener, self.router).await;
        sweeper.stop().await;

        served.wrap_err("Server terminated unexpectedly")
    }
}
