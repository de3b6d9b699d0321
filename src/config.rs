use std::collections::HashMap;
use std::time::Duration;

use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::infrastructure::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Outbound delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Per-attempt timeout
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Limits applied to the operator test-send route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_secs),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    /// Load from defaults plus explicit overrides instead of the process
    /// environment. Keys use dotted paths, e.g. `webhook.timeout_secs`.
    pub fn load_with_overrides(overrides: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load_with_sources(Some(overrides))
    }

    fn load_with_sources(env_vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults()?;
        // If env_vars is provided, we use it instead of system environment
        // This is to avoid systems variables pollution across tests
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // Should be in the format APP_SERVER__PORT or APP_WEBHOOK__TIMEOUT_SECS
            builder = builder.add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall deliveries or the rate limit sweeper.
    fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("webhook.timeout_secs", self.webhook.timeout_secs),
            ("rate_limit.window_secs", self.rate_limit.window_secs),
            ("rate_limit.sweep_interval_secs", self.rate_limit.sweep_interval_secs),
        ];

        match non_zero.iter().find(|(_, value)| *value == 0) {
            Some((key, _)) => Err(ConfigError::Message(format!("{key} must be greater than 0"))),
            None => Ok(()),
        }
    }

    /// Set default values for the configuration.
    /// This is used when no environment variables or config file are provided
    fn set_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        ConfigLib::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("webhook.timeout_secs", 10)?
            .set_default(
                "webhook.user_agent",
                format!("pos-webhooks/{}", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("rate_limit.max_requests", 10)?
            .set_default("rate_limit.window_secs", 60)?
            .set_default("rate_limit.sweep_interval_secs", 300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::load_with_overrides(HashMap::new()).expect("Failed to load config");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.webhook.timeout(), Duration::from_secs(10));
        assert!(config.webhook.user_agent.starts_with("pos-webhooks/"));
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.sweep_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_env_config() {
        let mut env_vars = HashMap::new();
        env_vars.insert("server.host".to_string(), "0.0.0.0".to_string());
        env_vars.insert("server.port".to_string(), "443".to_string());
        env_vars.insert("webhook.timeout_secs".to_string(), "5".to_string());

        let config = Config::load_with_overrides(env_vars).expect("Failed to load config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 443);
        assert_eq!(config.webhook.timeout_secs, 5);
    }

    #[test]
    fn test_partial_env_override() {
        let mut env_vars = HashMap::new();
        // We just override the rate limit window
        env_vars.insert("rate_limit.window_secs".to_string(), "30".to_string());

        let config = Config::load_with_overrides(env_vars).expect("Failed to load config");

        let limiter = config.rate_limit.limiter_config();
        assert_eq!(limiter.window, Duration::from_secs(30));
        // The other values should use default
        assert_eq!(limiter.max_requests, 10);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let mut env_vars = HashMap::new();
        env_vars.insert("rate_limit.sweep_interval_secs".to_string(), "0".to_string());

        let err = Config::load_with_overrides(env_vars).unwrap_err();

        assert!(err.to_string().contains("rate_limit.sweep_interval_secs"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut env_vars = HashMap::new();
        env_vars.insert("webhook.timeout_secs".to_string(), "0".to_string());

        let err = Config::load_with_overrides(env_vars).unwrap_err();

        assert!(err.to_string().contains("webhook.timeout_secs"));
    }
}
