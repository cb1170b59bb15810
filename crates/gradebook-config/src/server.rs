use std::env;

use crate::{env_or, parse_flag};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prometheus exporter port, only bound when observability is enabled.
    pub metrics_port: u16,
    pub observability_enabled: bool,
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            metrics_port: 9090,
            observability_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            metrics_port: env_or("METRICS_PORT", defaults.metrics_port),
            observability_enabled: parse_flag(
                env::var("OBSERVABILITY_ENABLED").ok().as_deref(),
                defaults.observability_enabled,
            ),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}
