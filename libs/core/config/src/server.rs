use crate::{env_or_default, ConfigError, FromEnv};
use std::net::Ipv4Addr;

/// Server configuration for HTTP APIs
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables with sensible defaults:
    /// - SERVER_HOST: defaults to Ipv4Addr::UNSPECIFIED (0.0.0.0 - all interfaces)
    /// - SERVER_PORT: defaults to 8080, must be within 1-65535
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("SERVER_HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "SERVER_HOST".to_string(),
                value: host,
                details: "host must not be empty".to_string(),
            });
        }

        let raw_port = env_or_default("SERVER_PORT", "8080");
        let port: u16 = raw_port.parse().map_err(|e| ConfigError::ParseError {
            key: "SERVER_PORT".to_string(),
            details: format!("{}", e),
        })?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SERVER_PORT".to_string(),
                value: raw_port,
                details: "port must be between 1 and 65535".to_string(),
            });
        }

        Ok(Self { host, port })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 8080,
        }
    }
}
