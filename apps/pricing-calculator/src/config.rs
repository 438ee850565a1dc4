use axum::http::{HeaderName, HeaderValue, Method};
use core_config::{
    app_info, env_list_or_default, env_or_default, server::ServerConfig, AppInfo, ConfigError,
    FromEnv,
};
use domain_pricing::{CleverCloudCatalog, DEFAULT_ZONE};
use std::path::PathBuf;
use std::time::Duration;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub cors: CorsConfig,
    /// Root directory of the single-page application
    pub web_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env()?;
        let server = ServerConfig::from_env()?; // SERVER_HOST=0.0.0.0, SERVER_PORT=8080
        let catalog = CatalogConfig::from_env()?;
        let cors = CorsConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            catalog,
            cors,
            web_dir: PathBuf::from(env_or_default("WEB_DIR", "web")),
        })
    }
}

/// Pricing catalog (Clever Cloud API) settings
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub default_zone: String,
}

impl FromEnv for CatalogConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_or_default("CLEVER_CLOUD_API_URL", CleverCloudCatalog::DEFAULT_API_URL);
        if api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "CLEVER_CLOUD_API_URL".to_string(),
                value: api_url,
                details: "URL must not be empty".to_string(),
            });
        }

        let raw_timeout = env_or_default("CATALOG_TIMEOUT_SECS", "30");
        let timeout_secs: u64 = raw_timeout.parse().map_err(|e| ConfigError::ParseError {
            key: "CATALOG_TIMEOUT_SECS".to_string(),
            details: format!("{}", e),
        })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CATALOG_TIMEOUT_SECS".to_string(),
                value: raw_timeout,
                details: "timeout must be at least one second".to_string(),
            });
        }

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            default_zone: env_or_default("DEFAULT_ZONE", DEFAULT_ZONE),
        })
    }
}

/// CORS settings for the `/api` routes
#[derive(Clone, Debug)]
pub struct CorsConfig {
    /// Allowed origins; `None` means any origin (`*`)
    pub allowed_origins: Option<Vec<HeaderValue>>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<HeaderName>,
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let origins = env_list_or_default("CORS_ALLOWED_ORIGINS", "http://localhost:5173");
        let allowed_origins = if origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(parse_list("CORS_ALLOWED_ORIGINS", origins, |o| {
                HeaderValue::from_str(o).map_err(|e| e.to_string())
            })?)
        };

        let allowed_methods = parse_list(
            "CORS_ALLOWED_METHODS",
            env_list_or_default("CORS_ALLOWED_METHODS", "GET,POST,PUT,DELETE,OPTIONS"),
            |m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string()),
        )?;

        let allowed_headers = parse_list(
            "CORS_ALLOWED_HEADERS",
            env_list_or_default("CORS_ALLOWED_HEADERS", "Content-Type,Connect-Protocol-Version"),
            |h| HeaderName::from_bytes(h.as_bytes()).map_err(|e| e.to_string()),
        )?;

        Ok(Self {
            allowed_origins,
            allowed_methods,
            allowed_headers,
        })
    }
}

fn parse_list<T>(
    key: &str,
    values: Vec<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Vec<T>, ConfigError> {
    values
        .into_iter()
        .map(|value| {
            parse(&value).map_err(|details| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
                details,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 10] = [
        "APP_ENV",
        "SERVER_HOST",
        "SERVER_PORT",
        "CLEVER_CLOUD_API_URL",
        "CATALOG_TIMEOUT_SECS",
        "DEFAULT_ZONE",
        "CORS_ALLOWED_ORIGINS",
        "CORS_ALLOWED_METHODS",
        "CORS_ALLOWED_HEADERS",
        "WEB_DIR",
    ];

    /// Every variable read by `Config`, unset unless overridden
    fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect()
    }

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(env_with(&[]), || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.app.name, "pricing_calculator");
            assert_eq!(config.environment, Environment::Development);
            assert_eq!(config.server.address(), "0.0.0.0:8080");
            assert_eq!(config.catalog.api_url, "https://api.clever-cloud.com/v4");
            assert_eq!(config.catalog.timeout, Duration::from_secs(30));
            assert_eq!(config.catalog.default_zone, "par");
            assert_eq!(config.web_dir, PathBuf::from("web"));

            let origins = config.cors.allowed_origins.unwrap();
            assert_eq!(origins, vec![HeaderValue::from_static("http://localhost:5173")]);
            assert_eq!(config.cors.allowed_methods.len(), 5);
            assert!(config.cors.allowed_methods.contains(&Method::OPTIONS));
            assert_eq!(
                config.cors.allowed_headers,
                vec![
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("connect-protocol-version"),
                ]
            );
        });
    }

    #[test]
    fn test_config_custom_values() {
        let vars = env_with(&[
            ("APP_ENV", "prod"),
            ("SERVER_PORT", "9090"),
            ("CLEVER_CLOUD_API_URL", "http://localhost:4000/v4"),
            ("CATALOG_TIMEOUT_SECS", "5"),
            ("DEFAULT_ZONE", "mtl"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("CORS_ALLOWED_METHODS", "get,post"),
            ("WEB_DIR", "/srv/web"),
        ]);

        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();

            assert_eq!(config.environment, Environment::Production);
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.catalog.api_url, "http://localhost:4000/v4");
            assert_eq!(config.catalog.timeout, Duration::from_secs(5));
            assert_eq!(config.catalog.default_zone, "mtl");
            assert_eq!(config.cors.allowed_origins.unwrap().len(), 2);
            assert_eq!(config.cors.allowed_methods, vec![Method::GET, Method::POST]);
            assert_eq!(config.web_dir, PathBuf::from("/srv/web"));
        });
    }

    #[test]
    fn test_wildcard_origin_allows_any() {
        temp_env::with_vars(env_with(&[("CORS_ALLOWED_ORIGINS", "*")]), || {
            let cors = CorsConfig::from_env().unwrap();
            assert!(cors.allowed_origins.is_none());
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("APP_ENV", "qa"),
            ("SERVER_PORT", "0"),
            ("CATALOG_TIMEOUT_SECS", "0"),
            ("CATALOG_TIMEOUT_SECS", "soon"),
            ("CORS_ALLOWED_HEADERS", "bad header"),
        ] {
            temp_env::with_vars(env_with(&[(key, value)]), || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains(key), "{key}={value}: {err}");
            });
        }
    }
}
