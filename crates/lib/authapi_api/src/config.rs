//! API server configuration.

use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("database URL must not be empty")]
    EmptyDatabaseUrl,

    #[error("at least one allowed origin is required")]
    NoAllowedOrigins,

    #[error("wildcard '*' is not allowed in {0} when credentials are enabled")]
    Wildcard(&'static str),
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// CORS allowed origins.
    pub allowed_origins: Vec<String>,
    /// CORS allowed (and exposed) headers.
    pub allowed_headers: Vec<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("allowed_origins", &self.allowed_origins)
            .field("allowed_headers", &self.allowed_headers)
            .finish()
    }
}

impl ApiConfig {
    /// Check required values. CORS runs with credentials, so wildcards are
    /// rejected up front instead of panicking when the layer is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::NoAllowedOrigins);
        }
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::Wildcard("allowed origins"));
        }
        if self.allowed_headers.iter().any(|h| h == "*") {
            return Err(ConfigError::Wildcard("allowed headers"));
        }
        Ok(())
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: "postgres://localhost:5432/authapi".into(),
            jwt_secret: "secret".into(),
            allowed_origins: vec!["http://localhost:3000".into()],
            allowed_headers: vec!["Authorization".into()],
        }
    }

    #[test]
    fn parse_list_splits_and_trims() {
        assert_eq!(
            parse_list("http://a.com, http://b.com ,"),
            vec!["http://a.com", "http://b.com"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let cfg = ApiConfig {
            jwt_secret: String::new(),
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptySecret)));
    }

    #[test]
    fn missing_origins_are_rejected() {
        let cfg = ApiConfig {
            allowed_origins: vec![],
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::NoAllowedOrigins)));
    }

    #[test]
    fn wildcards_are_rejected() {
        let cfg = ApiConfig {
            allowed_origins: vec!["*".into()],
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Wildcard(_))));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("redacted"));
    }
}
