use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use crate::auth::AuthConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Process-wide settings, loaded once in `main` and handed to the router.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub auth: AuthConfig,
    pub allow_admin_setup: bool,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://lessonhub.db".to_string());

        let bind_address = env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS", e.to_string()))?;

        let jwt_secret = env::var("AUTH_JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("AUTH_JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "AUTH_JWT_SECRET",
                "must not be empty".to_string(),
            ));
        }

        let allow_admin_setup = match env::var("ALLOW_ADMIN_SETUP") {
            Ok(raw) => parse_flag(&raw)
                .ok_or_else(|| ConfigError::InvalidValue("ALLOW_ADMIN_SETUP", raw.clone()))?,
            Err(_) => false,
        };

        Ok(Self {
            database_url,
            bind_address,
            auth: AuthConfig { jwt_secret },
            allow_admin_setup,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
