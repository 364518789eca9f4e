//! Configuration is read from the environment once at startup; a `.env` file
//! is honored for local development. Everything has a development default so
//! a bare `cargo run` works.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub summarizer_url: String,
    pub summarizer_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("RECAP_HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port_raw = std::env::var("RECAP_PORT").unwrap_or_else(|_| "5001".into());
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue("RECAP_PORT", port_raw.clone()))?;

        let db_path = std::env::var("RECAP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("recap.db"));

        let jwt_secret =
            std::env::var("RECAP_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());

        let summarizer_url = std::env::var("SUMMARIZER_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into());

        // The collaborator scrapes the web before answering, so the default
        // budget is generous; it still bounds the wait.
        let timeout_raw =
            std::env::var("SUMMARIZER_TIMEOUT_SECS").unwrap_or_else(|_| "120".into());
        let timeout_secs: u64 = timeout_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SUMMARIZER_TIMEOUT_SECS", timeout_raw.clone()))?;

        Ok(Self {
            host,
            port,
            db_path,
            jwt_secret,
            summarizer_url,
            summarizer_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
