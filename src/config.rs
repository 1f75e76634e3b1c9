use std::env;
use std::time::Duration;
use crate::error::StartupError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub public_base_url: String,
    pub notify_service_url: String,
    pub notify_service_token: String,
    pub jwt_secret_key: String, // Ed25519 private key (PEM)
    pub jwt_public_key: String, // Ed25519 public key (PEM)
    pub auth_issuer: String,
    pub stats_cache_ttl: Duration,
    pub worker_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parsed("PORT", 3000)?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            notify_service_url: env::var("NOTIFY_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            notify_service_token: env::var("NOTIFY_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            jwt_secret_key: required("JWT_SECRET_KEY")?,
            jwt_public_key: required("JWT_PUBLIC_KEY")?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.konvite.local".to_string()),
            stats_cache_ttl: Duration::from_secs(parsed("STATS_CACHE_TTL_SECS", 300)?),
            worker_poll_interval: Duration::from_secs(parsed("WORKER_POLL_SECS", 5)?),
        })
    }
}

fn required(key: &str) -> Result<String, StartupError> {
    env::var(key).map_err(|_| StartupError::Config(format!("{} must be set", key)))
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, StartupError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| StartupError::Config(format!("{} has an invalid value '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}
