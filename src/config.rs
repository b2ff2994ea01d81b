use std::env;

use anyhow::Context;

use crate::pricing::TotalPolicy;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
    pub order_total_policy: TotalPolicy,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_BYTES must be a byte count, got {raw:?}"))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let order_total_policy = match env::var("ORDER_TOTAL_POLICY") {
            Ok(raw) => raw.parse::<TotalPolicy>()?,
            Err(_) => TotalPolicy::default(),
        };
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .filter(|origin| !origin.trim().is_empty());

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            max_upload_bytes,
            order_total_policy,
            cors_allowed_origin,
        })
    }

    /// Config for a throwaway in-memory database, used by tests and local tooling.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: jwt_secret.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            order_total_policy: TotalPolicy::default(),
            cors_allowed_origin: None,
        }
    }
}
