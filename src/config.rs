use std::{path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Directory uploaded posters are written to.
    pub upload_dir: PathBuf,
    /// Public URL prefix `upload_dir` is served under, e.g. `/static/images`.
    pub static_url_prefix: String,
    pub max_upload_bytes: usize,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let max_upload_mb: usize = parse_env("MAX_UPLOAD_MB", 20)?;
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://movies.db".into()),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 5)?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "static/images".into())
                .into(),
            static_url_prefix: static_prefix(
                &std::env::var("STATIC_URL_PREFIX").unwrap_or_else(|_| "/static/images".into()),
            )?,
            max_upload_bytes: upload_limit(max_upload_mb)?,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("APP_PORT", 8080)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        Err(_) => Ok(default),
    }
}

/// Leading slash, no trailing slash.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{trimmed}")
}

/// Posters are mounted under this prefix, so it cannot be the site root.
fn static_prefix(raw: &str) -> anyhow::Result<String> {
    let prefix = normalize_prefix(raw);
    if prefix == "/" {
        bail!("STATIC_URL_PREFIX must name a path below the root, got {raw:?}");
    }
    Ok(prefix)
}

fn upload_limit(max_upload_mb: usize) -> anyhow::Result<usize> {
    max_upload_mb
        .checked_mul(1024 * 1024)
        .with_context(|| format!("MAX_UPLOAD_MB is too large: {max_upload_mb}"))
}
