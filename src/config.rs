use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

#[derive(Clone)]
pub struct BlobStoreConfig {
    pub base_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub timeout: Duration,
}

impl fmt::Debug for BlobStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStoreConfig")
            .field("base_url", &self.base_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[redacted]")
            .field("folder", &self.folder)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub blob_store: BlobStoreConfig,
    pub max_upload_bytes: usize,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: parsed_or("PORT", 3000)?,
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_secs(parsed_or("DB_ACQUIRE_TIMEOUT_SECS", 10)?),
                idle_timeout: Duration::from_secs(parsed_or("DB_IDLE_TIMEOUT_SECS", 45)?),
            },
            blob_store: BlobStoreConfig {
                base_url: env::var("CLOUDINARY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.cloudinary.com".to_string()),
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                folder: env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "DevEvent".to_string()),
                timeout: Duration::from_secs(parsed_or("UPLOAD_TIMEOUT_SECS", 30)?),
            },
            max_upload_bytes: parsed_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }
}
