use std::time::Duration;

use thiserror::Error;

/// Longest sliding session lifetime accepted from the environment
pub const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    /// Files shown per category page
    pub page_size: u64,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub redis_url: String,
    /// Sliding time-to-live applied on login and on every authenticated request
    pub lifetime: Duration,
    /// Adds the `Secure` attribute to the session cookie
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded file contents
    pub local_storage_path: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            lifetime: Duration::from_secs(30 * 60),
            secure_cookies: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_storage_path: "./files".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let session_backend = match std::env::var("SESSION_BACKEND")
            .unwrap_or_else(|_| "redis".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            _ => SessionBackend::Redis,
        };

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let lifetime_secs = parse_var("SESSION_LIFETIME_SECS", 30 * 60)?;

        let secure_cookies = std::env::var("SECURE_COOKIES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let page_size = parse_var("PAGE_SIZE", 15)?;

        let max_upload_size = parse_var("MAX_UPLOAD_SIZE", 50 * 1024 * 1024)?; // 50MB

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            session: SessionConfig {
                backend: session_backend,
                redis_url,
                lifetime: Duration::from_secs(lifetime_secs),
                secure_cookies,
            },
            storage: StorageConfig { local_storage_path },
            page_size,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.lifetime.is_zero() {
            return Err(ConfigError::ValidationError(
                "SESSION_LIFETIME_SECS must be greater than 0".to_string(),
            ));
        }

        if self.session.lifetime > MAX_SESSION_LIFETIME {
            return Err(ConfigError::ValidationError(format!(
                "SESSION_LIFETIME_SECS must be at most {}",
                MAX_SESSION_LIFETIME.as_secs()
            )));
        }

        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.session.backend == SessionBackend::Memory {
            tracing::warn!(
                "Using the in-memory session store. Sessions are lost on restart \
                 and are not shared between processes."
            );
        }

        Ok(())
    }
}

/// Read a numeric variable, falling back to `default` when unset.
fn parse_var(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::ValidationError(format!("{key} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
