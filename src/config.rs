use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env as std_env;
use std::str::FromStr;
use strum::EnumString;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CACHE_BACKEND: &str = "in-memory";
const DEFAULT_OUTPUT_DIR: &str = "receipts";

/// Supported cache backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CacheBackendKind {
    InMemory,
    Redis,
}

/// Cache configuration
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CacheConfig {
    /// Cache backend: "in-memory" or "redis"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Redis connection URL, used when backend is "redis"
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl CacheConfig {
    /// Parsed backend kind; unknown values fall back to in-memory.
    pub fn backend_kind(&self) -> CacheBackendKind {
        CacheBackendKind::from_str(&self.backend).unwrap_or(CacheBackendKind::InMemory)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
        }
    }
}

/// Application configuration, read once at process start and passed
/// by reference to every component.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Identifier of the backing tabular store document
    #[validate(length(min = 1))]
    pub store_id: String,

    /// Folder receipt exports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Asset identifier of the scan-guide image shown by the front end
    #[serde(default)]
    pub guide_image_id: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_cache_backend() -> String {
    DEFAULT_CACHE_BACKEND.to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load configuration from `config/*.toml` plus `APP__*` environment
/// overrides (e.g. `APP__STORE_ID`, `APP__CACHE__BACKEND`).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std_env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let config = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;
    Ok(app_config)
}

/// Initialise the tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stockroom_api={},tower_http=debug", level);
    let filter_directive = std_env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}
