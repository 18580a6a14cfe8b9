use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub shopee: ShopeeConfig,
    #[serde(default)]
    pub tiktok: TikTokConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "target/db/marketplace.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ShopeeConfig {
    #[serde(default)]
    pub partner_id: i64,
    #[serde(default)]
    pub partner_key: String,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(default)]
    pub sandbox: bool,
}

impl ShopeeConfig {
    pub fn is_configured(&self) -> bool {
        self.partner_id > 0 && !self.partner_key.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TikTokConfig {
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub redirect_url: String,
}

impl TikTokConfig {
    pub fn is_configured(&self) -> bool {
        !self.app_key.is_empty() && !self.app_secret.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    /// Hex encoded 32-byte key; empty disables token encryption
    #[serde(default)]
    pub encryption_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    #[serde(default = "default_order_service_url")]
    pub order_service_url: String,
    #[serde(default = "default_catalog_service_url")]
    pub catalog_service_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            order_service_url: default_order_service_url(),
            catalog_service_url: default_catalog_service_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WorkerConfig {
    pub poll_interval_seconds: u64,
    pub batch_size: u64,
    pub retry_delay_seconds: i64,
    pub processing_timeout_seconds: i64,
    pub completed_retention_hours: i64,
    pub token_refresh_interval_seconds: u64,
    pub token_refresh_window_minutes: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 10,
            batch_size: 10,
            retry_delay_seconds: 60,
            processing_timeout_seconds: 600,
            completed_retention_hours: 72,
            token_refresh_interval_seconds: 300,
            token_refresh_window_minutes: 30,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_order_service_url() -> String {
    "http://localhost:8083".to_string()
}

fn default_catalog_service_url() -> String {
    "http://localhost:8082".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[database]
path = "target/db/marketplace.db"

[shopee]
partner_id = 0
partner_key = ""
redirect_url = "http://localhost:3000/api/v1/admin/marketplace/shopee/callback"
sandbox = true

[tiktok]
app_key = ""
app_secret = ""
redirect_url = "http://localhost:3000/api/v1/admin/marketplace/tiktok/callback"

[security]
encryption_key = ""

[services]
order_service_url = "http://localhost:8083"
catalog_service_url = "http://localhost:8082"

[worker]
poll_interval_seconds = 10
batch_size = 10
retry_delay_seconds = 60
processing_timeout_seconds = 600
completed_retention_hours = 72
token_refresh_interval_seconds = 300
token_refresh_window_minutes = 30
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Stores the loaded configuration for the rest of the process.
pub fn set_config(config: Config) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("Configuration already initialized, keeping the first one");
    }
}

/// Returns the process configuration (embedded defaults before `set_config`).
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| toml::from_str(DEFAULT_CONFIG).unwrap_or_default())
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "target/db/marketplace.db");
        assert_eq!(config.server.port, 3000);
        assert!(config.shopee.sandbox);
        assert!(!config.shopee.is_configured());
        assert!(!config.tiktok.is_configured());
        assert_eq!(config.worker.batch_size, 10);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tiktok]
            app_key = "key"
            app_secret = "secret"

            [worker]
            batch_size = 25
            "#,
        )
        .unwrap();
        assert!(config.tiktok.is_configured());
        assert_eq!(config.worker.batch_size, 25);
        assert_eq!(config.worker.retry_delay_seconds, 60);
        assert_eq!(config.database.path, "target/db/marketplace.db");
        assert_eq!(config.services.order_service_url, "http://localhost:8083");
    }

    #[test]
    fn test_absolute_database_path_is_kept() {
        let mut config = Config::default();
        let abs = std::env::temp_dir().join("marketplace.db");
        config.database.path = abs.to_string_lossy().to_string();
        assert_eq!(get_database_path(&config).unwrap(), abs);
    }
}
