use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub paystack: PaystackConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaystackConfig {
    #[serde(default)]
    pub enabled: bool,
    pub secret_key: Option<String>,
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Reject webhook deliveries whose `x-paystack-signature` does not match.
    #[serde(default = "default_true")]
    pub verify_signatures: bool,
    /// Where the hosted checkout sends the client after paying.
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub uploads_dir: String,
    pub max_file_size_mb: usize,
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_currency() -> String {
    "NGN".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_key: None,
            base_url: default_paystack_base_url(),
            currency: default_currency(),
            verify_signatures: true,
            callback_url: None,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://studiobook.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("paystack.enabled", false)?
            .set_default("storage.uploads_dir", "uploads")?
            .set_default("storage.max_file_size_mb", 10)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with STUDIOBOOK__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("STUDIOBOOK").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://studiobook.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
                secure_cookies: false,
            },
            paystack: PaystackConfig::default(),
            storage: StorageConfig {
                uploads_dir: "uploads".to_string(),
                max_file_size_mb: 10,
            },
        }
    }
}
