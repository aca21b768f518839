use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::domain::Role;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
    /// Accepted `Host` header values. Empty or `*` accepts any host.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub fallback_url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub access_token_lifetime_secs: i64,
    pub refresh_token_lifetime_secs: i64,
    pub session_duration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    /// Lowest role allowed into the admin console.
    pub minimum_role: Role,
    pub page_size: i64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            minimum_role: Role::Admin,
            page_size: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_any_origin: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allow_any_origin: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub error_log_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            error_log_path: "logs/system_errors.log".to_string(),
        }
    }
}

pub const INSECURE_DEFAULT_SECRET: &str = "change-me-in-production";

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.debug", true)?
            .set_default("server.allowed_hosts", Vec::<String>::new())?
            .set_default("database.url", "sqlite://beacon.db?mode=rwc")?
            .set_default("database.fallback_url", "sqlite://beacon.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_secs", 5)?
            .set_default("auth.secret_key", INSECURE_DEFAULT_SECRET)?
            .set_default("auth.access_token_lifetime_secs", 3600)?
            .set_default("auth.refresh_token_lifetime_secs", 86400)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("console.minimum_role", "admin")?
            .set_default("console.page_size", 10)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("logging.error_log_path", "logs/system_errors.log")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with BEACON__ prefix, double underscore separates levels)
            .add_source(
                Environment::with_prefix("BEACON")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_hosts")
                    .try_parsing(true),
            )

            // Flat variables used by existing deployments
            .set_override_option("auth.secret_key", env_var("SECRET_KEY"))?
            .set_override_option("server.debug", env_var("DEBUG").map(|v| parse_flag(&v)))?
            .set_override_option("server.allowed_hosts", env_var("ALLOWED_HOSTS").map(|v| split_list(&v)))?
            .set_override_option(
                "auth.access_token_lifetime_secs",
                env_var("ACCESS_TOKEN_LIFETIME").and_then(|v| v.trim().parse::<i64>().ok()),
            )?
            .set_override_option("database.url", env_var("DATABASE_URL"))?

            .build()?;

        config.try_deserialize()
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.auth.secret_key == INSECURE_DEFAULT_SECRET
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                debug: true,
                allowed_hosts: Vec::new(),
            },
            database: DatabaseConfig {
                url: "sqlite://beacon.db?mode=rwc".to_string(),
                fallback_url: "sqlite://beacon.db?mode=rwc".to_string(),
                max_connections: 10,
                connect_timeout_secs: 5,
            },
            auth: AuthConfig {
                secret_key: INSECURE_DEFAULT_SECRET.to_string(),
                access_token_lifetime_secs: 3600,
                refresh_token_lifetime_secs: 86400,
                session_duration_hours: 24,
            },
            console: ConsoleConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
