use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub onboarding: OnboardingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Credentials and location of the database session.
///
/// Built once at process start and handed to the connection provider; nothing
/// else in the application reads these values.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    /// `host[:port]/dbname`, e.g. `localhost:5432/bank`.
    pub dsn: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dsn", &self.dsn)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("server address is invalid: {}", e)))
    }
}

/// Values stamped onto every newly opened account.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingSettings {
    /// Balance a new account starts with.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    /// Status a new account starts in.
    #[serde(default = "default_initial_status")]
    pub initial_status: String,
    /// Letters used for the first account slno when the accounts table is empty.
    #[serde(default = "default_account_slno_prefix")]
    pub account_slno_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

// --- Default Implementations ---
// Every section except [database] may be omitted from the toml.

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_initial_balance() -> Decimal { dec!(200.00) }
fn default_initial_status() -> String { "ACTIVE".to_string() }
fn default_account_slno_prefix() -> String { "A".to_string() }
fn default_log_filter() -> String { "info".to_string() }

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OnboardingSettings {
    fn default() -> Self {
        Self {
            initial_balance: default_initial_balance(),
            initial_status: default_initial_status(),
            account_slno_prefix: default_account_slno_prefix(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: None,
        }
    }
}

impl Settings {
    /// Rejects values that deserialize fine but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.username.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.username must be set".to_string()));
        }
        if self.database.dsn.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.dsn must be set".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must be greater than 0".to_string()));
        }

        let prefix = &self.onboarding.account_slno_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::ValidationError(format!(
                "onboarding.account_slno_prefix must be ASCII letters, got '{}'",
                prefix
            )));
        }
        if self.onboarding.initial_balance.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "onboarding.initial_balance cannot be negative".to_string(),
            ));
        }
        if self.onboarding.initial_status.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "onboarding.initial_status must be set".to_string(),
            ));
        }
        Ok(())
    }
}
