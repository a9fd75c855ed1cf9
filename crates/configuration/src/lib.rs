use crate::error::ConfigError;
use crate::settings::Settings;
use std::path::{Path, PathBuf};

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{DatabaseSettings, LoggingSettings, OnboardingSettings, ServerSettings};

/// Prefix of the environment variables that override file values,
/// e.g. `BANKDESK__DATABASE__PASSWORD`.
pub const ENV_PREFIX: &str = "BANKDESK";

/// Command-line knobs that change where configuration comes from.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ConfigOverrides {
    /// Path to the TOML configuration file (defaults to `config.toml` if present).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub config: Option<PathBuf>,
}

/// Loads the application configuration.
///
/// Values are layered: the TOML file first (the explicit path is required to
/// exist, the default `config.toml` is optional), then `BANKDESK__*`
/// environment variables. The merged result is deserialized into `Settings`
/// and validated.
pub fn load_settings(overrides: &ConfigOverrides) -> Result<Settings, ConfigError> {
    let file = match &overrides.config {
        Some(path) => config::File::from(path.as_path()).required(true),
        None => config::File::from(Path::new("config.toml")).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    finish(builder)
}

/// Parses settings from an in-memory TOML document. Environment variables are not consulted.
pub fn load_settings_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Settings, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [database]
        username = "masterdba"
        password = "secret"
        dsn = "localhost:5432/bank"
    "#;

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let settings = load_settings_from_str(MINIMAL).unwrap();

        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.onboarding.initial_balance, dec!(200.00));
        assert_eq!(settings.onboarding.initial_status, "ACTIVE");
        assert_eq!(settings.onboarding.account_slno_prefix, "A");
        assert_eq!(settings.logging.filter, "info");
        assert!(settings.logging.directory.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let toml = format!(
            "{}\n[server]\nhost = \"127.0.0.1\"\nport = 8080\n\n[onboarding]\ninitial_balance = \"50.25\"\naccount_slno_prefix = \"AC\"\n",
            MINIMAL
        );
        let settings = load_settings_from_str(&toml).unwrap();

        assert_eq!(settings.server.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(settings.onboarding.initial_balance, dec!(50.25));
        assert_eq!(settings.onboarding.account_slno_prefix, "AC");
    }

    #[test]
    fn missing_database_section_is_a_load_error() {
        let result = load_settings_from_str("[server]\nport = 8080\n");
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn non_alphabetic_slno_prefix_is_rejected() {
        let toml = format!("{}\n[onboarding]\naccount_slno_prefix = \"A1\"\n", MINIMAL);
        let result = load_settings_from_str(&toml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let settings = load_settings_from_str(MINIMAL).unwrap();
        let rendered = format!("{:?}", settings.database);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
