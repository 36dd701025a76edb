//! Initialize configuration from file or env var.
//!
//! All environment variables are prefixed with `KRAKEN__`.
use std::path::Path;

use kraken_configuration::Configuration;

pub const DEFAULT_PATH_CONFIG: &str = "./share/default/config/kraken.toml";

/// Loads the application configuration from the environment.
///
/// Precedence, lowest to highest: built-in defaults, the config file at
/// `path` (if it exists), the `KRAKEN_CONFIG` env var (whole-file
/// contents), then individual `KRAKEN__SECTION__FIELD` env vars.
///
/// # Panics
///
/// Panics if the environment variable or config file is present but
/// cannot be parsed.
#[must_use]
pub fn initialize_configuration(path: &Path) -> Configuration {
    if std::env::var(kraken_configuration::ENV_VAR_CONFIG).is_ok() {
        return kraken_configuration::load_from_env_var(kraken_configuration::ENV_VAR_CONFIG).expect("invalid KRAKEN_CONFIG contents");
    }

    if path.exists() {
        return kraken_configuration::load_from_file(path).expect("invalid configuration file");
    }

    Configuration::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_falls_back_to_defaults_when_nothing_is_configured() {
        let config = initialize_configuration(Path::new("/nonexistent/kraken.toml"));
        assert_eq!(config.tracker.bind_address, "0.0.0.0:7070");
    }
}
