//! Configuration data structures and loader for Kraken's coordination tier.
//!
//! The configuration is loaded from a [TOML](https://toml.io/en/) file, or
//! from the `KRAKEN_CONFIG` environment variable holding the same content,
//! via [`figment`]. Each section maps to one of the structs in
//! [`sections`]:
//!
//! - [`sections::core::Core`]
//! - [`sections::file_store::FileStore`]
//! - [`sections::peer_store::PeerStore`]
//! - [`sections::tracker::Tracker`]
//! - [`sections::metainfo_client::MetainfoClient`]
//! - [`sections::cache::Cache`]
use figment::providers::{Env, Format as _, Serialized, Toml};
use figment::Figment;
use kraken_located_error::{DynError, Located, LocatedError};
use serde::{Deserialize, Serialize};

pub mod sections;

pub use sections::cache::Cache;
pub use sections::core::Core;
pub use sections::file_store::FileStore;
pub use sections::metainfo_client::MetainfoClient;
pub use sections::peer_store::PeerStore;
pub use sections::tracker::Tracker;

/// Environment variable holding the whole configuration in TOML format.
pub const ENV_VAR_CONFIG: &str = "KRAKEN_CONFIG";
/// Environment variable prefix for per-field overrides, e.g.
/// `KRAKEN__CORE__ZONE`.
pub const ENV_VAR_PREFIX: &str = "KRAKEN__";

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub core: Core,

    #[serde(default)]
    pub file_store: FileStore,

    #[serde(default)]
    pub peer_store: PeerStore,

    #[serde(default)]
    pub tracker: Tracker,

    #[serde(default)]
    pub metainfo_client: MetainfoClient,

    #[serde(default)]
    pub cache: Cache,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("configuration error: {source}")]
    ConfigError {
        source: LocatedError<'static, figment::Error>,
    },

    #[error("failed to write configuration file: {source}")]
    IoError { source: DynError },
}

impl From<figment::Error> for Error {
    #[track_caller]
    fn from(err: figment::Error) -> Self {
        Self::ConfigError {
            source: Located(err).into(),
        }
    }
}

impl Configuration {
    /// Loads configuration from a TOML file, overlaying `KRAKEN__`-prefixed
    /// environment variables on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file is missing or malformed.
    pub fn load_from_file(path: &str) -> Result<Configuration, Error> {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_VAR_PREFIX).split("__"))
            .extract()
            .map_err(Into::into)
    }

    /// Loads configuration from the `KRAKEN_CONFIG` environment variable,
    /// which must hold a complete TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the variable is missing or its
    /// content is malformed.
    #[track_caller]
    pub fn load_from_env_var(var_name: &str) -> Result<Configuration, Error> {
        let toml = std::env::var(var_name).map_err(|err| Error::IoError {
            source: std::sync::Arc::new(err),
        })?;

        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::string(&toml))
            .extract()
            .map_err(Into::into)
    }

    /// Encodes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the configuration cannot be encoded,
    /// which should not happen for a value that was itself deserialized.
    #[track_caller]
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|err| Error::IoError {
            source: std::sync::Arc::new(err),
        })
    }

    /// Saves the configuration to `path` in TOML format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the file cannot be written.
    #[track_caller]
    pub fn save_to_file(&self, path: &str) -> Result<(), Error> {
        let toml = self.to_toml()?;
        std::fs::write(path, toml).map_err(|err| Error::IoError {
            source: std::sync::Arc::new(err),
        })
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn it_loads_defaults_when_the_file_only_overrides_one_field() {
        Jail::expect_with(|jail| {
            jail.create_file("kraken.toml", "[core]\nzone = \"zone-west\"\n")?;

            let config = Configuration::load_from_file("kraken.toml").unwrap();
            assert_eq!(config.core.zone, "zone-west");
            assert_eq!(config.peer_store.window_width_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn it_overrides_file_values_with_env_vars() {
        Jail::expect_with(|jail| {
            jail.create_file("kraken.toml", "[core]\nzone = \"zone-west\"\n")?;
            jail.set_env("KRAKEN__CORE__ZONE", "zone-east");

            let config = Configuration::load_from_file("kraken.toml").unwrap();
            assert_eq!(config.core.zone, "zone-east");
            Ok(())
        });
    }

    #[test]
    fn it_round_trips_through_toml() {
        let config = Configuration::default();
        let toml = config.to_toml().unwrap();
        let reparsed: Configuration = toml::from_str(&toml).unwrap();
        assert_eq!(reparsed, config);
    }
}
