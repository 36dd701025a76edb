//! TLS cert/key paths, shared by any section that terminates TLS itself.
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Tls {
    pub cert_path: Utf8PathBuf,
    pub key_path: Utf8PathBuf,
}

/// Errors that can occur when validating a [`Tls`] section.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("TLS cert path does not exist: {cert_path}")]
    MissingCertPath { cert_path: String },

    #[error("TLS key path does not exist: {key_path}")]
    MissingKeyPath { key_path: String },
}

impl Tls {
    /// Checks that both paths exist on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if either path is missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.cert_path.exists() {
            return Err(ValidationError::MissingCertPath {
                cert_path: self.cert_path.to_string(),
            });
        }
        if !self.key_path.exists() {
            return Err(ValidationError::MissingKeyPath {
                key_path: self.key_path.to_string(),
            });
        }
        Ok(())
    }
}
