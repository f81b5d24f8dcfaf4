use std::io;
use thiserror::Error;

use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::store::StoreError;

/// Failures of registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The store did not acknowledge a write.
    #[error("{path}: {action} failed")]
    Write { path: String, action: &'static str },
    /// Delete or update target is absent.
    #[error("{0} does not exist")]
    NotFound(String),
    /// A required cross-entity reference does not resolve.
    #[error("{id} cannot be referenced, check {kind}")]
    DanglingReference { kind: &'static str, id: String },
    /// A `key=value` argument without exactly one separator.
    #[error("{0}: value separated with \"=\" was required")]
    MalformedValue(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Anything that ends a command invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("writing output failed: {0}")]
    Output(#[from] io::Error),
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        Error::Registry(RegistryError::Store(value))
    }
}
