//! Document store gateway.
//!
//! [`DocumentStore`] is the narrow surface the registry needs from a document
//! database. [`FirestoreStore`] talks to Cloud Firestore over REST,
//! [`LocalStore`] keeps documents as JSON files under a directory and
//! [`MemoryStore`] backs the unit tests.

pub mod firestore;
pub mod local;
#[cfg(test)]
pub mod memory;
pub mod path;
pub mod value;
pub mod wire;

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

pub use firestore::FirestoreStore;
pub use local::LocalStore;
#[cfg(test)]
pub use memory::MemoryStore;
pub use path::{CollectionPath, DocumentPath, auto_id};
pub use value::{FieldChange, Fields, Patch, Value};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("json error at {path}: {source}")]
    Json { path: String, source: serde_json::Error },
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("invalid path segment {0:?}")]
    InvalidPath(String),
    #[error("cannot decode {path}: {message}")]
    Decode { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }
}

/// What the store reports back for a write.
///
/// `update_time` is the success signal: a write the store did not apply comes
/// back without one.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteAck {
    pub path: DocumentPath,
    pub update_time: Option<DateTime<Utc>>,
}

impl WriteAck {
    pub fn acknowledged(&self) -> bool {
        self.update_time.is_some()
    }
}

pub trait DocumentStore {
    /// Fetch one document. `Ok(None)` when it does not exist.
    fn get(&self, doc: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Every document directly in `collection`.
    fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    /// Create a document, with a generated id unless `id` is given.
    /// Fails with [`StoreError::AlreadyExists`] if `id` is taken.
    fn add(&self, collection: &CollectionPath, id: Option<&str>, fields: Fields) -> Result<WriteAck, StoreError>;

    /// Merge `patch` into an existing document.
    /// Fails with [`StoreError::NotFound`] if the document does not exist.
    fn update(&self, doc: &DocumentPath, patch: &Patch) -> Result<WriteAck, StoreError>;

    /// Delete a document; sub-collections below it are left alone.
    /// Returns whether the store reported the delete as applied.
    fn delete(&self, doc: &DocumentPath) -> Result<bool, StoreError>;

    /// Ids of the sub-collections directly below `doc`.
    fn list_subcollections(&self, doc: &DocumentPath) -> Result<Vec<String>, StoreError>;
}
