//! Collection and document paths.
//!
//! A path is a list of segments alternating collection id / document id, so a
//! collection path always has an odd number of segments and a document path an
//! even one. `devices/d1/IR/OnOff` is the `OnOff` document in the `IR`
//! sub-collection of device `d1`.

use core::fmt;
use rand::Rng;
use rand::distr::Alphanumeric;

use super::StoreError;

const AUTO_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let reserved = segment.len() > 4 && segment.starts_with("__") && segment.ends_with("__");
    if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." || reserved {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

impl CollectionPath {
    /// A top-level collection such as `devices`.
    #[cfg(test)]
    pub fn root(name: &str) -> Result<Self, StoreError> {
        validate_segment(name)?;
        Ok(CollectionPath {
            segments: vec![name.to_string()],
        })
    }

    /// Top-level collection with a compile-time name.
    pub(crate) fn named(name: &'static str) -> Self {
        CollectionPath {
            segments: vec![name.to_string()],
        }
    }

    pub fn doc(&self, id: &str) -> Result<DocumentPath, StoreError> {
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocumentPath { segments })
    }

    /// The collection id (last segment).
    #[cfg(test)]
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocumentPath {
    #[cfg(test)]
    pub fn new(collection: &str, id: &str) -> Result<Self, StoreError> {
        CollectionPath::root(collection)?.doc(id)
    }

    /// Parse a slash separated document path (`users/u1`, `devices/d1/IR/OnOff`).
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        for s in &segments {
            validate_segment(s)?;
        }
        Ok(DocumentPath { segments })
    }

    /// The document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn collection(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// A sub-collection below this document.
    pub fn child(&self, name: &str) -> Result<CollectionPath, StoreError> {
        validate_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Generate a document key shaped like a Firestore auto-id.
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}
