//! Directory-backed document store.
//!
//! Layout mirrors the document tree:
//!
//! ```text
//! <root>/devices/d1.json          document devices/d1
//! <root>/devices/d1/IR/OnOff.json document devices/d1/IR/OnOff
//! ```
//!
//! Each file holds a Firestore-shaped document (`fields` + `updateTime`).

use chrono::Utc;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::value::apply_patch;
use super::wire::{Codec, WireDocument, from_json};
use super::{CollectionPath, Document, DocumentPath, DocumentStore, Fields, Patch, StoreError, WriteAck, auto_id};

const DOCUMENT_EXT: &str = "json";
const LOCAL_DOCUMENTS_ROOT: &str = "projects/local/databases/(default)/documents";

pub struct LocalStore {
    root: PathBuf,
    codec: Codec,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A directory only stands for a collection while it holds a document file.
fn holds_documents(dir: &Path) -> Result<bool, StoreError> {
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == DOCUMENT_EXT) {
            return Ok(true);
        }
    }
    Ok(false)
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore {
            root: root.into(),
            codec: Codec::new(LOCAL_DOCUMENTS_ROOT),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn join(&self, segments: &[String]) -> PathBuf {
        let mut p = self.root.clone();
        for s in segments {
            p.push(s);
        }
        p
    }

    fn collection_dir(&self, collection: &CollectionPath) -> PathBuf {
        self.join(collection.segments())
    }

    /// Directory holding the sub-collections of `doc`.
    fn document_dir(&self, doc: &DocumentPath) -> PathBuf {
        self.join(doc.segments())
    }

    fn document_file(&self, doc: &DocumentPath) -> PathBuf {
        self.collection_dir(&doc.collection())
            .join(format!("{}.{}", doc.id(), DOCUMENT_EXT))
    }

    fn read(&self, doc: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let file = self.document_file(doc);
        let raw = match fs::read_to_string(&file) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(&file)(e)),
        };
        let wire: WireDocument = from_json(&raw)?;
        Ok(Some(Document {
            path: doc.clone(),
            fields: self.codec.decode_fields(wire.fields)?,
            update_time: wire.update_time,
        }))
    }

    /// Write via a temp file and rename so a crash never leaves half a document.
    fn write(&self, doc: &DocumentPath, fields: &Fields) -> Result<WriteAck, StoreError> {
        let file = self.document_file(doc);
        let dir = self.collection_dir(&doc.collection());
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let now = Utc::now();
        let wire = WireDocument {
            name: None,
            fields: self.codec.encode_fields(fields),
            create_time: None,
            update_time: Some(now),
        };
        let body = serde_json::to_string_pretty(&wire).map_err(|source| StoreError::Json {
            path: doc.to_string(),
            source,
        })?;
        let tmp = file.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &file).map_err(io_err(&file))?;
        debug!("local store: wrote {}", file.display());

        Ok(WriteAck {
            path: doc.clone(),
            update_time: Some(now),
        })
    }
}

impl DocumentStore for LocalStore {
    fn get(&self, doc: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.read(doc)
    }

    fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let dir = self.collection_dir(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir)(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_err(&dir))?.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == DOCUMENT_EXT)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.read(&collection.doc(&id)?)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn add(&self, collection: &CollectionPath, id: Option<&str>, fields: Fields) -> Result<WriteAck, StoreError> {
        let doc = match id {
            Some(id) => collection.doc(id)?,
            None => collection.doc(&auto_id())?,
        };
        if self.document_file(&doc).exists() {
            return Err(StoreError::AlreadyExists(doc.to_string()));
        }
        self.write(&doc, &fields)
    }

    fn update(&self, doc: &DocumentPath, patch: &Patch) -> Result<WriteAck, StoreError> {
        let mut current = self.read(doc)?.ok_or_else(|| StoreError::NotFound(doc.to_string()))?;
        apply_patch(&mut current.fields, patch);
        self.write(doc, &current.fields)
    }

    fn delete(&self, doc: &DocumentPath) -> Result<bool, StoreError> {
        let file = self.document_file(doc);
        match fs::remove_file(&file) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(&file)(e)),
        }
    }

    fn list_subcollections(&self, doc: &DocumentPath) -> Result<Vec<String>, StoreError> {
        let dir = self.document_dir(doc);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir)(e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_err(&dir))?.path();
            if path.is_dir()
                && let Some(name) = path.file_name().and_then(|s| s.to_str())
                && holds_documents(&path)?
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
