//! Entity repositories on top of a [`DocumentStore`].

pub mod associations;
pub mod remote_codes;

use log::{debug, info};

use crate::error::RegistryError;
use crate::models::{EntityKind, NewUser, fields};
use crate::store::{Document, DocumentPath, DocumentStore, FieldChange, Fields, Patch, Value};

/// A listed document: its body plus the key under `id`, references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Record {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Merge the key under `id`; a stored `id` field wins, matching what was written.
pub(crate) fn into_record(doc: Document) -> Record {
    let mut merged = Fields::new();
    merged.insert(fields::ID.into(), Value::from(doc.id()));
    merged.extend(doc.fields);
    Record {
        path: doc.path,
        fields: merged,
    }
}

/// The document `id` names in `kind`, or `None` when `id` is not a valid
/// document id (`a/b`, `..`, `__x__`). Nothing can be stored under such an id.
pub(crate) fn addressable(kind: EntityKind, id: &str) -> Option<DocumentPath> {
    match kind.doc(id) {
        Ok(path) => Some(path),
        Err(e) => {
            debug!("{kind}: {e}, treated as absent");
            None
        }
    }
}

/// Look up `id` in the collection of `kind`.
///
/// A missing document is a [`RegistryError::DanglingReference`] when
/// `required`, and `None` otherwise.
pub fn resolve_reference(
    store: &dyn DocumentStore,
    kind: EntityKind,
    id: &str,
    required: bool,
) -> Result<Option<DocumentPath>, RegistryError> {
    let found = match addressable(kind, id) {
        Some(path) => store.get(&path)?.map(|_| path),
        None => None,
    };
    if found.is_none() && required {
        return Err(RegistryError::DanglingReference {
            kind: kind.plural(),
            id: id.to_string(),
        });
    }
    Ok(found)
}

pub struct Repository<'a> {
    store: &'a dyn DocumentStore,
    kind: EntityKind,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a dyn DocumentStore, kind: EntityKind) -> Self {
        Repository { store, kind }
    }

    /// One record when `key` is given (none if absent), otherwise the whole collection.
    pub fn list(&self, key: Option<&str>) -> Result<Vec<Record>, RegistryError> {
        let docs = match key {
            Some(key) => match addressable(self.kind, key) {
                Some(path) => self.store.get(&path)?.into_iter().collect(),
                None => Vec::new(),
            },
            None => self.store.list(&self.kind.collection())?,
        };
        debug!("{}: {} document(s) fetched", self.kind, docs.len());

        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut record = into_record(self.resolve_fields(doc)?);
            if self.kind == EntityKind::Device {
                self.attach_subcollections(&mut record)?;
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Records whose string field `field` equals `value`.
    pub fn list_where(&self, field: &str, value: &str) -> Result<Vec<Record>, RegistryError> {
        Ok(self
            .list(None)?
            .into_iter()
            .filter(|r| r.get_str(field) == Some(value))
            .collect())
    }

    /// Replace each top-level reference with the referenced body (null if gone).
    /// The referenced body is taken as stored; its own references stay unresolved.
    fn resolve_fields(&self, mut doc: Document) -> Result<Document, RegistryError> {
        for value in doc.fields.values_mut() {
            if let Value::Reference(target) = value {
                *value = match self.store.get(target)? {
                    Some(referenced) => Value::Map(referenced.fields),
                    None => Value::Null,
                };
            }
        }
        Ok(doc)
    }

    /// Devices carry their remote codes: one array per remote-type sub-collection.
    fn attach_subcollections(&self, record: &mut Record) -> Result<(), RegistryError> {
        for name in self.store.list_subcollections(&record.path)? {
            let codes = self
                .store
                .list(&record.path.child(&name)?)?
                .into_iter()
                .map(|doc| Value::Map(into_record(doc).fields))
                .collect();
            record.fields.insert(name, Value::Array(codes));
        }
        Ok(())
    }

    /// Write a new document under a generated key.
    pub fn create(&self, body: Fields) -> Result<DocumentPath, RegistryError> {
        let ack = self.store.add(&self.kind.collection(), None, body)?;
        if !ack.acknowledged() {
            return Err(RegistryError::Write {
                path: self.kind.collection().to_string(),
                action: "add",
            });
        }
        info!("{} added", ack.path);
        Ok(ack.path)
    }

    /// Delete an existing document. Nothing referencing it is touched.
    pub fn delete(&self, key: &str) -> Result<DocumentPath, RegistryError> {
        let Some(path) = addressable(self.kind, key) else {
            return Err(RegistryError::NotFound(format!("{}/{key}", self.kind)));
        };
        if self.store.get(&path)?.is_none() {
            return Err(RegistryError::NotFound(path.to_string()));
        }
        if !self.store.delete(&path)? {
            return Err(RegistryError::Write {
                path: path.to_string(),
                action: "delete",
            });
        }
        info!("{} deleted", path);
        Ok(path)
    }
}

/// Create a user and store its own key in its `id` field.
pub fn add_user(store: &dyn DocumentStore, user: NewUser) -> Result<DocumentPath, RegistryError> {
    let path = Repository::new(store, EntityKind::User).create(user.into_fields())?;
    let mut patch = Patch::new();
    patch.insert(fields::ID.into(), FieldChange::Set(Value::from(path.id())));
    let ack = store.update(&path, &patch)?;
    if !ack.acknowledged() {
        return Err(RegistryError::Write {
            path: path.to_string(),
            action: "id update",
        });
    }
    Ok(path)
}
