use chrono::Utc;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use super::value::apply_patch;
use super::{CollectionPath, Document, DocumentPath, DocumentStore, Fields, Patch, StoreError, WriteAck, auto_id};

/// In-memory store for tests.
///
/// Uses `RefCell` since the registry is single-threaded and the trait takes
/// `&self` everywhere.
pub struct MemoryStore {
    docs: RefCell<BTreeMap<DocumentPath, Fields>>,
    acknowledge_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore {
            docs: RefCell::new(BTreeMap::new()),
            acknowledge_writes: Cell::new(true),
            writes: Cell::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, writes are dropped and reported without an update time,
    /// and deletes report `false`.
    pub fn set_acknowledge_writes(&self, acknowledge: bool) {
        self.acknowledge_writes.set(acknowledge);
    }

    /// Number of writes applied so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Insert a document directly, bypassing the write counter.
    pub fn seed(&self, path: DocumentPath, fields: Fields) {
        self.docs.borrow_mut().insert(path, fields);
    }

    fn ack(&self, path: DocumentPath) -> WriteAck {
        if self.acknowledge_writes.get() {
            self.writes.set(self.writes.get() + 1);
            WriteAck {
                path,
                update_time: Some(Utc::now()),
            }
        } else {
            WriteAck {
                path,
                update_time: None,
            }
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, doc: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Ok(self.docs.borrow().get(doc).map(|fields| Document {
            path: doc.clone(),
            fields: fields.clone(),
            update_time: None,
        }))
    }

    fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .docs
            .borrow()
            .iter()
            .filter(|(path, _)| &path.collection() == collection)
            .map(|(path, fields)| Document {
                path: path.clone(),
                fields: fields.clone(),
                update_time: None,
            })
            .collect())
    }

    fn add(&self, collection: &CollectionPath, id: Option<&str>, fields: Fields) -> Result<WriteAck, StoreError> {
        let path = match id {
            Some(id) => collection.doc(id)?,
            None => collection.doc(&auto_id())?,
        };
        if self.docs.borrow().contains_key(&path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        if self.acknowledge_writes.get() {
            self.docs.borrow_mut().insert(path.clone(), fields);
        }
        Ok(self.ack(path))
    }

    fn update(&self, doc: &DocumentPath, patch: &Patch) -> Result<WriteAck, StoreError> {
        {
            let mut docs = self.docs.borrow_mut();
            let fields = docs.get_mut(doc).ok_or_else(|| StoreError::NotFound(doc.to_string()))?;
            if self.acknowledge_writes.get() {
                apply_patch(fields, patch);
            }
        }
        Ok(self.ack(doc.clone()))
    }

    fn delete(&self, doc: &DocumentPath) -> Result<bool, StoreError> {
        if !self.acknowledge_writes.get() {
            return Ok(false);
        }
        self.docs.borrow_mut().remove(doc);
        self.writes.set(self.writes.get() + 1);
        Ok(true)
    }

    fn list_subcollections(&self, doc: &DocumentPath) -> Result<Vec<String>, StoreError> {
        let depth = doc.segments().len();
        let names: BTreeSet<String> = self
            .docs
            .borrow()
            .keys()
            .filter(|path| path.segments().len() > depth && path.segments().starts_with(doc.segments()))
            .map(|path| path.segments()[depth].clone())
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[test]
    fn unacknowledged_writes_leave_no_trace() {
        let store = MemoryStore::new();
        let users = CollectionPath::root("users").unwrap();
        store.set_acknowledge_writes(false);

        let ack = store.add(&users, None, Fields::new()).unwrap();

        assert!(!ack.acknowledged());
        assert!(store.list(&users).unwrap().is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn subcollections_are_listed_once() {
        let store = MemoryStore::new();
        let device = DocumentPath::new("devices", "d1").unwrap();
        store.seed(device.clone(), Fields::new());
        for (remote_type, action) in [("IR", "OnOff"), ("IR", "Brightness"), ("RF", "OnOff")] {
            let mut fields = Fields::new();
            fields.insert("power".into(), Value::from("on"));
            store.seed(device.child(remote_type).unwrap().doc(action).unwrap(), fields);
        }

        assert_eq!(store.list_subcollections(&device).unwrap(), vec!["IR", "RF"]);
        assert_eq!(store.list(&CollectionPath::root("devices").unwrap()).unwrap().len(), 1);
    }
}
