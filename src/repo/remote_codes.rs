//! Remote codes: `devices/{deviceId}/{remoteType}/{action}` documents holding
//! flat string maps.

use log::{debug, info};

use super::{Record, addressable, into_record, resolve_reference};
use crate::error::RegistryError;
use crate::models::EntityKind;
use crate::store::{CollectionPath, DocumentPath, DocumentStore, FieldChange, Fields, Patch, Value};

/// Outcome of a removal that tolerates an absent target.
/// An absent target may not be addressable, so it is kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Deleted(DocumentPath),
    Absent(String),
}

/// Split `key=value` arguments. Every pair is checked before anything is written.
pub fn parse_values(values: &[String]) -> Result<Vec<(String, String)>, RegistryError> {
    values
        .iter()
        .map(|raw| {
            let mut parts = raw.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
                _ => Err(RegistryError::MalformedValue(raw.clone())),
            }
        })
        .collect()
}

pub struct RemoteCodes<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> RemoteCodes<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        RemoteCodes { store }
    }

    fn codes(&self, device_id: &str, remote_type: &str) -> Result<CollectionPath, RegistryError> {
        Ok(EntityKind::Device.doc(device_id)?.child(remote_type)?)
    }

    /// The action document, or the displayed path when some id cannot name one.
    fn action_doc(device_id: &str, remote_type: &str, action: &str) -> Result<DocumentPath, String> {
        addressable(EntityKind::Device, device_id)
            .and_then(|device| device.child(remote_type).ok())
            .and_then(|codes| codes.doc(action).ok())
            .ok_or_else(|| format!("{}/{device_id}/{remote_type}/{action}", EntityKind::Device))
    }

    /// Write each pair into the action document, creating it on first use.
    pub fn upsert(
        &self,
        device_id: &str,
        remote_type: &str,
        action: &str,
        values: &[String],
    ) -> Result<Vec<(String, String)>, RegistryError> {
        let pairs = parse_values(values)?;
        resolve_reference(self.store, EntityKind::Device, device_id, true)?;
        let codes = self.codes(device_id, remote_type)?;
        let doc = codes.doc(action)?;

        for (key, value) in &pairs {
            let ack = if self.store.get(&doc)?.is_some() {
                let mut patch = Patch::new();
                patch.insert(key.clone(), FieldChange::Set(Value::from(value.as_str())));
                debug!("{doc}: updating {key}");
                self.store.update(&doc, &patch)?
            } else {
                let mut body = Fields::new();
                body.insert(key.clone(), Value::from(value.as_str()));
                debug!("{doc}: creating with {key}");
                self.store.add(&codes, Some(action), body)?
            };
            if !ack.acknowledged() {
                return Err(RegistryError::Write {
                    path: doc.to_string(),
                    action: "upsert",
                });
            }
        }
        info!("{doc}: {} value(s) written", pairs.len());
        Ok(pairs)
    }

    /// Delete the action document if it exists.
    pub fn remove(&self, device_id: &str, remote_type: &str, action: &str) -> Result<Removal, RegistryError> {
        let doc = match Self::action_doc(device_id, remote_type, action) {
            Ok(doc) => doc,
            Err(shown) => return Ok(Removal::Absent(shown)),
        };
        if self.store.get(&doc)?.is_none() {
            return Ok(Removal::Absent(doc.to_string()));
        }
        if !self.store.delete(&doc)? {
            return Err(RegistryError::Write {
                path: doc.to_string(),
                action: "delete",
            });
        }
        Ok(Removal::Deleted(doc))
    }

    /// Drop one key from the action document if both exist.
    pub fn remove_value(
        &self,
        device_id: &str,
        remote_type: &str,
        action: &str,
        key: &str,
    ) -> Result<Removal, RegistryError> {
        let doc = match Self::action_doc(device_id, remote_type, action) {
            Ok(doc) => doc,
            Err(shown) => return Ok(Removal::Absent(shown)),
        };
        let present = self
            .store
            .get(&doc)?
            .is_some_and(|existing| existing.fields.contains_key(key));
        if !present {
            return Ok(Removal::Absent(doc.to_string()));
        }
        let mut patch = Patch::new();
        patch.insert(key.to_string(), FieldChange::Delete);
        if !self.store.update(&doc, &patch)?.acknowledged() {
            return Err(RegistryError::Write {
                path: doc.to_string(),
                action: "value delete",
            });
        }
        Ok(Removal::Deleted(doc))
    }

    /// Codes under one remote type, or under every remote type of the device.
    /// Ids that cannot name a collection have no codes.
    pub fn list(&self, device_id: &str, remote_type: Option<&str>) -> Result<Vec<Record>, RegistryError> {
        let Some(device) = addressable(EntityKind::Device, device_id) else {
            return Ok(Vec::new());
        };
        let types = match remote_type {
            Some(t) => vec![t.to_string()],
            None => self.store.list_subcollections(&device)?,
        };
        let mut records = Vec::new();
        for t in types {
            let Ok(codes) = device.child(&t) else {
                debug!("{device}: {t:?} is not a remote type");
                continue;
            };
            records.extend(self.store.list(&codes)?.into_iter().map(into_record));
        }
        Ok(records)
    }
}
