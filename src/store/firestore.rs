//! Blocking Cloud Firestore client (REST v1, subset used by the registry).
//!
//! - Blocking client using `ureq` (no async).
//! - Authenticates with a caller-supplied OAuth bearer token; against the
//!   emulator any token is accepted.
//! - Covers get/list/create/patch/delete on documents and `listCollectionIds`.

use http::StatusCode;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

use super::wire::{Codec, ListCollectionIdsResponse, ListDocumentsResponse, WireDocument, WireValue, from_json};
use super::{
    CollectionPath, Document, DocumentPath, DocumentStore, FieldChange, Fields, Patch, StoreError, WriteAck,
};

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";
const PAGE_SIZE: u32 = 300;

pub struct FirestoreStore {
    agent: ureq::Agent,
    /// `{endpoint}/v1/projects/{p}/databases/(default)/documents`
    documents_url: String,
    bearer: String,
    codec: Codec,
}

#[derive(Serialize)]
struct FieldsBody<'a> {
    fields: &'a BTreeMap<String, WireValue>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListCollectionIdsRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

type Response = http::Response<ureq::Body>;

fn transport(e: ureq::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Read the body of a response, turning non-2xx statuses into [`StoreError::Http`].
fn read_success(mut resp: Response) -> Result<String, StoreError> {
    let status = resp.status();
    let body = resp
        .body_mut()
        .read_to_string()
        .unwrap_or_else(|_| String::from("<no body>"));
    if status.is_success() {
        Ok(body)
    } else {
        Err(StoreError::Http {
            status: status.as_u16(),
            message: body,
        })
    }
}

/// Quote a field name for `updateMask.fieldPaths` unless it is a simple identifier.
fn field_path(name: &str) -> String {
    let simple = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

impl FirestoreStore {
    pub fn new(endpoint: &str, project_id: &str, access_token: &str) -> Self {
        let config = ureq::Agent::config_builder().http_status_as_error(false).build();
        let codec = Codec::for_project(project_id);
        FirestoreStore {
            agent: ureq::Agent::new_with_config(config),
            documents_url: format!("{}/v1/{}", endpoint.trim_end_matches('/'), codec.documents_root()),
            bearer: format!("Bearer {access_token}"),
            codec,
        }
    }

    fn url(&self, segments: &[String]) -> String {
        let mut url = self.documents_url.clone();
        for s in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(s));
        }
        url
    }

    fn decode_ack(&self, path: &DocumentPath, body: &str) -> Result<WriteAck, StoreError> {
        let doc: WireDocument = from_json(body)?;
        Ok(WriteAck {
            path: path.clone(),
            update_time: doc.update_time,
        })
    }
}

impl DocumentStore for FirestoreStore {
    fn get(&self, doc: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let resp = self
            .agent
            .get(&self.url(doc.segments()))
            .header("Authorization", &self.bearer)
            .header("Accept", "application/json")
            .call()
            .map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_success(resp)?;
        self.codec.decode_document(from_json(&body)?).map(Some)
    }

    fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let url = self.url(collection.segments());
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .agent
                .get(&url)
                .header("Authorization", &self.bearer)
                .header("Accept", "application/json")
                .query("pageSize", PAGE_SIZE.to_string());
            if let Some(token) = &page_token {
                req = req.query("pageToken", token);
            }
            let body = read_success(req.call().map_err(transport)?)?;
            let page: ListDocumentsResponse = from_json(&body)?;
            for doc in page.documents {
                docs.push(self.codec.decode_document(doc)?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!("firestore: listed {} document(s) in {}", docs.len(), collection);
        Ok(docs)
    }

    fn add(&self, collection: &CollectionPath, id: Option<&str>, fields: Fields) -> Result<WriteAck, StoreError> {
        let encoded = self.codec.encode_fields(&fields);
        let mut req = self
            .agent
            .post(&self.url(collection.segments()))
            .header("Authorization", &self.bearer)
            .header("Accept", "application/json");
        if let Some(id) = id {
            // validates the id before anything goes over the wire
            collection.doc(id)?;
            req = req.query("documentId", id);
        }
        let resp = req.send_json(&FieldsBody { fields: &encoded }).map_err(transport)?;
        if resp.status() == StatusCode::CONFLICT {
            let name = id.map(|id| format!("{collection}/{id}")).unwrap_or_else(|| collection.to_string());
            return Err(StoreError::AlreadyExists(name));
        }
        let body = read_success(resp)?;
        let doc: WireDocument = from_json(&body)?;
        let name = doc.name.as_deref().ok_or_else(|| StoreError::Decode {
            path: collection.to_string(),
            message: "created document has no name".to_string(),
        })?;
        Ok(WriteAck {
            path: self.codec.path_from_name(name)?,
            update_time: doc.update_time,
        })
    }

    fn update(&self, doc: &DocumentPath, patch: &Patch) -> Result<WriteAck, StoreError> {
        // fields named in the mask but absent from the body are deleted
        let mut set = Fields::new();
        let mut req = self
            .agent
            .patch(&self.url(doc.segments()))
            .header("Authorization", &self.bearer)
            .header("Accept", "application/json")
            .query("currentDocument.exists", "true");
        for (name, change) in patch {
            req = req.query("updateMask.fieldPaths", field_path(name));
            if let FieldChange::Set(v) = change {
                set.insert(name.clone(), v.clone());
            }
        }
        let encoded = self.codec.encode_fields(&set);
        let resp = req.send_json(&FieldsBody { fields: &encoded }).map_err(transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(doc.to_string()));
        }
        let body = read_success(resp)?;
        self.decode_ack(doc, &body)
    }

    fn delete(&self, doc: &DocumentPath) -> Result<bool, StoreError> {
        let resp = self
            .agent
            .delete(&self.url(doc.segments()))
            .header("Authorization", &self.bearer)
            .call()
            .map_err(transport)?;
        read_success(resp)?;
        Ok(true)
    }

    fn list_subcollections(&self, doc: &DocumentPath) -> Result<Vec<String>, StoreError> {
        let url = format!("{}:listCollectionIds", self.url(doc.segments()));
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let request = ListCollectionIdsRequest {
                page_size: PAGE_SIZE,
                page_token: page_token.as_deref(),
            };
            let resp = self
                .agent
                .post(&url)
                .header("Authorization", &self.bearer)
                .header("Accept", "application/json")
                .send_json(&request)
                .map_err(transport)?;
            let page: ListCollectionIdsResponse = from_json(&read_success(resp)?)?;
            ids.extend(page.collection_ids);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        ids.sort();
        Ok(ids)
    }
}
