//! Groups and the user/group to device bindings.

use log::{info, warn};

use super::{Record, Repository, addressable, resolve_reference};
use crate::error::RegistryError;
use crate::models::{EntityKind, NewBinding, NewGroup, Owner, fields};
use crate::store::{DocumentPath, DocumentStore};

/// Create a group from user ids. Ids that do not resolve to a user are skipped.
pub fn add_group(store: &dyn DocumentStore, member_ids: &[String]) -> Result<DocumentPath, RegistryError> {
    let mut members = Vec::with_capacity(member_ids.len());
    for id in member_ids {
        match resolve_reference(store, EntityKind::User, id, false)? {
            Some(user) => members.push(user),
            None => warn!("{id} is not a user, left out of the group"),
        }
    }
    Repository::new(store, EntityKind::Group).create(NewGroup { members }.into_fields())
}

/// Member user ids of an existing group.
pub fn group_members(store: &dyn DocumentStore, group_id: &str) -> Result<Vec<String>, RegistryError> {
    let not_found = || RegistryError::NotFound(format!("{}/{group_id}", EntityKind::Group));
    let path = addressable(EntityKind::Group, group_id).ok_or_else(not_found)?;
    let group = store.get(&path)?.ok_or_else(not_found)?;
    Ok(group.fields.into_keys().collect())
}

/// Ids of a binding request, checked against the store before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRequest<'a> {
    pub device_id: &'a str,
    pub owner_id: &'a str,
    pub remote_id: &'a str,
    pub name: Option<String>,
}

/// Create a user-device (`owner_kind` = User) or group-device (`owner_kind` = Group) record.
pub fn add_binding(
    store: &dyn DocumentStore,
    owner_kind: EntityKind,
    request: BindingRequest<'_>,
) -> Result<DocumentPath, RegistryError> {
    let device = require(store, EntityKind::Device, request.device_id)?;
    let owner_path = require(store, owner_kind, request.owner_id)?;
    let remote = require(store, EntityKind::Remote, request.remote_id)?;

    let owner = match owner_kind {
        EntityKind::Group => Owner::Group(owner_path),
        _ => Owner::User(owner_path),
    };
    let kind = owner.kind();
    let binding = NewBinding {
        device,
        owner,
        remote,
        name: request.name,
    };
    let path = Repository::new(store, kind).create(binding.into_fields())?;
    info!("{} binds {} to {}", path, request.device_id, request.owner_id);
    Ok(path)
}

fn require(store: &dyn DocumentStore, kind: EntityKind, id: &str) -> Result<DocumentPath, RegistryError> {
    resolve_reference(store, kind, id, true)?.ok_or_else(|| RegistryError::DanglingReference {
        kind: kind.plural(),
        id: id.to_string(),
    })
}

/// Related-id filters for listing bindings; every set filter must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingFilter {
    pub owner_id: Option<String>,
    pub device_id: Option<String>,
    pub remote_id: Option<String>,
}

impl BindingFilter {
    pub fn matches(&self, owner_field: &str, record: &Record) -> bool {
        [
            (owner_field, &self.owner_id),
            (fields::DEVICE_ID, &self.device_id),
            (fields::REMOTE_ID, &self.remote_id),
        ]
        .into_iter()
        .all(|(field, wanted)| match wanted {
            Some(wanted) => record.get_str(field) == Some(wanted.as_str()),
            None => true,
        })
    }
}

/// List user-device or group-device records, optionally one key, then filtered.
pub fn list_bindings(
    store: &dyn DocumentStore,
    kind: EntityKind,
    key: Option<&str>,
    filter: &BindingFilter,
) -> Result<Vec<Record>, RegistryError> {
    let owner_field = match kind {
        EntityKind::GroupDevice => fields::GROUP_ID,
        _ => fields::USER_ID,
    };
    let repo = Repository::new(store, kind);
    let records = match (key, &filter.owner_id) {
        (None, Some(owner)) => repo.list_where(owner_field, owner)?,
        _ => repo.list(key)?,
    };
    Ok(records.into_iter().filter(|r| filter.matches(owner_field, r)).collect())
}

/// Groups, optionally one key, keeping only those with `member` when given.
pub fn list_groups(
    store: &dyn DocumentStore,
    key: Option<&str>,
    member: Option<&str>,
) -> Result<Vec<Record>, RegistryError> {
    Ok(Repository::new(store, EntityKind::Group)
        .list(key)?
        .into_iter()
        .filter(|r| member.is_none_or(|m| r.fields.contains_key(m)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::add_user;
    use crate::models::NewUser;
    use crate::store::{Fields, MemoryStore, Value};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed(EntityKind::User.doc("u1").unwrap(), Fields::new());
        store.seed(EntityKind::User.doc("u2").unwrap(), Fields::new());
        store.seed(EntityKind::Device.doc("d1").unwrap(), Fields::new());
        store.seed(EntityKind::Remote.doc("r1").unwrap(), Fields::new());
        store
    }

    fn request<'a>(device_id: &'a str, owner_id: &'a str, remote_id: &'a str) -> BindingRequest<'a> {
        BindingRequest {
            device_id,
            owner_id,
            remote_id,
            name: None,
        }
    }

    #[test]
    fn groups_skip_unknown_members() {
        let store = seeded();
        let group = add_group(&store, &["u1".into(), "nobody".into(), "u2".into()]).unwrap();

        assert_eq!(group_members(&store, group.id()).unwrap(), vec!["u1", "u2"]);
        let body = store.get(&group).unwrap().unwrap().fields;
        assert_eq!(body["u1"], Value::Reference(EntityKind::User.doc("u1").unwrap()));
    }

    #[test]
    fn dangling_ids_fail_before_any_write() {
        for (device, owner, remote, missing) in [
            ("dx", "u1", "r1", "dx"),
            ("d1", "ux", "r1", "ux"),
            ("d1", "u1", "rx", "rx"),
        ] {
            let store = seeded();
            let err = add_binding(&store, EntityKind::User, request(device, owner, remote)).unwrap_err();
            assert!(
                matches!(err, RegistryError::DanglingReference { ref id, .. } if id == missing),
                "{err}"
            );
            assert_eq!(store.write_count(), 0);
        }

        let store = seeded();
        let err = add_binding(&store, EntityKind::Group, request("d1", "u1", "r1")).unwrap_err();
        assert_eq!(err.to_string(), "u1 cannot be referenced, check Groups");
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn user_binding_is_listed_by_user_id() {
        let store = seeded();
        let user = add_user(&store, NewUser::default()).unwrap();
        add_binding(&store, EntityKind::User, request("d1", user.id(), "r1")).unwrap();
        add_binding(&store, EntityKind::User, request("d1", "u2", "r1")).unwrap();

        let filter = BindingFilter {
            owner_id: Some(user.id().to_string()),
            ..Default::default()
        };
        let records = list_bindings(&store, EntityKind::UserDevice, None, &filter).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_str("deviceId"), Some("d1"));
        assert_eq!(records[0].get_str("userId"), Some(user.id()));
        assert_eq!(records[0].get_str("remoteId"), Some("r1"));
    }

    #[test]
    fn group_bindings_filter_on_group_and_remote() {
        let store = seeded();
        store.seed(EntityKind::Remote.doc("r2").unwrap(), Fields::new());
        let group = add_group(&store, &["u1".into()]).unwrap();
        add_binding(&store, EntityKind::Group, request("d1", group.id(), "r1")).unwrap();
        add_binding(&store, EntityKind::Group, request("d1", group.id(), "r2")).unwrap();

        let filter = BindingFilter {
            owner_id: Some(group.id().to_string()),
            remote_id: Some("r2".into()),
            ..Default::default()
        };
        let records = list_bindings(&store, EntityKind::GroupDevice, None, &filter).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_str("remoteId"), Some("r2"));
    }

    #[test]
    fn groups_listed_by_member() {
        let store = seeded();
        let with_u1 = add_group(&store, &["u1".into()]).unwrap();
        add_group(&store, &["u2".into()]).unwrap();

        let records = list_groups(&store, None, Some("u1")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, with_u1);
        assert_eq!(list_groups(&store, None, None).unwrap().len(), 2);
    }

    #[test]
    fn bindings_to_invalid_ids_are_dangling() {
        for (device, owner, remote, missing) in [("a/b", "u1", "r1", "a/b"), ("d1", "__x__", "r1", "__x__")] {
            let store = seeded();
            let err = add_binding(&store, EntityKind::User, request(device, owner, remote)).unwrap_err();
            assert!(
                matches!(err, RegistryError::DanglingReference { ref id, .. } if id == missing),
                "{err}"
            );
            assert_eq!(store.write_count(), 0);
        }
    }

    #[test]
    fn members_of_invalid_group_id_are_not_found() {
        let store = seeded();
        let err = group_members(&store, "a/b").unwrap_err();
        assert_eq!(err.to_string(), "groups/a/b does not exist");
    }
}
