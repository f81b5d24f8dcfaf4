//! Registry entities and the document bodies written for them.

use core::fmt;

use crate::store::{CollectionPath, DocumentPath, Fields, StoreError, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Device,
    Remote,
    User,
    Group,
    UserDevice,
    GroupDevice,
}

impl EntityKind {
    pub fn collection_name(self) -> &'static str {
        match self {
            EntityKind::Device => "devices",
            EntityKind::Remote => "remotes",
            EntityKind::User => "users",
            EntityKind::Group => "groups",
            EntityKind::UserDevice => "user_devices",
            EntityKind::GroupDevice => "group_devices",
        }
    }

    pub fn collection(self) -> CollectionPath {
        CollectionPath::named(self.collection_name())
    }

    pub fn doc(self, id: &str) -> Result<DocumentPath, StoreError> {
        self.collection().doc(id)
    }

    /// Human name used in diagnostics ("check Devices").
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Device => "Devices",
            EntityKind::Remote => "Remotes",
            EntityKind::User => "Users",
            EntityKind::Group => "Groups",
            EntityKind::UserDevice => "UserDevices",
            EntityKind::GroupDevice => "GroupDevices",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

// Field names as stored.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const MANUFACTURER: &str = "manufacturer";
    pub const MODEL: &str = "model";
    pub const TYPE: &str = "type";
    pub const TRAITS: &str = "traits";
    pub const WILL_REPORT_STATE: &str = "willReportState";
    pub const MAC_ADDR: &str = "mac_addr";
    pub const DEVICE_ID: &str = "deviceId";
    pub const USER_ID: &str = "userId";
    pub const GROUP_ID: &str = "groupId";
    pub const REMOTE_ID: &str = "remoteId";
    pub const DEVICE_REFERENCE: &str = "deviceReference";
    pub const USER_REFERENCE: &str = "userReference";
    pub const GROUP_REFERENCE: &str = "groupReference";
    pub const REMOTE_REFERENCE: &str = "remoteReference";
}

fn insert_name(body: &mut Fields, name: Option<String>) {
    if let Some(name) = name {
        body.insert(fields::NAME.into(), Value::String(name));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDevice {
    pub manufacturer: String,
    pub model: String,
    pub device_type: String,
    pub traits: Vec<String>,
    pub will_report_state: bool,
    pub name: Option<String>,
}

impl NewDevice {
    pub fn into_fields(self) -> Fields {
        let mut body = Fields::new();
        body.insert(fields::MANUFACTURER.into(), Value::String(self.manufacturer));
        body.insert(fields::MODEL.into(), Value::String(self.model));
        body.insert(fields::TYPE.into(), Value::String(self.device_type));
        body.insert(fields::WILL_REPORT_STATE.into(), Value::from(self.will_report_state));
        body.insert(fields::TRAITS.into(), self.traits.into());
        insert_name(&mut body, self.name);
        body
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRemote {
    pub mac_addr: String,
    pub remote_type: String,
    pub name: Option<String>,
}

impl NewRemote {
    pub fn into_fields(self) -> Fields {
        let mut body = Fields::new();
        body.insert(fields::MAC_ADDR.into(), Value::String(self.mac_addr));
        body.insert(fields::TYPE.into(), Value::String(self.remote_type));
        insert_name(&mut body, self.name);
        body
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUser {
    pub name: Option<String>,
}

impl NewUser {
    pub fn into_fields(self) -> Fields {
        let mut body = Fields::new();
        insert_name(&mut body, self.name);
        body
    }
}

/// Group membership: each member id maps to a reference to its user document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGroup {
    pub members: Vec<DocumentPath>,
}

impl NewGroup {
    pub fn into_fields(self) -> Fields {
        self.members
            .into_iter()
            .map(|user| (user.id().to_string(), Value::from(user)))
            .collect()
    }
}

/// The owner side of an associative record: a single user or a group.
#[derive(Debug, Clone, PartialEq)]
pub enum Owner {
    User(DocumentPath),
    Group(DocumentPath),
}

impl Owner {
    fn id_field(&self) -> &'static str {
        match self {
            Owner::User(_) => fields::USER_ID,
            Owner::Group(_) => fields::GROUP_ID,
        }
    }

    fn reference_field(&self) -> &'static str {
        match self {
            Owner::User(_) => fields::USER_REFERENCE,
            Owner::Group(_) => fields::GROUP_REFERENCE,
        }
    }

    pub fn path(&self) -> &DocumentPath {
        match self {
            Owner::User(p) | Owner::Group(p) => p,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Owner::User(_) => EntityKind::UserDevice,
            Owner::Group(_) => EntityKind::GroupDevice,
        }
    }
}

/// One (device, owner, remote) binding. All three paths must already resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBinding {
    pub device: DocumentPath,
    pub owner: Owner,
    pub remote: DocumentPath,
    pub name: Option<String>,
}

impl NewBinding {
    pub fn into_fields(self) -> Fields {
        let mut body = Fields::new();
        body.insert(fields::DEVICE_ID.into(), Value::from(self.device.id()));
        body.insert(self.owner.id_field().into(), Value::from(self.owner.path().id()));
        body.insert(fields::REMOTE_ID.into(), Value::from(self.remote.id()));
        body.insert(self.owner.reference_field().into(), Value::Reference(self.owner.path().clone()));
        body.insert(fields::DEVICE_REFERENCE.into(), Value::Reference(self.device));
        body.insert(fields::REMOTE_REFERENCE.into(), Value::Reference(self.remote));
        insert_name(&mut body, self.name);
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_body_uses_stored_field_names() {
        let body = NewDevice {
            manufacturer: "Acme".into(),
            model: "L1".into(),
            device_type: "LIGHT".into(),
            traits: vec!["OnOff".into(), "Brightness".into()],
            will_report_state: false,
            name: None,
        }
        .into_fields();

        assert_eq!(body["manufacturer"], Value::from("Acme"));
        assert_eq!(body["type"], Value::from("LIGHT"));
        assert_eq!(body["willReportState"], Value::Bool(false));
        assert_eq!(body["traits"], Value::from(vec!["OnOff".to_string(), "Brightness".to_string()]));
        assert!(!body.contains_key("name"));
    }

    #[test]
    fn group_binding_carries_ids_and_references() {
        let group = EntityKind::Group.doc("g1").unwrap();
        let body = NewBinding {
            device: EntityKind::Device.doc("d1").unwrap(),
            owner: Owner::Group(group.clone()),
            remote: EntityKind::Remote.doc("r1").unwrap(),
            name: Some("lamp".into()),
        }
        .into_fields();

        assert_eq!(body["groupId"], Value::from("g1"));
        assert_eq!(body["groupReference"], Value::Reference(group));
        assert_eq!(body["deviceId"], Value::from("d1"));
        assert_eq!(body["remoteId"], Value::from("r1"));
        assert_eq!(body["name"], Value::from("lamp"));
        assert!(!body.contains_key("userId"));
    }
}
