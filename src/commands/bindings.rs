//! User-device and group-device bindings, with the sync requests they trigger.

use log::info;
use std::io::Write;

use super::{Context, added, listed};
use crate::cli::OutputArgs;
use crate::error::{Error, RegistryError};
use crate::models::EntityKind;
use crate::notify::NotifyOutcome;
use crate::repo::associations::{self, BindingFilter, BindingRequest};

pub fn filter(owner_id: Option<String>, device_id: Option<String>, remote_id: Option<String>) -> BindingFilter {
    BindingFilter {
        owner_id,
        device_id,
        remote_id,
    }
}

pub fn get(
    ctx: &Context<'_>,
    kind: EntityKind,
    key: Option<&str>,
    filter: BindingFilter,
    output: &OutputArgs,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let records = associations::list_bindings(ctx.store, kind, key, &filter)?;
    listed(out, kind, &records, output.full)
}

/// Create the binding, then request a sync for the user or for every group member.
/// A failed request fails the command; the binding stays written.
pub fn add(
    ctx: &Context<'_>,
    owner_kind: EntityKind,
    device_id: &str,
    owner_id: &str,
    remote_id: &str,
    name: Option<String>,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let request = BindingRequest {
        device_id,
        owner_id,
        remote_id,
        name,
    };
    let path = associations::add_binding(ctx.store, owner_kind, request)?;
    added(out, &path)?;

    let agent_users = match owner_kind {
        EntityKind::Group => associations::group_members(ctx.store, owner_id)?,
        _ => vec![owner_id.to_string()],
    };
    for user in agent_users {
        match ctx.notifier.notify(&user).map_err(RegistryError::from)? {
            NotifyOutcome::Sent { status, reason } => info!("sync requested for {user}: {status} {reason}"),
            NotifyOutcome::Skipped => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingNotifier;
    use crate::notify::SyncNotifier;
    use crate::store::{Fields, MemoryStore};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (kind, id) in [
            (EntityKind::User, "u1"),
            (EntityKind::Device, "d1"),
            (EntityKind::Remote, "r1"),
        ] {
            store.seed(kind.doc(id).unwrap(), Fields::new());
        }
        store
    }

    #[test]
    fn no_api_key_means_no_request() {
        let store = seeded();
        // Unroutable base URL: any attempted request would fail the command.
        let notifier = SyncNotifier::new("http://127.0.0.1:9", None);
        let ctx = Context {
            store: &store,
            notifier: &notifier,
        };
        let mut out = Vec::new();

        add(&ctx, EntityKind::User, "d1", "u1", "r1", None, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("user_devices/") && text.ends_with(" was added\n"), "{text}");
    }

    #[test]
    fn no_api_key_means_no_request_for_group_members() {
        let store = seeded();
        store.seed(EntityKind::User.doc("u2").unwrap(), Fields::new());
        let group = associations::add_group(&store, &["u1".into(), "u2".into()]).unwrap();
        assert_eq!(associations::group_members(&store, group.id()).unwrap().len(), 2);
        let notifier = SyncNotifier::new("http://127.0.0.1:9", None);
        let ctx = Context {
            store: &store,
            notifier: &notifier,
        };
        let mut out = Vec::new();

        add(&ctx, EntityKind::Group, "d1", group.id(), "r1", None, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("group_devices/") && text.ends_with(" was added\n"), "{text}");
    }

    #[test]
    fn listing_filters_by_device() {
        let store = seeded();
        store.seed(EntityKind::Device.doc("d2").unwrap(), Fields::new());
        let notifier = RecordingNotifier::default();
        let ctx = Context {
            store: &store,
            notifier: &notifier,
        };
        let mut sink = Vec::new();
        add(&ctx, EntityKind::User, "d1", "u1", "r1", Some("lamp".into()), &mut sink).unwrap();
        add(&ctx, EntityKind::User, "d2", "u1", "r1", None, &mut sink).unwrap();

        let mut out = Vec::new();
        get(
            &ctx,
            EntityKind::UserDevice,
            None,
            filter(None, Some("d1".into()), None),
            &OutputArgs::default(),
            &mut out,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with(": device d1 user u1 remote r1 lamp\n"), "{text}");
    }
}
