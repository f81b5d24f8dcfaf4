//! Command handlers: one per verb and entity.

pub mod bindings;
pub mod entities;
pub mod remote_codes;

use std::io::Write;

use crate::cli::Command;
use crate::error::Error;
use crate::models::EntityKind;
use crate::notify::Notifier;
use crate::output;
use crate::repo::Record;
use crate::store::{DocumentPath, DocumentStore};

/// What every handler runs against.
pub struct Context<'a> {
    pub store: &'a dyn DocumentStore,
    pub notifier: &'a dyn Notifier,
}

pub(crate) fn added(out: &mut dyn Write, path: &DocumentPath) -> Result<(), Error> {
    writeln!(out, "{path} was added")?;
    Ok(())
}

pub(crate) fn deleted(out: &mut dyn Write, path: impl std::fmt::Display) -> Result<(), Error> {
    writeln!(out, "{path} was deleted")?;
    Ok(())
}

pub(crate) fn listed(out: &mut dyn Write, kind: EntityKind, records: &[Record], full: bool) -> Result<(), Error> {
    output::write_records(out, records, full, |r| output::summary(kind, r))?;
    Ok(())
}

pub fn run(ctx: &Context<'_>, command: Command, out: &mut dyn Write) -> Result<(), Error> {
    use entities::{create, delete, get};

    match command {
        Command::GetDevice { device_id, output } => get(ctx, EntityKind::Device, device_id.as_deref(), &output, out),
        Command::AddDevice {
            manufacturer,
            model,
            device_type,
            traits,
            report_state,
            name,
        } => entities::add_device(
            ctx,
            crate::models::NewDevice {
                manufacturer,
                model,
                device_type,
                traits,
                will_report_state: report_state,
                name,
            },
            out,
        ),
        Command::DelDevice { device_id } => delete(ctx, EntityKind::Device, &device_id, out),

        Command::GetRemote { remote_id, output } => get(ctx, EntityKind::Remote, remote_id.as_deref(), &output, out),
        Command::AddRemote {
            mac_addr,
            remote_type,
            name,
        } => {
            let remote = crate::models::NewRemote {
                mac_addr,
                remote_type,
                name,
            };
            create(ctx, EntityKind::Remote, remote.into_fields(), out)
        }
        Command::DelRemote { remote_id } => delete(ctx, EntityKind::Remote, &remote_id, out),

        Command::GetUser { user_id, output } => get(ctx, EntityKind::User, user_id.as_deref(), &output, out),
        Command::AddUser { name } => entities::add_user(ctx, name, out),
        Command::DelUser { user_id } => delete(ctx, EntityKind::User, &user_id, out),

        Command::GetGroup {
            group_id,
            user_id,
            output,
        } => entities::get_groups(ctx, group_id.as_deref(), user_id.as_deref(), &output, out),
        Command::AddGroup { user_id } => entities::add_group(ctx, &user_id, out),
        Command::DelGroup { group_id } => delete(ctx, EntityKind::Group, &group_id, out),

        Command::GetUserDevice {
            user_device_id,
            user_id,
            device_id,
            remote_id,
            output,
        } => bindings::get(
            ctx,
            EntityKind::UserDevice,
            user_device_id.as_deref(),
            bindings::filter(user_id, device_id, remote_id),
            &output,
            out,
        ),
        Command::AddUserDevice {
            device_id,
            user_id,
            remote_id,
            name,
        } => bindings::add(ctx, EntityKind::User, &device_id, &user_id, &remote_id, name, out),
        Command::DelUserDevice { user_device_id } => delete(ctx, EntityKind::UserDevice, &user_device_id, out),

        Command::GetGroupDevice {
            group_device_id,
            group_id,
            device_id,
            remote_id,
            output,
        } => bindings::get(
            ctx,
            EntityKind::GroupDevice,
            group_device_id.as_deref(),
            bindings::filter(group_id, device_id, remote_id),
            &output,
            out,
        ),
        Command::AddGroupDevice {
            device_id,
            group_id,
            remote_id,
            name,
        } => bindings::add(ctx, EntityKind::Group, &device_id, &group_id, &remote_id, name, out),
        Command::DelGroupDevice { group_device_id } => delete(ctx, EntityKind::GroupDevice, &group_device_id, out),

        Command::GetRemoteCode {
            device_id,
            remote_type,
            output,
        } => remote_codes::get(ctx, &device_id, remote_type.as_deref(), &output, out),
        Command::AddRemoteCode {
            device_id,
            remote_type,
            action,
            values,
        } => remote_codes::add(ctx, &device_id, &remote_type, &action, &values, out),
        Command::DelRemoteCode {
            device_id,
            remote_type,
            action,
            value_key,
        } => remote_codes::del(ctx, &device_id, &remote_type, &action, value_key.as_deref(), out),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use crate::notify::{NotifyError, NotifyOutcome, Notifier};

    /// Records every agent user id it is asked to sync.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub calls: RefCell<Vec<String>>,
        pub fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, agent_user_id: &str) -> Result<NotifyOutcome, NotifyError> {
            self.calls.borrow_mut().push(agent_user_id.to_string());
            if self.fail {
                return Err(NotifyError::Transport("connection refused".into()));
            }
            Ok(NotifyOutcome::Sent {
                status: 200,
                reason: "OK".into(),
            })
        }
    }
}
