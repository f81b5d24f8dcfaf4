use log::warn;
use std::io::Write;

use super::{Context, deleted};
use crate::cli::OutputArgs;
use crate::error::Error;
use crate::output;
use crate::repo::remote_codes::{Removal, RemoteCodes};

pub fn get(
    ctx: &Context<'_>,
    device_id: &str,
    remote_type: Option<&str>,
    args: &OutputArgs,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let records = RemoteCodes::new(ctx.store).list(device_id, remote_type)?;
    output::write_records(out, &records, args.full, output::code_summary)?;
    Ok(())
}

pub fn add(
    ctx: &Context<'_>,
    device_id: &str,
    remote_type: &str,
    action: &str,
    values: &[String],
    out: &mut dyn Write,
) -> Result<(), Error> {
    let pairs = RemoteCodes::new(ctx.store).upsert(device_id, remote_type, action, values)?;
    for (key, value) in pairs {
        writeln!(out, "devices/{device_id}/{remote_type}/{action}/{key}={value} was added")?;
    }
    Ok(())
}

/// Delete the action document, or a single key of it with `value_key`.
pub fn del(
    ctx: &Context<'_>,
    device_id: &str,
    remote_type: &str,
    action: &str,
    value_key: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let codes = RemoteCodes::new(ctx.store);
    let removal = match value_key {
        Some(key) => codes.remove_value(device_id, remote_type, action, key)?,
        None => codes.remove(device_id, remote_type, action)?,
    };
    let suffix = value_key.map(|k| format!("/{k}")).unwrap_or_default();
    match removal {
        Removal::Deleted(path) => deleted(out, format!("{path}{suffix}")),
        Removal::Absent(path) => {
            warn!("{path}{suffix} does not exist");
            writeln!(out, "{path}{suffix} does not exist, nothing deleted")?;
            Ok(())
        }
    }
}
