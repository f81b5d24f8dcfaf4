//! Devices, remotes, users and groups.

use std::io::Write;

use super::{Context, added, deleted, listed};
use crate::cli::OutputArgs;
use crate::error::Error;
use crate::models::{EntityKind, NewDevice, NewUser};
use crate::repo::{self, Repository, associations};
use crate::store::Fields;

pub fn get(
    ctx: &Context<'_>,
    kind: EntityKind,
    key: Option<&str>,
    output: &OutputArgs,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let records = Repository::new(ctx.store, kind).list(key)?;
    listed(out, kind, &records, output.full)
}

pub fn create(ctx: &Context<'_>, kind: EntityKind, body: Fields, out: &mut dyn Write) -> Result<(), Error> {
    let path = Repository::new(ctx.store, kind).create(body)?;
    added(out, &path)
}

pub fn delete(ctx: &Context<'_>, kind: EntityKind, key: &str, out: &mut dyn Write) -> Result<(), Error> {
    let path = Repository::new(ctx.store, kind).delete(key)?;
    deleted(out, path)
}

pub fn add_device(ctx: &Context<'_>, device: NewDevice, out: &mut dyn Write) -> Result<(), Error> {
    create(ctx, EntityKind::Device, device.into_fields(), out)
}

pub fn add_user(ctx: &Context<'_>, name: Option<String>, out: &mut dyn Write) -> Result<(), Error> {
    let path = repo::add_user(ctx.store, NewUser { name })?;
    added(out, &path)
}

pub fn get_groups(
    ctx: &Context<'_>,
    key: Option<&str>,
    member: Option<&str>,
    output: &OutputArgs,
    out: &mut dyn Write,
) -> Result<(), Error> {
    let records = associations::list_groups(ctx.store, key, member)?;
    listed(out, EntityKind::Group, &records, output.full)
}

pub fn add_group(ctx: &Context<'_>, member_ids: &[String], out: &mut dyn Write) -> Result<(), Error> {
    let path = associations::add_group(ctx.store, member_ids)?;
    added(out, &path)
}
