//! Rendering of listed records: pretty JSON with `--full`, one line each otherwise.

use std::io::{self, Write};

use crate::models::{EntityKind, fields};
use crate::repo::Record;
use crate::store::value::fields_to_json;

fn field(record: &Record, name: &str) -> String {
    record
        .fields
        .get(name)
        .map(|v| v.display())
        .unwrap_or_else(|| "-".to_string())
}

/// One-line summary of an entity record.
pub fn summary(kind: EntityKind, record: &Record) -> String {
    let detail = match kind {
        EntityKind::Device => {
            let reports = record
                .fields
                .get(fields::WILL_REPORT_STATE)
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            format!(
                "{} {} {} {} [{}]{}",
                field(record, fields::NAME),
                field(record, fields::MANUFACTURER),
                field(record, fields::MODEL),
                field(record, fields::TYPE),
                field(record, fields::TRAITS),
                if reports { " reports state" } else { "" }
            )
        }
        EntityKind::Remote => format!(
            "{} {} {}",
            field(record, fields::NAME),
            field(record, fields::MAC_ADDR),
            field(record, fields::TYPE)
        ),
        EntityKind::User => field(record, fields::NAME),
        EntityKind::Group => {
            let members: Vec<&str> = record
                .fields
                .keys()
                .map(String::as_str)
                .filter(|k| *k != fields::ID)
                .collect();
            format!("members {}", members.join(","))
        }
        EntityKind::UserDevice | EntityKind::GroupDevice => {
            let owner = if kind == EntityKind::UserDevice {
                ("user", fields::USER_ID)
            } else {
                ("group", fields::GROUP_ID)
            };
            format!(
                "device {} {} {} remote {} {}",
                field(record, fields::DEVICE_ID),
                owner.0,
                field(record, owner.1),
                field(record, fields::REMOTE_ID),
                field(record, fields::NAME)
            )
        }
    };
    format!("{}: {}", record.path, detail)
}

/// `devices/d1/IR/OnOff: mode=cool, power=on`
pub fn code_summary(record: &Record) -> String {
    let pairs: Vec<String> = record
        .fields
        .iter()
        .filter(|(k, _)| k.as_str() != fields::ID)
        .map(|(k, v)| format!("{k}={}", v.display()))
        .collect();
    format!("{}: {}", record.path, pairs.join(", "))
}

pub fn write_records(
    out: &mut dyn Write,
    records: &[Record],
    full: bool,
    line: impl Fn(&Record) -> String,
) -> io::Result<()> {
    if full {
        let json: Vec<serde_json::Value> = records.iter().map(|r| fields_to_json(&r.fields)).collect();
        let text = serde_json::to_string_pretty(&json).map_err(io::Error::other)?;
        writeln!(out, "{text}")
    } else {
        for record in records {
            writeln!(out, "{}", line(record))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentPath, Fields, Value};

    fn record(path: &str, pairs: &[(&str, Value)]) -> Record {
        let mut fields = Fields::new();
        fields.insert("id".into(), Value::from(DocumentPath::parse(path).unwrap().id()));
        for (k, v) in pairs {
            fields.insert(k.to_string(), v.clone());
        }
        Record {
            path: DocumentPath::parse(path).unwrap(),
            fields,
        }
    }

    #[test]
    fn device_summary_line() {
        let r = record(
            "devices/d1",
            &[
                ("manufacturer", Value::from("Acme")),
                ("model", Value::from("L1")),
                ("type", Value::from("LIGHT")),
                ("traits", Value::from(vec!["OnOff".to_string(), "Brightness".to_string()])),
                ("willReportState", Value::Bool(true)),
            ],
        );
        assert_eq!(
            summary(EntityKind::Device, &r),
            "devices/d1: - Acme L1 LIGHT [OnOff,Brightness] reports state"
        );
    }

    #[test]
    fn group_and_code_lines_skip_id() {
        let g = record("groups/g1", &[("u1", Value::Null), ("u2", Value::Null)]);
        assert_eq!(summary(EntityKind::Group, &g), "groups/g1: members u1,u2");

        let c = record(
            "devices/d1/IR/OnOff",
            &[("power", Value::from("on")), ("mode", Value::from("cool"))],
        );
        assert_eq!(code_summary(&c), "devices/d1/IR/OnOff: mode=cool, power=on");
    }

    #[test]
    fn full_output_is_a_json_array() {
        let r = record("users/u1", &[("name", Value::from("alice"))]);
        let mut out = Vec::new();
        write_records(&mut out, &[r], true, |r| summary(EntityKind::User, r)).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, serde_json::json!([{"id": "u1", "name": "alice"}]));
    }
}
