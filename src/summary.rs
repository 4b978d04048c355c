//! Human-readable summaries of platform records.

use itertools::Itertools;
use serde_json::Value;

use crate::client::Record;
use crate::manifest::CreatedRecord;

const MISSING: &str = "N/A";

/// Render a record field as text.
///
/// Reference fields arrive either as plain strings or as objects carrying
/// `display_value` and/or `value`; the display value wins.
pub fn field_text(record: &Record, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(obj) => obj
            .get("display_value")
            .or_else(|| obj.get("value"))
            .and_then(Value::as_str)
            .map(str::to_string)?,
        _ => return None,
    };
    Some(text).filter(|t| !t.is_empty())
}

fn field_or<'a>(record: &Record, key: &str, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    match field_text(record, key) {
        Some(text) => text.into(),
        None => fallback.into(),
    }
}

/// `"{what}: {record[key]} (sys_id: {sys_id})"`.
pub fn created(what: &str, record: &Record, key: &str) -> String {
    format!(
        "{}: {} (sys_id: {})",
        what,
        field_or(record, key, MISSING),
        field_or(record, "sys_id", MISSING)
    )
}

/// Parent record line plus the names of the variables created under it.
pub fn created_with_variables(what: &str, records: &[CreatedRecord]) -> String {
    let Some(parent) = records.first() else {
        return format!("{what}: nothing was created");
    };
    let variables = records
        .iter()
        .filter(|r| r.table == crate::model::tables::VARIABLE)
        .map(|r| r.display.as_deref().unwrap_or(MISSING))
        .join(", ");
    let head = created(what, &parent.record, "name");
    if variables.is_empty() {
        head
    } else {
        format!("{head} with variables: {variables}")
    }
}

pub fn incident_details(record: &Record) -> String {
    let state = field_text(record, "incident_state")
        .or_else(|| field_text(record, "state"))
        .unwrap_or_else(|| MISSING.to_string());
    [
        format!("Number: {}", field_or(record, "number", MISSING)),
        format!("State: {state}"),
        format!("Priority: {}", field_or(record, "priority", MISSING)),
        format!("Short Description: {}", field_or(record, "short_description", MISSING)),
        format!("Assignment Group: {}", field_or(record, "assignment_group", "Unassigned")),
        format!("Assigned To: {}", field_or(record, "assigned_to", "Unassigned")),
        format!("Updated: {}", field_or(record, "sys_updated_on", MISSING)),
    ]
    .join("\n")
}

pub fn incident_list(records: &[Record]) -> String {
    let header = format!("Found {} recent incidents:", records.len());
    let lines = records.iter().map(|r| {
        format!(
            "- {}: {} (State: {}, Priority: {})",
            field_or(r, "number", MISSING),
            field_or(r, "short_description", ""),
            field_or(r, "state", MISSING),
            field_or(r, "priority", MISSING)
        )
    });
    std::iter::once(header).chain(lines).join("\n")
}
