//! # Profile Change Tracker
//!
//! Field-level diff between two states of a record, producing the change set
//! stored in the profile audit log. Display helpers for rendering a change
//! set live at the bottom of the module and never feed back into the diff.

use anyhow::Result;
use serde_json::Value;
use shared::{FieldChange, ProfileChanges};

use crate::backend::domain::models::child::{Child, TRACKED_PROFILE_FIELDS};

/// Placeholder rendered for a field with no value
pub const NO_VALUE: &str = "—";

/// Diff the tracked fields of two JSON objects.
///
/// Scalars treat a missing field, `null` and `""` as the same "no value".
/// Lists compare as sets; a difference reports both full lists, sorted.
/// Returns an empty map when nothing changed.
pub fn diff(old: &Value, new: &Value, tracked_fields: &[&str]) -> ProfileChanges {
    let mut changes = ProfileChanges::new();

    for field in tracked_fields {
        let old_value = old.get(*field).unwrap_or(&Value::Null);
        let new_value = new.get(*field).unwrap_or(&Value::Null);

        if old_value.is_array() || new_value.is_array() {
            let old_list = sorted_list(old_value);
            let new_list = sorted_list(new_value);
            if old_list != new_list {
                changes.insert(
                    field.to_string(),
                    FieldChange {
                        old: Value::Array(old_list),
                        new: Value::Array(new_list),
                    },
                );
            }
            continue;
        }

        let old_value = normalize_scalar(old_value);
        let new_value = normalize_scalar(new_value);
        if old_value != new_value {
            changes.insert(
                field.to_string(),
                FieldChange {
                    old: old_value,
                    new: new_value,
                },
            );
        }
    }

    changes
}

/// Diff two child profiles over the tracked profile fields
pub fn diff_children(old: &Child, new: &Child) -> Result<ProfileChanges> {
    let old = serde_json::to_value(old)?;
    let new = serde_json::to_value(new)?;
    Ok(diff(&old, &new, TRACKED_PROFILE_FIELDS))
}

fn normalize_scalar(value: &Value) -> Value {
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn sorted_list(value: &Value) -> Vec<Value> {
    let mut items = match value {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    };
    items.sort_by_key(sort_key);
    items
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field_unit(field: &str) -> Option<&'static str> {
    match field {
        "height_cm" | "head_circumference_cm" => Some("cm"),
        "weight_kg" => Some("kg"),
        _ => None,
    }
}

/// Human label of a profile field; unknown fields are title-cased
pub fn field_label(field: &str) -> String {
    let known = match field {
        "name" => "Name",
        "birth_date" => "Birth Date",
        "gender" => "Gender",
        "height_cm" => "Height",
        "weight_kg" => "Weight",
        "head_circumference_cm" => "Head Circumference",
        "blood_type" => "Blood Type",
        "allergies" => "Allergies",
        "medical_conditions" => "Medical Conditions",
        "notes" => "Notes",
        _ => "",
    };
    if !known.is_empty() {
        return known.to_string();
    }

    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display form of a field value, with units for the biometric fields
pub fn format_field_value(field: &str, value: &Value) -> String {
    match value {
        Value::Null => NO_VALUE.to_string(),
        Value::String(s) if s.is_empty() => NO_VALUE.to_string(),
        Value::Array(items) if items.is_empty() => NO_VALUE.to_string(),
        Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(", "),
        Value::Number(n) => {
            let number = format_number(n);
            match field_unit(field) {
                Some(unit) => format!("{} {}", number, unit),
                None => number,
            }
        }
        Value::String(s) if field == "gender" => capitalize(s),
        other => plain(other),
    }
}

/// One line per changed field, e.g. "Height: 90 cm -> 92.5 cm", in field order
pub fn describe_changes(changes: &ProfileChanges) -> Vec<String> {
    changes
        .iter()
        .map(|(field, change)| {
            format!(
                "{}: {} -> {}",
                field_label(field),
                format_field_value(field, &change.old),
                format_field_value(field, &change.new)
            )
        })
        .collect()
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    }
}

// 92.0 renders as "92"
fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
