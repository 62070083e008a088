//! Forgiving field decoders for questionnaire records.
//!
//! Form input arrives as loosely typed JSON: numbers may be strings (sometimes with
//! a decimal comma), checkboxes may be strings or 0/1, and whole sub-records may be
//! missing or malformed. None of these abort a computation; an unusable value
//! simply becomes "absent" and contributes nothing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::BuildingRecord;

/// Decode a non-negative, finite quantity. Anything else becomes `None`.
pub fn quantity<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(to_quantity(&value))
}

/// Decode a yes/no flag (`true`, `"oui"`, `1`, ...).
pub fn flag<'de, D>(de: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(to_flag(&value))
}

/// Decode a free-text label; numbers are kept as their decimal text.
pub fn label<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Decode the per-building list. Entries that are not objects are dropped.
pub fn records<'de, D>(de: D) -> Result<Vec<BuildingRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    let Value::Array(items) = value else {
        if !value.is_null() {
            log::warn!("ignoring non-list building records: {value}");
        }
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            log::warn!("ignoring building record #{}: not an object", idx + 1);
            continue;
        }
        match serde_json::from_value::<BuildingRecord>(item) {
            Ok(record) => out.push(record),
            Err(e) => log::warn!("ignoring building record #{}: {e}", idx + 1),
        }
    }
    Ok(out)
}

pub(crate) fn to_quantity(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.replace(',', ".").parse::<f64>().ok()
        }
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Some(v),
        Some(v) => {
            log::warn!("ignoring out-of-range quantity {v}");
            None
        }
        None => {
            log::warn!("ignoring non-numeric quantity {value}");
            None
        }
    }
}

pub(crate) fn to_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "oui" | "1" | "on" => Some(true),
            "false" | "no" | "non" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_accepts_numbers_and_numeric_strings() {
        assert_eq!(to_quantity(&json!(12.5)), Some(12.5));
        assert_eq!(to_quantity(&json!("12.5")), Some(12.5));
        assert_eq!(to_quantity(&json!(" 12,5 ")), Some(12.5));
        assert_eq!(to_quantity(&json!(0)), Some(0.0));
    }

    #[test]
    fn quantity_rejects_garbage_and_negatives() {
        assert_eq!(to_quantity(&json!("beaucoup")), None);
        assert_eq!(to_quantity(&json!(-3)), None);
        assert_eq!(to_quantity(&json!([1, 2])), None);
        assert_eq!(to_quantity(&json!(null)), None);
        assert_eq!(to_quantity(&json!("")), None);
    }

    #[test]
    fn flag_understands_form_values() {
        assert_eq!(to_flag(&json!(true)), Some(true));
        assert_eq!(to_flag(&json!("oui")), Some(true));
        assert_eq!(to_flag(&json!("Non")), Some(false));
        assert_eq!(to_flag(&json!(0)), Some(false));
        assert_eq!(to_flag(&json!("peut-être")), None);
    }
}
