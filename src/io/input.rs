//! Questionnaire input files.
//!
//! Accepted shapes:
//! - a bare questionnaire object (`{ "batiments": {...}, ... }`)
//! - a saved progress envelope (`{ "currentStep": .., "formData": {...} }`)
//!
//! Either shape may carry an `entity` object (`employees`, `surface`) used when
//! several entities are compared.
//!
//! Decoding is forgiving at field level; only a document that is not a JSON
//! object at all is rejected.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::domain::{EntityProfile, Questionnaire};
use crate::error::AppError;

/// Read a questionnaire from `path`, or from stdin when `path` is `-`.
pub fn load_questionnaire(path: &Path) -> Result<Questionnaire, AppError> {
    load_entity(path).map(|(questionnaire, _)| questionnaire)
}

/// Read a questionnaire and its entity profile from `path` (or stdin for `-`).
pub fn load_entity(path: &Path) -> Result<(Questionnaire, EntityProfile), AppError> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::input(format!("Failed to read stdin: {e}")))?;
        buf
    } else {
        fs::read_to_string(path)
            .map_err(|e| AppError::input(format!("Failed to open '{}': {e}", path.display())))?
    };
    parse_entity(&text).map_err(|e| {
        AppError::input(format!("Invalid questionnaire '{}': {}", path.display(), e.message()))
    })
}

/// Parse questionnaire JSON text.
pub fn parse_questionnaire(text: &str) -> Result<Questionnaire, AppError> {
    parse_entity(text).map(|(questionnaire, _)| questionnaire)
}

/// Parse questionnaire JSON text along with its entity profile.
///
/// Profile values missing from the `entity` object are derived from the
/// questionnaire itself.
pub fn parse_entity(text: &str) -> Result<(Questionnaire, EntityProfile), AppError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AppError::input(format!("not valid JSON: {e}")))?;

    let Value::Object(mut map) = value else {
        return Err(AppError::input("expected a JSON object keyed by category"));
    };

    let declared = match map.remove("entity") {
        Some(entity) => serde_json::from_value::<EntityProfile>(entity).unwrap_or_else(|e| {
            log::warn!("ignoring malformed entity profile: {e}");
            EntityProfile::default()
        }),
        None => EntityProfile::default(),
    };

    let value = match map.remove("formData") {
        Some(form) => {
            log::debug!("reading formData from a progress envelope");
            form
        }
        None => Value::Object(map),
    };

    let questionnaire = if value.is_null() {
        Questionnaire::new()
    } else {
        serde_json::from_value(value).map_err(|e| AppError::input(format!("{e}")))?
    };
    let profile = declared.or_derived(&questionnaire);
    Ok((questionnaire, profile))
}

/// Display name for an input path: the file stem, or `stdin`.
pub fn entity_name(path: &Path) -> String {
    if path.as_os_str() == "-" {
        return "stdin".to_string();
    }
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
