//! Questionnaire progress autosave.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EmissionCategory, Questionnaire};
use crate::error::AppError;
use crate::store::{KeyValueStore, PROGRESS_KEY};

/// Where the user is in the questionnaire, plus what they entered so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub completed_steps: Vec<usize>,
    #[serde(default)]
    pub available_categories: Vec<EmissionCategory>,
    #[serde(default)]
    pub form_data: Questionnaire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
}

impl Progress {
    fn same_content(&self, other: &Progress) -> bool {
        Progress {
            last_saved: None,
            ..self.clone()
        } == Progress {
            last_saved: None,
            ..other.clone()
        }
    }
}

/// Save `progress` stamped with `now`.
///
/// Returns `false` (and writes nothing) when only the timestamp would change.
pub fn save_progress(
    store: &mut dyn KeyValueStore,
    progress: &Progress,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    if let Some(previous) = restore_progress(store)? {
        if previous.same_content(progress) {
            log::debug!("progress unchanged, not saved");
            return Ok(false);
        }
    }

    let stamped = Progress {
        last_saved: Some(now),
        ..progress.clone()
    };
    let json = serde_json::to_string(&stamped)
        .map_err(|e| AppError::internal(format!("Failed to serialize progress: {e}")))?;
    store.set(PROGRESS_KEY, &json)?;
    log::info!("progress saved (step {})", stamped.current_step);
    Ok(true)
}

/// Restore saved progress. An unreadable payload is reported and treated as absent.
pub fn restore_progress(store: &dyn KeyValueStore) -> Result<Option<Progress>, AppError> {
    let Some(json) = store.get(PROGRESS_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str::<Progress>(&json) {
        Ok(progress) => Ok(Some(progress)),
        Err(e) => {
            log::warn!("discarding unreadable saved progress: {e}");
            Ok(None)
        }
    }
}

pub fn clear_progress(store: &mut dyn KeyValueStore) -> Result<(), AppError> {
    store.remove(PROGRESS_KEY)
}
