use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const STATE_FILE: &str = "client_state.json";
const ACCEPTED_KEY: &str = "accepted";
const ACCEPTED_SENTINEL: &str = "yes";

/// Persisted proxy for "the user has completed the terms gate at least once
/// on this machine". Advisory only — the backend's `termsAccepted` is the
/// source of truth; this flag just avoids resending the accept action.
///
/// The flag is monotonic: set once after a successful accept dispatch, never
/// cleared, so concurrent writers cannot conflict destructively.
#[derive(Debug, Clone)]
pub struct AcceptanceStore {
    path: PathBuf,
}

impl AcceptanceStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATE_FILE),
        }
    }

    /// Missing or unreadable state reads as "not accepted"; a corrupt file
    /// only costs one redundant accept dispatch.
    pub fn is_accepted(&self) -> bool {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return false;
        };
        let Ok(state) = serde_json::from_str::<BTreeMap<String, String>>(&raw) else {
            return false;
        };
        state.get(ACCEPTED_KEY).map(String::as_str) == Some(ACCEPTED_SENTINEL)
    }

    pub fn mark_accepted(&self) -> Result<(), AppError> {
        let mut state = fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(&raw).ok())
            .unwrap_or_default();
        state.insert(ACCEPTED_KEY.to_string(), ACCEPTED_SENTINEL.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}
