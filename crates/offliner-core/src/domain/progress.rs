//! The Progress Record (spec §4.1).

use serde::{Deserialize, Serialize};

/// Coarse-grained state in the Progress Record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Preparing,
    Downloading,
    Converting,
    Finalizing,
    Done,
    Error,
    Cancelled,
}

impl ProgressPhase {
    /// A phase is terminal iff it can never be followed by another update
    /// for the same `request_id` (spec §4.1, `complete` flag companion).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }
}

/// Shape and invariants of a Progress Store entry (spec §4.1).
///
/// No schema version field (spec §6): consumers must tolerate unknown
/// fields, which `#[serde(default)]` on every field here makes automatic
/// when deserializing records written by a future, richer version of this
/// type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub percent: u8,
    #[serde(default = "ProgressRecord::default_phase")]
    pub phase: ProgressPhase,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub current_file: Option<String>,
    #[serde(default)]
    pub completed_items: u32,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub temp_dir: String,
    #[serde(default)]
    pub cancel_requested: bool,
}

impl ProgressRecord {
    const fn default_phase() -> ProgressPhase {
        ProgressPhase::Preparing
    }

    /// The record created by `create(id, total_items)` (spec §4.1).
    #[must_use]
    pub fn new(total_items: u32, temp_dir: impl Into<String>) -> Self {
        Self {
            percent: 0,
            phase: ProgressPhase::Preparing,
            status: "Preparing...".to_string(),
            detail: String::new(),
            speed: None,
            eta: None,
            current_file: None,
            completed_items: 0,
            total_items,
            complete: false,
            error: None,
            file_path: None,
            temp_dir: temp_dir.into(),
            cancel_requested: false,
        }
    }

    /// The synthetic record `get(id)` returns for an absent key (spec §4.1).
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            percent: 0,
            phase: ProgressPhase::Error,
            status: "Unknown".to_string(),
            detail: String::new(),
            speed: None,
            eta: None,
            current_file: None,
            completed_items: 0,
            total_items: 0,
            complete: true,
            error: Some("Session not found".to_string()),
            file_path: None,
            temp_dir: String::new(),
            cancel_requested: false,
        }
    }

    /// Merge-only update of a single record's mutable fields, matching the
    /// Progress Store's `update(id, fields…)` merge semantics. The caller
    /// supplies a mutator closure so this can be used both by adapters
    /// (deserialize -> mutate -> serialize) and by tests.
    pub fn apply(&mut self, mutate: impl FnOnce(&mut Self)) {
        mutate(self);
    }

    /// Publish the success terminal state (spec §4.5 "Publish terminal
    /// state").
    pub fn mark_done(&mut self, file_path: impl Into<String>) {
        self.file_path = Some(file_path.into());
        self.complete = true;
        self.percent = 100;
        self.status = "Done!".to_string();
        self.phase = ProgressPhase::Done;
    }

    /// Publish the failure terminal state.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.complete = true;
        self.percent = 100;
        self.phase = ProgressPhase::Error;
    }

    /// Publish the cancellation terminal state.
    pub fn mark_cancelled(&mut self) {
        self.error = Some("Cancelled by client disconnect".to_string());
        self.complete = true;
        self.phase = ProgressPhase::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_tolerated_on_deserialize() {
        let json = serde_json::json!({
            "percent": 10,
            "phase": "downloading",
            "status": "Downloading...",
            "temp_dir": "/tmp/x",
            "some_future_field": 42,
        });
        let record: ProgressRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.percent, 10);
        assert_eq!(record.phase, ProgressPhase::Downloading);
    }

    #[test]
    fn create_then_update_then_get_merges() {
        let mut record = ProgressRecord::new(3, "/tmp/sess");
        record.apply(|r| {
            r.percent = 50;
            r.status = "Downloading...".to_string();
        });
        assert_eq!(record.percent, 50);
        assert_eq!(record.total_items, 3); // unrelated field preserved
    }

    #[test]
    fn terminal_states_set_complete() {
        let mut record = ProgressRecord::new(1, "/tmp/sess");
        record.mark_done("/tmp/sess/out.mp3");
        assert!(record.complete);
        assert_eq!(record.phase, ProgressPhase::Done);
        assert_eq!(record.file_path.as_deref(), Some("/tmp/sess/out.mp3"));
    }
}
