//! Edit coalescing stage in front of the diff tracker
//!
//! Rapid keystrokes against the same cell collapse into one tracker edit
//! carrying the last value. The stage is deadline-driven: callers feed it a
//! clock (`Instant`) and poll for due edits, so the tracker's correctness
//! rules stay testable without real timers.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::record::NaturalKey;
use super::value::EditableField;

/// Default quiet period before a buffered edit is released
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// A buffered edit ready to be committed to the tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalescedEdit {
    pub key: NaturalKey,
    pub field: EditableField,
    pub raw: String,
}

/// Per-slot keystroke buffer with a quiet-period deadline
#[derive(Debug)]
pub struct EditCoalescer {
    quiet_period: Duration,
    pending: HashMap<(NaturalKey, EditableField), (String, Instant)>,
}

impl EditCoalescer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: HashMap::new(),
        }
    }

    /// Buffer a keystroke. A later push to the same slot replaces the value
    /// and pushes the deadline out.
    pub fn push(&mut self, key: NaturalKey, field: EditableField, raw: impl Into<String>, now: Instant) {
        let deadline = now + self.quiet_period;
        self.pending.insert((key, field), (raw.into(), deadline));
    }

    /// Remove and return every edit whose quiet period has elapsed
    pub fn due(&mut self, now: Instant) -> Vec<CoalescedEdit> {
        let due_slots: Vec<(NaturalKey, EditableField)> = self
            .pending
            .iter()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .map(|(slot, _)| slot.clone())
            .collect();
        self.drain_slots(due_slots)
    }

    /// Remove and return everything, deadlines notwithstanding. Called before
    /// a status display or commit so no buffered edit is left behind.
    pub fn flush_all(&mut self) -> Vec<CoalescedEdit> {
        let slots: Vec<(NaturalKey, EditableField)> = self.pending.keys().cloned().collect();
        self.drain_slots(slots)
    }

    fn drain_slots(&mut self, mut slots: Vec<(NaturalKey, EditableField)>) -> Vec<CoalescedEdit> {
        // stable order keeps downstream logs and tests deterministic
        slots.sort();
        slots
            .into_iter()
            .filter_map(|slot| {
                self.pending.remove(&slot).map(|(raw, _)| CoalescedEdit {
                    key: slot.0,
                    field: slot.1,
                    raw,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for EditCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
