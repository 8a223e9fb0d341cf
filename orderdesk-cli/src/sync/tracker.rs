//! Diff tracker: pending edits relative to the baseline
//!
//! A dirty cell exists iff its pending value differs from the baseline value
//! under normalized comparison. The baseline is the only comparison
//! reference — never the currently displayed value — so a chain of edits that
//! nets out to the original value leaves no dirty cell behind, and a chain
//! that nets out to a change always leaves exactly one.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::baseline::BaselineSnapshot;
use super::record::NaturalKey;
use super::value::{CellValue, EditableField};

/// One pending field change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyCell {
    pub key: NaturalKey,
    pub field: EditableField,
    pub pending: CellValue,
}

/// What a committed edit did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Value differs from baseline; cell upserted
    MarkedDirty,
    /// Value equals baseline; an existing dirty cell was removed
    Reverted,
    /// Value equals baseline and no dirty cell existed
    CleanNoop,
}

/// Pending (key, field) → value map. Pure state, no I/O.
#[derive(Debug, Default)]
pub struct DiffTracker {
    cells: BTreeMap<(NaturalKey, EditableField), CellValue>,
}

impl DiffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit one edit. Raw input is normalized under the field kind and
    /// compared against the baseline value for that slot.
    pub fn record_edit(
        &mut self,
        baseline: &BaselineSnapshot,
        key: &NaturalKey,
        field: EditableField,
        raw: &str,
    ) -> Result<EditOutcome> {
        let Some(baseline_value) = baseline.value(key, field) else {
            bail!("unknown order line '{}'", key);
        };
        let pending = CellValue::from_edit(field.kind(), raw)?;

        if pending == baseline_value {
            let existed = self.cells.remove(&(key.clone(), field)).is_some();
            if existed {
                log::debug!("{} {}: reverted to baseline", key, field);
                Ok(EditOutcome::Reverted)
            } else {
                Ok(EditOutcome::CleanNoop)
            }
        } else {
            log::debug!("{} {}: '{}' -> '{}'", key, field, baseline_value, pending);
            self.cells.insert((key.clone(), field), pending);
            Ok(EditOutcome::MarkedDirty)
        }
    }

    /// Read-only snapshot of all pending cells, ordered by key then field
    pub fn dirty_cells(&self) -> Vec<DirtyCell> {
        self.cells
            .iter()
            .map(|((key, field), pending)| DirtyCell {
                key: key.clone(),
                field: *field,
                pending: pending.clone(),
            })
            .collect()
    }

    pub fn pending(&self, key: &NaturalKey, field: EditableField) -> Option<&CellValue> {
        self.cells.get(&(key.clone(), field))
    }

    pub fn is_dirty(&self, key: &NaturalKey, field: EditableField) -> bool {
        self.cells.contains_key(&(key.clone(), field))
    }

    /// Natural keys that currently have at least one dirty cell
    pub fn dirty_keys(&self) -> Vec<NaturalKey> {
        let mut keys: Vec<NaturalKey> = Vec::new();
        for (key, _) in self.cells.keys() {
            if keys.last() != Some(key) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Remove one cell (after a confirmed write)
    pub fn clear(&mut self, key: &NaturalKey, field: EditableField) {
        self.cells.remove(&(key.clone(), field));
    }

    /// Remove everything (full reload)
    pub fn clear_all(&mut self) {
        self.cells.clear();
    }

    /// Re-assert a pending value for a slot that must stay dirty.
    /// Used by the reconciler to pin a mismatched cell back to the value the
    /// commit intended, so a retry resends the same intent.
    pub(crate) fn force_pending(&mut self, key: &NaturalKey, field: EditableField, value: CellValue) {
        self.cells.insert((key.clone(), field), value);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::record::OrderRecord;

    fn baseline() -> BaselineSnapshot {
        BaselineSnapshot::from_records(
            "Orders",
            vec![
                OrderRecord {
                    order_no: "SO-1".to_string(),
                    barcode: "A".to_string(),
                    row: 2,
                    product_name: None,
                    image_url: None,
                    delivery_status: None,
                    import_qty: Some(2),
                    cancel_qty: None,
                    note: None,
                },
                OrderRecord {
                    order_no: "SO-2".to_string(),
                    barcode: "B".to_string(),
                    row: 3,
                    product_name: None,
                    image_url: None,
                    delivery_status: None,
                    import_qty: None,
                    cancel_qty: Some(0),
                    note: Some("fragile".to_string()),
                },
            ],
        )
        .unwrap()
    }

    fn key(order_no: &str, barcode: &str) -> NaturalKey {
        NaturalKey::from_parts(order_no, barcode).unwrap()
    }

    #[test]
    fn test_dirty_iff_different() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "5")
            .unwrap();
        assert_eq!(outcome, EditOutcome::MarkedDirty);
        assert_eq!(
            tracker.pending(&k, EditableField::ImportQty),
            Some(&CellValue::Int(5))
        );

        // same value as baseline -> no dirty cell
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "2")
            .unwrap();
        assert_eq!(outcome, EditOutcome::Reverted);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_revert_is_idempotent() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "5")
            .unwrap();
        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "2")
            .unwrap();
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "2")
            .unwrap();
        assert_eq!(outcome, EditOutcome::CleanNoop);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_comparison_is_against_baseline_not_last_edit() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        // 2 -> 7 -> 5 -> 2: the intermediate edits must not hide the net-zero
        for raw in ["7", "5", "2"] {
            tracker
                .record_edit(&baseline, &k, EditableField::ImportQty, raw)
                .unwrap();
        }
        assert!(tracker.is_empty());

        // 2 -> 2 -> 9: the first no-op edit must not hide the net change
        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "2")
            .unwrap();
        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "9")
            .unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_null_empty_equivalence_on_text() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        // baseline note is None; empty edit is equivalent
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::Note, "")
            .unwrap();
        assert_eq!(outcome, EditOutcome::CleanNoop);
    }

    #[test]
    fn test_zero_baseline_is_distinct_from_null() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-2", "B");

        // baseline cancel_qty is 0; blanking it is a real change
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::CancelQty, "")
            .unwrap();
        assert_eq!(outcome, EditOutcome::MarkedDirty);
        assert_eq!(
            tracker.pending(&k, EditableField::CancelQty),
            Some(&CellValue::Null)
        );

        // and writing 0 where the import baseline is null is a real change too
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "0")
            .unwrap();
        assert_eq!(outcome, EditOutcome::MarkedDirty);
    }

    #[test]
    fn test_numeric_strings_compare_by_value() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        // "02" equals baseline 2 numerically
        let outcome = tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "02")
            .unwrap();
        assert_eq!(outcome, EditOutcome::CleanNoop);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-404", "X");
        assert!(
            tracker
                .record_edit(&baseline, &k, EditableField::Note, "hi")
                .is_err()
        );
    }

    #[test]
    fn test_rejected_edit_leaves_tracker_untouched() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "5")
            .unwrap();
        assert!(
            tracker
                .record_edit(&baseline, &k, EditableField::ImportQty, "lots")
                .is_err()
        );
        assert_eq!(
            tracker.pending(&k, EditableField::ImportQty),
            Some(&CellValue::Int(5))
        );
    }

    #[test]
    fn test_dirty_keys_deduplicates() {
        let baseline = baseline();
        let mut tracker = DiffTracker::new();
        let k = key("SO-1", "A");

        tracker
            .record_edit(&baseline, &k, EditableField::ImportQty, "5")
            .unwrap();
        tracker
            .record_edit(&baseline, &k, EditableField::Note, "check stock")
            .unwrap();
        assert_eq!(tracker.dirty_keys(), vec![k]);
    }
}
