//! Ready set: the user-reviewable change list
//!
//! Rebuilt from the diff tracker after every mutation. One item per record
//! with at least one dirty cell, carrying the pending fields and a derived
//! import delta the operator may override by hand.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::baseline::BaselineSnapshot;
use super::record::NaturalKey;
use super::tracker::DiffTracker;
use super::value::{CellValue, EditableField};

/// A record's pending changes, shaped for operator review
#[derive(Debug, Clone, Serialize)]
pub struct ReadyItem {
    pub key: NaturalKey,
    pub order_no: String,
    pub barcode: String,
    pub product_name: Option<String>,
    pub delivery_status: Option<String>,
    /// Pending values for the record's dirty fields
    pub changes: BTreeMap<EditableField, CellValue>,
    /// Derived: `max(0, pending import − baseline import)`, 0 when import
    /// qty is not among the dirty fields
    pub delta_qty: i64,
    /// Operator-adjusted delta, when set
    pub delta_override: Option<i64>,
}

impl ReadyItem {
    /// The delta to act on: the override when present, the derived value
    /// otherwise
    pub fn effective_delta(&self) -> i64 {
        self.delta_override.unwrap_or(self.delta_qty)
    }
}

/// Display-ready aggregation over the tracker's dirty cells.
///
/// Delta overrides are owned here and only here: they never feed back into
/// the tracker, survive reverts of the underlying cells (re-attaching if the
/// record becomes dirty again), and are discarded on reload.
#[derive(Debug, Default)]
pub struct ReadySet {
    items: Vec<ReadyItem>,
    overrides: HashMap<NaturalKey, i64>,
}

impl ReadySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate the item list from the tracker's current state
    pub fn rebuild(&mut self, baseline: &BaselineSnapshot, tracker: &DiffTracker) {
        let mut by_key: BTreeMap<NaturalKey, BTreeMap<EditableField, CellValue>> = BTreeMap::new();
        for cell in tracker.dirty_cells() {
            by_key.entry(cell.key).or_default().insert(cell.field, cell.pending);
        }

        let mut items = Vec::with_capacity(by_key.len());
        // baseline load order keeps the review list stable across rebuilds
        for record in baseline.iter() {
            let Ok(key) = record.natural_key() else {
                continue;
            };
            let Some(changes) = by_key.remove(&key) else {
                continue;
            };
            let delta_qty = match changes.get(&EditableField::ImportQty) {
                Some(pending) => {
                    let pending = pending.as_int().unwrap_or(0);
                    let baseline_qty = record.import_qty.unwrap_or(0);
                    (pending - baseline_qty).max(0)
                }
                None => 0,
            };
            items.push(ReadyItem {
                key: key.clone(),
                order_no: record.order_no.clone(),
                barcode: record.barcode.clone(),
                product_name: record.product_name.clone(),
                delivery_status: record.delivery_status.clone(),
                changes,
                delta_qty,
                delta_override: self.overrides.get(&key).copied(),
            });
        }
        log::debug!("ready set rebuilt: {} item(s)", items.len());
        self.items = items;
    }

    /// Hand-adjust a record's delta. Only records currently in the ready set
    /// accept an override; negative input clamps to 0. Returns false when no
    /// item exists for the key.
    pub fn set_delta_override(&mut self, key: &NaturalKey, delta: i64) -> bool {
        let delta = delta.max(0);
        let Some(item) = self.items.iter_mut().find(|i| &i.key == key) else {
            return false;
        };
        item.delta_override = Some(delta);
        self.overrides.insert(key.clone(), delta);
        true
    }

    pub fn clear_delta_override(&mut self, key: &NaturalKey) {
        self.overrides.remove(key);
        if let Some(item) = self.items.iter_mut().find(|i| &i.key == key) {
            item.delta_override = None;
        }
    }

    /// Drop everything, overrides included. Only a full reload does this.
    pub fn reset(&mut self) {
        self.items.clear();
        self.overrides.clear();
    }

    pub fn items(&self) -> &[ReadyItem] {
        &self.items
    }

    pub fn get(&self, key: &NaturalKey) -> Option<&ReadyItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
