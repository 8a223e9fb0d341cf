//! Immutable baseline snapshot of the loaded sheet

use std::collections::HashMap;

use anyhow::{Result, bail};

use super::record::{NaturalKey, OrderRecord};
use super::value::{CellValue, EditableField};

/// Every record as it stood at load time, keyed by natural key.
///
/// This is the single comparison reference for dirtiness. It is never
/// mutated; a reload builds a fresh snapshot and the session swaps it in
/// wholesale.
#[derive(Debug, Clone)]
pub struct BaselineSnapshot {
    tab: String,
    records: HashMap<NaturalKey, OrderRecord>,
    /// Natural keys in load order, for stable display
    order: Vec<NaturalKey>,
}

impl BaselineSnapshot {
    /// Build a snapshot from loaded records. Duplicate natural keys mean the
    /// sheet cannot be addressed reliably, so loading fails.
    pub fn from_records(tab: impl Into<String>, records: Vec<OrderRecord>) -> Result<Self> {
        let tab = tab.into();
        let mut map = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());
        for record in records {
            let key = record.natural_key()?;
            if map.contains_key(&key) {
                bail!("duplicate order line '{}' in tab '{}'", key, tab);
            }
            order.push(key.clone());
            map.insert(key, record);
        }
        log::info!("loaded baseline: {} rows from tab '{}'", order.len(), tab);
        Ok(Self {
            tab,
            records: map,
            order,
        })
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    /// Baseline value of a field, if the record exists
    pub fn value(&self, key: &NaturalKey, field: EditableField) -> Option<CellValue> {
        self.records.get(key).map(|r| r.value(field))
    }

    /// Sheet row for a record, for remote addressing
    pub fn row(&self, key: &NaturalKey) -> Option<u32> {
        self.records.get(key).map(|r| r.row)
    }

    /// Records in load order
    pub fn iter(&self) -> impl Iterator<Item = &OrderRecord> {
        self.order.iter().filter_map(|k| self.records.get(k))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
