//! Edits CSV parsing
//!
//! The edits file is the batch stand-in for interactive editing: one row per
//! committed edit, applied in file order.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::sync::record::NaturalKey;
use crate::sync::value::EditableField;

/// One parsed edit, addressed by natural key
#[derive(Debug, Clone)]
pub struct Edit {
    pub key: NaturalKey,
    pub action: EditAction,
}

/// What an edits row does
#[derive(Debug, Clone)]
pub enum EditAction {
    /// Set an editable field (tracked against the baseline)
    Set { field: EditableField, value: String },
    /// Hand-adjust the derived import delta (aggregator-only, never tracked)
    DeltaOverride(i64),
}

/// Field-column name that routes to the delta override instead of a tracked
/// field
const DELTA_FIELD: &str = "delta_qty";

#[derive(Debug, Deserialize)]
struct EditRow {
    order_no: String,
    barcode: String,
    field: String,
    #[serde(default)]
    value: String,
}

/// Read an edits CSV. Unknown field names and malformed keys fail here, with
/// the offending line in the error.
pub fn read_edits(path: &Path) -> Result<Vec<Edit>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open edits file {}", path.display()))?;

    let mut edits = Vec::new();
    for (index, row) in reader.deserialize::<EditRow>().enumerate() {
        let line = index + 2; // header is line 1
        let row = row.with_context(|| format!("bad edits row at line {}", line))?;
        let key = NaturalKey::from_parts(&row.order_no, &row.barcode)
            .with_context(|| format!("bad natural key at line {}", line))?;
        let action = if row.field.trim() == DELTA_FIELD {
            let delta = row
                .value
                .trim()
                .parse::<i64>()
                .with_context(|| format!("bad delta value at line {}", line))?;
            EditAction::DeltaOverride(delta)
        } else {
            let field = EditableField::parse(&row.field)
                .with_context(|| format!("bad field at line {}", line))?;
            EditAction::Set {
                field,
                value: row.value,
            }
        };
        edits.push(Edit { key, action });
    }
    log::info!("read {} edit(s) from {}", edits.len(), path.display());
    Ok(edits)
}
