//! Field-to-column mapping and A1-style remote addresses
//!
//! Writes are addressed through this table and nowhere else: a field without
//! an entry never reaches the transport layer.

use std::collections::HashMap;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::value::EditableField;

/// Default sheet layout: import qty in N, cancel qty in O, note in R
const DEFAULT_COLUMNS: [(EditableField, &str); 3] = [
    (EditableField::ImportQty, "N"),
    (EditableField::CancelQty, "O"),
    (EditableField::Note, "R"),
];

/// A single cell's address on the remote sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAddress {
    pub tab: String,
    pub column: String,
    pub row: u32,
}

impl RemoteAddress {
    /// A1-style range string, quoting the tab name when it needs it
    pub fn a1(&self) -> String {
        let needs_quotes = !self.tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if needs_quotes {
            format!("'{}'!{}{}", self.tab.replace('\'', "''"), self.column, self.row)
        } else {
            format!("{}!{}{}", self.tab, self.column, self.row)
        }
    }
}

impl std::fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.a1())
    }
}

/// Field → column-letter table.
///
/// The default covers every editable field. A profile may override it with a
/// sparse table; fields it omits become unsupported and are rejected before
/// any network call.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    columns: HashMap<EditableField, String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS
                .iter()
                .map(|(f, c)| (*f, (*c).to_string()))
                .collect(),
        }
    }
}

impl ColumnMap {
    /// Build from a profile's `[columns]` override table
    pub fn from_overrides(overrides: &HashMap<String, String>) -> Result<Self> {
        let mut columns = HashMap::new();
        for (name, column) in overrides {
            let field = EditableField::parse(name)?;
            let column = column.trim().to_ascii_uppercase();
            if column.is_empty() || !column.chars().all(|c| c.is_ascii_uppercase()) {
                bail!("invalid column letter '{}' for field '{}'", column, name);
            }
            columns.insert(field, column);
        }
        if columns.is_empty() {
            bail!("column override table is empty");
        }
        Ok(Self { columns })
    }

    /// Column letter for a field, if mapped
    pub fn column(&self, field: EditableField) -> Option<&str> {
        self.columns.get(&field).map(|s| s.as_str())
    }

    /// Resolve a field edit on a given row to its remote address
    pub fn resolve(&self, tab: &str, field: EditableField, row: u32) -> Option<RemoteAddress> {
        self.column(field).map(|column| RemoteAddress {
            tab: tab.to_string(),
            column: column.to_string(),
            row,
        })
    }
}
