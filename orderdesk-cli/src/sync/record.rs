//! Order line records and natural-key derivation

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::value::{CellValue, EditableField};

/// Separator between order number and barcode in a natural key.
/// Must not appear in either part; `from_parts` enforces this.
pub const KEY_SEPARATOR: char = '|';

/// Stable identifier for an order line, derived from the row's own fields
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalKey(String);

impl NaturalKey {
    /// Build a key from order number and barcode
    pub fn from_parts(order_no: &str, barcode: &str) -> Result<Self> {
        let order_no = order_no.trim();
        let barcode = barcode.trim();
        if order_no.is_empty() || barcode.is_empty() {
            bail!("natural key requires both order number and barcode");
        }
        if order_no.contains(KEY_SEPARATOR) || barcode.contains(KEY_SEPARATOR) {
            bail!(
                "order number and barcode must not contain '{}' (got '{}' / '{}')",
                KEY_SEPARATOR,
                order_no,
                barcode
            );
        }
        Ok(Self(format!("{}{}{}", order_no, KEY_SEPARATOR, barcode)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One order line as loaded from the sheet.
///
/// `import_qty`, `cancel_qty` and `note` are the editable fields; the rest is
/// read-only context shown to the operator and never written back. `row` is
/// the 1-based sheet row captured at load time, used for remote addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_no: String,
    pub barcode: String,
    pub row: u32,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub delivery_status: Option<String>,
    pub import_qty: Option<i64>,
    pub cancel_qty: Option<i64>,
    pub note: Option<String>,
}

impl OrderRecord {
    pub fn natural_key(&self) -> Result<NaturalKey> {
        NaturalKey::from_parts(&self.order_no, &self.barcode)
    }

    /// The normalized baseline value of an editable field
    pub fn value(&self, field: EditableField) -> CellValue {
        match field {
            EditableField::ImportQty => CellValue::from_qty(self.import_qty),
            EditableField::CancelQty => CellValue::from_qty(self.cancel_qty),
            EditableField::Note => CellValue::from_text(self.note.as_deref()),
        }
    }
}
