//! Normalized cell values and the editable field set
//!
//! Every comparison in the sync engine (dirtiness, verification) happens on
//! normalized values, never on raw user or remote text. The rules:
//! - empty / whitespace-only input is `Null` for every field kind
//! - quantity fields parse numeric text by value, so `"05"` and `"5"` are equal
//! - `0` is a real quantity, distinct from `Null`

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// How a field's raw text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole-number quantity (import/cancel counts)
    Quantity,
    /// Free text (operator notes)
    Text,
}

/// The fields an operator may edit and push back to the sheet
///
/// Everything else on an order row (product name, image, delivery status) is
/// read-only context and never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    ImportQty,
    CancelQty,
    Note,
}

impl EditableField {
    /// All editable fields, in display/wire order
    pub const ALL: [EditableField; 3] = [Self::ImportQty, Self::CancelQty, Self::Note];

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::ImportQty | Self::CancelQty => FieldKind::Quantity,
            Self::Note => FieldKind::Text,
        }
    }

    /// Wire/CSV name for this field
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::ImportQty => "import_qty",
            Self::CancelQty => "cancel_qty",
            Self::Note => "note",
        }
    }

    /// Parse a wire/CSV field name
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim() {
            "import_qty" => Ok(Self::ImportQty),
            "cancel_qty" => Ok(Self::CancelQty),
            "note" => Ok(Self::Note),
            other => bail!(
                "unknown field '{}' (supported: import_qty, cancel_qty, note)",
                other
            ),
        }
    }
}

impl std::fmt::Display for EditableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// A normalized cell value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Text(String),
}

impl CellValue {
    /// Try to get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Strictly parse raw edit input under the field kind.
    ///
    /// Blank input (empty or whitespace-only) is `Null` regardless of kind.
    /// Quantity fields require a whole number; anything else is an error so a
    /// mistyped edit is rejected instead of silently coerced.
    pub fn from_edit(kind: FieldKind, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(CellValue::Null);
        }
        match kind {
            FieldKind::Quantity => match trimmed.parse::<i64>() {
                Ok(n) => Ok(CellValue::Int(n)),
                Err(_) => bail!("'{}' is not a whole number", raw),
            },
            FieldKind::Text => Ok(CellValue::Text(raw.to_string())),
        }
    }

    /// Leniently normalize a remote read-back under the field kind.
    ///
    /// The remote store hands everything back as text. Values that do not
    /// parse under the field kind are kept verbatim as text so a verification
    /// mismatch can show the operator exactly what the cell holds.
    pub fn from_remote(kind: FieldKind, raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return CellValue::Null;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match kind {
            FieldKind::Quantity => match trimmed.parse::<i64>() {
                Ok(n) => CellValue::Int(n),
                Err(_) => CellValue::Text(raw.to_string()),
            },
            FieldKind::Text => CellValue::Text(raw.to_string()),
        }
    }

    /// Lift an already-parsed optional quantity into a value
    pub fn from_qty(qty: Option<i64>) -> Self {
        match qty {
            Some(n) => CellValue::Int(n),
            None => CellValue::Null,
        }
    }

    /// Lift an optional text field into a value, applying empty≡null
    pub fn from_text(text: Option<&str>) -> Self {
        match text {
            Some(s) if !s.trim().is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Null,
        }
    }

    /// Raw text form for the remote write payload (`Null` writes a blank)
    pub fn to_wire(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "(blank)"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_edit_is_null_for_both_kinds() {
        assert_eq!(
            CellValue::from_edit(FieldKind::Quantity, "").unwrap(),
            CellValue::Null
        );
        assert_eq!(
            CellValue::from_edit(FieldKind::Quantity, "   ").unwrap(),
            CellValue::Null
        );
        assert_eq!(
            CellValue::from_edit(FieldKind::Text, "").unwrap(),
            CellValue::Null
        );
    }

    #[test]
    fn test_quantity_parses_by_value() {
        assert_eq!(
            CellValue::from_edit(FieldKind::Quantity, "05").unwrap(),
            CellValue::Int(5)
        );
        assert_eq!(
            CellValue::from_edit(FieldKind::Quantity, " 5 ").unwrap(),
            CellValue::Int(5)
        );
    }

    #[test]
    fn test_zero_is_not_null() {
        let zero = CellValue::from_edit(FieldKind::Quantity, "0").unwrap();
        assert_eq!(zero, CellValue::Int(0));
        assert_ne!(zero, CellValue::Null);
    }

    #[test]
    fn test_garbage_quantity_is_rejected() {
        assert!(CellValue::from_edit(FieldKind::Quantity, "abc").is_err());
        assert!(CellValue::from_edit(FieldKind::Quantity, "3.5").is_err());
    }

    #[test]
    fn test_remote_readback_is_lenient() {
        assert_eq!(
            CellValue::from_remote(FieldKind::Quantity, Some("5")),
            CellValue::Int(5)
        );
        assert_eq!(CellValue::from_remote(FieldKind::Quantity, None), CellValue::Null);
        assert_eq!(CellValue::from_remote(FieldKind::Quantity, Some(" ")), CellValue::Null);
        // unparseable content survives verbatim for mismatch display
        assert_eq!(
            CellValue::from_remote(FieldKind::Quantity, Some("n/a")),
            CellValue::Text("n/a".to_string())
        );
    }

    #[test]
    fn test_field_name_round_trip() {
        for field in EditableField::ALL {
            assert_eq!(EditableField::parse(field.wire_name()).unwrap(), field);
        }
        assert!(EditableField::parse("delivery_status").is_err());
    }
}
