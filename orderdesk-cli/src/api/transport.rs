//! Transport seam for the spreadsheet-backed store
//!
//! The sync engine talks to the remote store only through [`RowTransport`]:
//! one batched write, one batched read-back, and the row fetch used to build
//! a baseline. The HTTP client implements it for real; tests script it.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::sync::columns::RemoteAddress;
use crate::sync::record::NaturalKey;
use crate::sync::value::{CellValue, EditableField};

/// One cell update inside a batched write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub natural_key: NaturalKey,
    pub field: EditableField,
    pub value: CellValue,
    pub address: RemoteAddress,
}

/// A batched write covering all dispatched cells in a single round trip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub updates: Vec<CellUpdate>,
}

/// Per-cell acknowledgment: accepted for write, not durably correct.
/// Durability is established only by the verification read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteAck {
    pub natural_key: NaturalKey,
    pub field: EditableField,
    pub value: CellValue,
    pub address: RemoteAddress,
}

/// Per-cell write error reported by the remote API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFailure {
    pub natural_key: NaturalKey,
    pub field: EditableField,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchUpdateResponse {
    pub succeeded: Vec<WriteAck>,
    pub failed: Vec<WriteFailure>,
}

/// One cell to re-read during verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellCheck {
    pub natural_key: NaturalKey,
    pub field: EditableField,
    pub address: RemoteAddress,
    pub expected: CellValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReadRequest {
    pub checks: Vec<CellCheck>,
}

/// The raw content of one re-read cell; `None` for an empty cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadBack {
    pub natural_key: NaturalKey,
    pub field: EditableField,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReadResponse {
    pub reads: Vec<ReadBack>,
}

/// One sheet row as fetched, cells still raw text
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub row: u32,
    pub order_no: String,
    pub barcode: String,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub delivery_status: Option<String>,
    pub import_qty: Option<String>,
    pub cancel_qty: Option<String>,
    pub note: Option<String>,
}

/// Batched read/write access to one spreadsheet tab
#[async_trait]
pub trait RowTransport: Send + Sync {
    /// Fetch all order rows from a tab (the load path)
    async fn fetch_rows(&self, tab: &str) -> Result<Vec<RawRow>>;

    /// Submit one batched write. An `Err` is a transport-level failure; the
    /// caller assumes nothing about any cell in that case.
    async fn batch_update(&self, request: BatchUpdateRequest) -> Result<BatchUpdateResponse>;

    /// Re-read the given cells. Responses must cover every check; a missing
    /// cell reads back as `None`.
    async fn batch_read(&self, request: BatchReadRequest) -> Result<BatchReadResponse>;
}
