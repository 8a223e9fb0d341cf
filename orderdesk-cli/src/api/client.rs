//! HTTP transport against a Sheets-style values API
//!
//! The store exposes three endpoints: a whole-tab read (the load path), a
//! batched range read, and a batched range write. The write's HTTP success
//! only means the batch was accepted — per-cell durability is the
//! verification pass's job, not ours.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::sync::columns::ColumnMap;
use crate::sync::value::EditableField;

use super::transport::{
    BatchReadRequest, BatchReadResponse, BatchUpdateRequest, BatchUpdateResponse, RawRow, ReadBack,
    RowTransport, WriteAck,
};

/// Fixed context-column layout of an order tab (0-based)
const COL_ORDER_NO: usize = 0;
const COL_BARCODE: usize = 1;
const COL_PRODUCT_NAME: usize = 2;
const COL_IMAGE_URL: usize = 3;
const COL_DELIVERY_STATUS: usize = 4;

/// First data row; row 1 is the header
const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(rename = "valueRanges", default)]
    value_ranges: Vec<ValueRange>,
}

/// Convert a column letter to a 0-based index ("A" → 0, "AA" → 26)
fn column_index(letters: &str) -> Result<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        bail!("invalid column letters '{}'", letters);
    }
    let mut index = 0usize;
    for c in letters.chars() {
        index = index * 26 + (c as usize - 'A' as usize + 1);
    }
    Ok(index - 1)
}

pub struct SheetClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    api_key: String,
    columns: ColumnMap,
}

impl SheetClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        api_key: impl Into<String>,
        columns: ColumnMap,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
            columns,
        })
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values{}",
            self.base_url, self.spreadsheet_id, suffix
        )
    }

    fn cell(row: &[String], index: usize) -> Option<String> {
        row.get(index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn editable_cell(&self, row: &[String], field: EditableField) -> Result<Option<String>> {
        match self.columns.column(field) {
            Some(letters) => Ok(Self::cell(row, column_index(letters)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RowTransport for SheetClient {
    async fn fetch_rows(&self, tab: &str) -> Result<Vec<RawRow>> {
        let url = self.values_url(&format!("/{}", urlencoding::encode(tab)));
        log::debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to fetch rows")?
            .error_for_status()
            .context("row fetch was rejected by the remote store")?;
        let range: ValueRange = response
            .json()
            .await
            .context("failed to decode row fetch response")?;

        let mut rows = Vec::new();
        for (offset, cells) in range.values.iter().skip(1).enumerate() {
            let row_number = FIRST_DATA_ROW + offset as u32;
            let Some(order_no) = Self::cell(cells, COL_ORDER_NO) else {
                continue;
            };
            let Some(barcode) = Self::cell(cells, COL_BARCODE) else {
                log::warn!("row {}: order number without barcode, skipped", row_number);
                continue;
            };
            rows.push(RawRow {
                row: row_number,
                order_no,
                barcode,
                product_name: Self::cell(cells, COL_PRODUCT_NAME),
                image_url: Self::cell(cells, COL_IMAGE_URL),
                delivery_status: Self::cell(cells, COL_DELIVERY_STATUS),
                import_qty: self.editable_cell(cells, EditableField::ImportQty)?,
                cancel_qty: self.editable_cell(cells, EditableField::CancelQty)?,
                note: self.editable_cell(cells, EditableField::Note)?,
            });
        }
        log::info!("fetched {} order row(s) from tab '{}'", rows.len(), tab);
        Ok(rows)
    }

    async fn batch_update(&self, request: BatchUpdateRequest) -> Result<BatchUpdateResponse> {
        let data: Vec<serde_json::Value> = request
            .updates
            .iter()
            .map(|u| {
                json!({
                    "range": u.address.a1(),
                    "values": [[u.value.to_wire()]],
                })
            })
            .collect();
        let body = json!({
            "valueInputOption": "RAW",
            "data": data,
        });

        let url = self.values_url(":batchUpdate");
        log::debug!("POST {} ({} ranges)", url, request.updates.len());
        self.http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("batch write failed")?
            .error_for_status()
            .context("batch write was rejected by the remote store")?;

        // the values API applies a batch all-or-nothing at the HTTP level, so
        // a 2xx acknowledges every range; per-cell verification happens later
        Ok(BatchUpdateResponse {
            succeeded: request
                .updates
                .into_iter()
                .map(|u| WriteAck {
                    natural_key: u.natural_key,
                    field: u.field,
                    value: u.value,
                    address: u.address,
                })
                .collect(),
            failed: Vec::new(),
        })
    }

    async fn batch_read(&self, request: BatchReadRequest) -> Result<BatchReadResponse> {
        let ranges: Vec<String> = request
            .checks
            .iter()
            .map(|c| format!("ranges={}", urlencoding::encode(&c.address.a1())))
            .collect();
        let url = format!("{}?{}", self.values_url(":batchGet"), ranges.join("&"));
        log::debug!("GET {} ({} ranges)", url, request.checks.len());

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("verification read failed")?
            .error_for_status()
            .context("verification read was rejected by the remote store")?;
        let batch: BatchGetResponse = response
            .json()
            .await
            .context("failed to decode verification read response")?;

        if batch.value_ranges.len() != request.checks.len() {
            bail!(
                "verification read returned {} ranges for {} checks",
                batch.value_ranges.len(),
                request.checks.len()
            );
        }

        let reads = request
            .checks
            .into_iter()
            .zip(batch.value_ranges)
            .map(|(check, range)| {
                let raw = range
                    .values
                    .first()
                    .and_then(|row| row.first())
                    .map(|s| s.to_string());
                ReadBack {
                    natural_key: check.natural_key,
                    field: check.field,
                    raw,
                }
            })
            .collect();
        Ok(BatchReadResponse { reads })
    }
}
