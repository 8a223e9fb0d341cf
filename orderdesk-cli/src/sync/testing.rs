//! Scripted in-memory transport for engine tests

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::api::transport::{
    BatchReadRequest, BatchReadResponse, BatchUpdateRequest, BatchUpdateResponse, RawRow, ReadBack,
    RowTransport, WriteAck, WriteFailure,
};

use super::columns::ColumnMap;
use super::dispatch::AcceptedCell;
use super::record::NaturalKey;
use super::tracker::DirtyCell;
use super::value::{CellValue, EditableField};

enum WriteScript {
    AckAll,
    AckExcept(Vec<(NaturalKey, EditableField, String)>),
    Error(String),
}

enum ReadScript {
    /// Read back exactly what the check expected (a clean write)
    Echo,
    /// Keyed by (natural key string, field); unlisted cells read back empty
    Values(Vec<(String, EditableField, Option<String>)>),
    Error(String),
}

/// Transport whose responses are programmed up front and whose requests are
/// captured for assertions.
pub struct ScriptedTransport {
    write: WriteScript,
    read: ReadScript,
    rows: Vec<RawRow>,
    update_requests: Mutex<Vec<BatchUpdateRequest>>,
    read_requests: Mutex<Vec<BatchReadRequest>>,
}

impl ScriptedTransport {
    fn new(write: WriteScript, read: ReadScript) -> Self {
        Self {
            write,
            read,
            rows: Vec::new(),
            update_requests: Mutex::new(Vec::new()),
            read_requests: Mutex::new(Vec::new()),
        }
    }

    /// Acknowledge every write; read back exactly what was written
    pub fn ack_all() -> Self {
        Self::new(WriteScript::AckAll, ReadScript::Echo)
    }

    /// Acknowledge all but the listed cells, which fail with the given reason
    pub fn ack_except(failures: Vec<(NaturalKey, EditableField, &str)>) -> Self {
        Self::new(
            WriteScript::AckExcept(
                failures
                    .into_iter()
                    .map(|(k, f, r)| (k, f, r.to_string()))
                    .collect(),
            ),
            ReadScript::Echo,
        )
    }

    /// Every write attempt fails at the transport level
    pub fn write_error(reason: &str) -> Self {
        Self::new(WriteScript::Error(reason.to_string()), ReadScript::Echo)
    }

    /// Acknowledge all writes; read back the scripted cell contents
    pub fn reads(values: Vec<(&str, EditableField, Option<&str>)>) -> Self {
        Self::new(
            WriteScript::AckAll,
            ReadScript::Values(
                values
                    .into_iter()
                    .map(|(k, f, v)| (k.to_string(), f, v.map(str::to_string)))
                    .collect(),
            ),
        )
    }

    /// Acknowledge all writes; every read attempt fails
    pub fn read_error(reason: &str) -> Self {
        Self::new(WriteScript::AckAll, ReadScript::Error(reason.to_string()))
    }

    /// Replace the read script with explicit cell contents (unlisted cells
    /// read back empty)
    pub fn with_reads(mut self, values: Vec<(&str, EditableField, Option<&str>)>) -> Self {
        self.read = ReadScript::Values(
            values
                .into_iter()
                .map(|(k, f, v)| (k.to_string(), f, v.map(str::to_string)))
                .collect(),
        );
        self
    }

    /// Rows returned by the load path
    pub fn with_rows(mut self, rows: Vec<RawRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn update_requests(&self) -> Vec<BatchUpdateRequest> {
        self.update_requests.lock().unwrap().clone()
    }

    pub fn read_requests(&self) -> Vec<BatchReadRequest> {
        self.read_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowTransport for ScriptedTransport {
    async fn fetch_rows(&self, _tab: &str) -> Result<Vec<RawRow>> {
        Ok(self.rows.clone())
    }

    async fn batch_update(&self, request: BatchUpdateRequest) -> Result<BatchUpdateResponse> {
        self.update_requests.lock().unwrap().push(request.clone());
        match &self.write {
            WriteScript::Error(reason) => bail!("{}", reason),
            WriteScript::AckAll => Ok(BatchUpdateResponse {
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
            }),
            WriteScript::AckExcept(failures) => {
                let mut response = BatchUpdateResponse::default();
                for update in request.updates {
                    match failures
                        .iter()
                        .find(|(k, f, _)| *k == update.natural_key && *f == update.field)
                    {
                        Some((_, _, reason)) => response.failed.push(WriteFailure {
                            natural_key: update.natural_key,
                            field: update.field,
                            reason: reason.clone(),
                        }),
                        None => response.succeeded.push(WriteAck {
                            natural_key: update.natural_key,
                            field: update.field,
                            value: update.value,
                            address: update.address,
                        }),
                    }
                }
                Ok(response)
            }
        }
    }

    async fn batch_read(&self, request: BatchReadRequest) -> Result<BatchReadResponse> {
        self.read_requests.lock().unwrap().push(request.clone());
        match &self.read {
            ReadScript::Error(reason) => bail!("{}", reason),
            ReadScript::Echo => {
                let reads = request
                    .checks
                    .into_iter()
                    .map(|check| {
                        let wire = check.expected.to_wire();
                        ReadBack {
                            natural_key: check.natural_key,
                            field: check.field,
                            raw: if wire.is_empty() { None } else { Some(wire) },
                        }
                    })
                    .collect();
                Ok(BatchReadResponse { reads })
            }
            ReadScript::Values(values) => {
                let reads = request
                    .checks
                    .into_iter()
                    .map(|check| {
                        let raw = values
                            .iter()
                            .find(|(k, f, _)| k == check.natural_key.as_str() && *f == check.field)
                            .and_then(|(_, _, raw)| raw.clone());
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
    }
}

/// Build an accepted cell with a default-column address, for verify tests
pub fn accepted_cell(
    order_no: &str,
    barcode: &str,
    field: EditableField,
    raw: &str,
    row: u32,
) -> AcceptedCell {
    let key = NaturalKey::from_parts(order_no, barcode).unwrap();
    let pending = CellValue::from_edit(field.kind(), raw).unwrap();
    let address = ColumnMap::default().resolve("Orders", field, row).unwrap();
    AcceptedCell {
        cell: DirtyCell {
            key,
            field,
            pending,
        },
        address,
    }
}
