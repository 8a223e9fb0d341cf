//! Batch write dispatcher
//!
//! Turns the tracker's dirty cells into a single batched write and classifies
//! every cell's outcome. Cells without a column mapping are rejected locally
//! and never reach the transport; a transport-level failure (network, auth,
//! timeout) fails every submitted cell, because a hard failure carries no
//! partial knowledge.

use std::time::Duration;

use serde::Serialize;

use crate::api::transport::{BatchUpdateRequest, CellUpdate, RowTransport};

use super::baseline::BaselineSnapshot;
use super::columns::{ColumnMap, RemoteAddress};
use super::tracker::DirtyCell;

/// Why a cell did not make it through the write phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteErrorKind {
    /// No column mapping entry; never sent. A local/config fix.
    UnsupportedField,
    /// Network/auth/remote failure during the write; retryable by
    /// re-issuing a commit.
    TransportError,
}

/// A cell the remote store accepted for write
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedCell {
    pub cell: DirtyCell,
    pub address: RemoteAddress,
}

/// A cell that was not accepted, with the classification the report needs to
/// distinguish "not sent" from "sent but errored"
#[derive(Debug, Clone, Serialize)]
pub struct RejectedCell {
    pub cell: DirtyCell,
    pub kind: WriteErrorKind,
    pub reason: String,
}

/// Outcome of the write phase, covering every input cell exactly once
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchOutcome {
    pub accepted: Vec<AcceptedCell>,
    pub rejected: Vec<RejectedCell>,
}

/// Resolve, batch, submit, classify.
pub async fn dispatch(
    transport: &dyn RowTransport,
    baseline: &BaselineSnapshot,
    columns: &ColumnMap,
    cells: Vec<DirtyCell>,
    timeout: Duration,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let mut updates: Vec<CellUpdate> = Vec::with_capacity(cells.len());
    let mut submitted: Vec<(DirtyCell, RemoteAddress)> = Vec::with_capacity(cells.len());

    for cell in cells {
        let Some(row) = baseline.row(&cell.key) else {
            // tracker contents always come from the baseline, so this is a
            // programming error rather than a user-facing condition
            outcome.rejected.push(RejectedCell {
                reason: format!("no baseline row for '{}'", cell.key),
                cell,
                kind: WriteErrorKind::UnsupportedField,
            });
            continue;
        };
        match columns.resolve(baseline.tab(), cell.field, row) {
            Some(address) => {
                updates.push(CellUpdate {
                    natural_key: cell.key.clone(),
                    field: cell.field,
                    value: cell.pending.clone(),
                    address: address.clone(),
                });
                submitted.push((cell, address));
            }
            None => {
                log::warn!("{} {}: no column mapping, not sent", cell.key, cell.field);
                outcome.rejected.push(RejectedCell {
                    reason: format!("field '{}' has no column mapping", cell.field),
                    cell,
                    kind: WriteErrorKind::UnsupportedField,
                });
            }
        }
    }

    if submitted.is_empty() {
        return outcome;
    }

    log::info!("dispatching batch write: {} cell(s)", submitted.len());
    let request = BatchUpdateRequest { updates };
    let response = tokio::time::timeout(timeout, transport.batch_update(request)).await;

    let response = match response {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            log::error!("batch write failed: {:#}", err);
            fail_all(&mut outcome, submitted, format!("{:#}", err));
            return outcome;
        }
        Err(_) => {
            log::error!("batch write timed out after {:?}", timeout);
            fail_all(
                &mut outcome,
                submitted,
                format!("write timed out after {:?}", timeout),
            );
            return outcome;
        }
    };

    // classify each submitted cell from the per-cell response
    for (cell, address) in submitted {
        let acked = response
            .succeeded
            .iter()
            .any(|ack| ack.natural_key == cell.key && ack.field == cell.field);
        if acked {
            outcome.accepted.push(AcceptedCell { cell, address });
            continue;
        }
        let reason = response
            .failed
            .iter()
            .find(|f| f.natural_key == cell.key && f.field == cell.field)
            .map(|f| f.reason.clone())
            .unwrap_or_else(|| "not acknowledged by remote".to_string());
        log::warn!("{} {}: write rejected: {}", cell.key, cell.field, reason);
        outcome.rejected.push(RejectedCell {
            cell,
            kind: WriteErrorKind::TransportError,
            reason,
        });
    }

    outcome
}

fn fail_all(
    outcome: &mut DispatchOutcome,
    submitted: Vec<(DirtyCell, RemoteAddress)>,
    reason: String,
) {
    for (cell, _) in submitted {
        outcome.rejected.push(RejectedCell {
            cell,
            kind: WriteErrorKind::TransportError,
            reason: reason.clone(),
        });
    }
}
