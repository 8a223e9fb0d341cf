//! Verification pass: read back what the write claimed to land
//!
//! A batch-write acknowledgment only means "accepted"; the store can still
//! drop or transform the value. This pass re-reads exactly the accepted
//! cells, normalizes both sides with the same rules as edits, and partitions
//! the result. A transport failure here is an error for the whole pass — no
//! partial credit — and the caller keeps every accepted cell dirty.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::api::transport::{BatchReadRequest, CellCheck, RowTransport};

use super::columns::RemoteAddress;
use super::dispatch::AcceptedCell;
use super::record::NaturalKey;
use super::value::{CellValue, EditableField};

/// An accepted cell whose read-back differs from the value the commit wrote
#[derive(Debug, Clone, Serialize)]
pub struct Mismatch {
    pub key: NaturalKey,
    pub field: EditableField,
    pub address: RemoteAddress,
    pub expected: CellValue,
    pub actual: CellValue,
}

/// Outcome of one verification pass over the accepted cells
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyOutcome {
    pub all_match: bool,
    pub matches: Vec<AcceptedCell>,
    pub mismatches: Vec<Mismatch>,
}

/// Re-read the accepted cells and compare against the expected values.
pub async fn verify(
    transport: &dyn RowTransport,
    accepted: Vec<AcceptedCell>,
    timeout: Duration,
) -> Result<VerifyOutcome> {
    if accepted.is_empty() {
        return Ok(VerifyOutcome {
            all_match: true,
            ..VerifyOutcome::default()
        });
    }

    let checks: Vec<CellCheck> = accepted
        .iter()
        .map(|a| CellCheck {
            natural_key: a.cell.key.clone(),
            field: a.cell.field,
            address: a.address.clone(),
            expected: a.cell.pending.clone(),
        })
        .collect();

    log::info!("verifying {} written cell(s)", checks.len());
    let response = tokio::time::timeout(
        timeout,
        transport.batch_read(BatchReadRequest { checks }),
    )
    .await;
    let response = match response {
        Ok(result) => result.context("verification read failed")?,
        Err(_) => bail!("verification read timed out after {:?}", timeout),
    };

    let mut outcome = VerifyOutcome::default();
    for accepted_cell in accepted {
        let key = &accepted_cell.cell.key;
        let field = accepted_cell.cell.field;
        let raw = response
            .reads
            .iter()
            .find(|r| &r.natural_key == key && r.field == field)
            .and_then(|r| r.raw.as_deref());
        let actual = CellValue::from_remote(field.kind(), raw);

        if actual == accepted_cell.cell.pending {
            outcome.matches.push(accepted_cell);
        } else {
            log::warn!(
                "{} {}: expected '{}', sheet holds '{}'",
                key,
                field,
                accepted_cell.cell.pending,
                actual
            );
            outcome.mismatches.push(Mismatch {
                key: key.clone(),
                field,
                address: accepted_cell.address.clone(),
                expected: accepted_cell.cell.pending.clone(),
                actual,
            });
        }
    }
    outcome.all_match = outcome.mismatches.is_empty();
    Ok(outcome)
}
