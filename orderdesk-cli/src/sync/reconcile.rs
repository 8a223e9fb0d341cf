//! Reconciler: fold write and verify outcomes back into the tracker
//!
//! Confirmed cells are cleared; everything else stays dirty for a manual
//! retry. A mismatched cell is pinned back to the value the commit intended,
//! never to the value the sheet happened to hold, so a retry resends the
//! same intent. Every dirty cell that entered the commit is accounted for in
//! the report exactly once.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::dispatch::{RejectedCell, WriteErrorKind};
use super::record::NaturalKey;
use super::tracker::DiffTracker;
use super::value::{CellValue, EditableField};
use super::verify::VerifyOutcome;

/// A cell that write-confirmed and verify-confirmed
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedDetail {
    pub key: NaturalKey,
    pub field: EditableField,
    pub value: CellValue,
}

/// A cell that never landed: not sent, or sent and errored
#[derive(Debug, Clone, Serialize)]
pub struct FailedDetail {
    pub key: NaturalKey,
    pub field: EditableField,
    pub kind: WriteErrorKind,
    pub reason: String,
}

/// A cell whose read-back disagreed with the written value
#[derive(Debug, Clone, Serialize)]
pub struct MismatchDetail {
    pub key: NaturalKey,
    pub field: EditableField,
    pub expected: CellValue,
    pub actual: CellValue,
}

/// Structured result of one commit attempt, for user-facing reporting
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    pub started_at: DateTime<Utc>,
    pub confirmed_count: usize,
    pub failed_count: usize,
    pub mismatch_count: usize,
    pub confirmed: Vec<ConfirmedDetail>,
    pub failed: Vec<FailedDetail>,
    pub mismatches: Vec<MismatchDetail>,
}

impl CommitReport {
    /// True when every dirty cell was confirmed durable
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0 && self.mismatch_count == 0
    }

    /// Cells that remain dirty after this commit
    pub fn unconfirmed_count(&self) -> usize {
        self.failed_count + self.mismatch_count
    }
}

/// Merge dispatch and verification outcomes into the tracker and produce the
/// commit report. `rejected` is the dispatcher's rejected set; the accepted
/// set arrives through `verify`, partitioned into matches and mismatches.
pub fn reconcile(
    tracker: &mut DiffTracker,
    started_at: DateTime<Utc>,
    rejected: Vec<RejectedCell>,
    verify: VerifyOutcome,
) -> CommitReport {
    let before = tracker.len();

    let mut confirmed = Vec::with_capacity(verify.matches.len());
    for accepted in verify.matches {
        tracker.clear(&accepted.cell.key, accepted.cell.field);
        confirmed.push(ConfirmedDetail {
            key: accepted.cell.key,
            field: accepted.cell.field,
            value: accepted.cell.pending,
        });
    }

    let mut mismatches = Vec::with_capacity(verify.mismatches.len());
    for mismatch in verify.mismatches {
        // pin the slot back to the intended value; the sheet's actual value
        // is report-only
        tracker.force_pending(&mismatch.key, mismatch.field, mismatch.expected.clone());
        mismatches.push(MismatchDetail {
            key: mismatch.key,
            field: mismatch.field,
            expected: mismatch.expected,
            actual: mismatch.actual,
        });
    }

    // rejected cells were never cleared, so they are still dirty as-is
    let failed: Vec<FailedDetail> = rejected
        .into_iter()
        .map(|r| FailedDetail {
            key: r.cell.key,
            field: r.cell.field,
            kind: r.kind,
            reason: r.reason,
        })
        .collect();

    let report = CommitReport {
        started_at,
        confirmed_count: confirmed.len(),
        failed_count: failed.len(),
        mismatch_count: mismatches.len(),
        confirmed,
        failed,
        mismatches,
    };

    // every cell that entered the commit has exactly one fate
    debug_assert_eq!(
        before,
        report.confirmed_count + report.failed_count + report.mismatch_count,
        "commit accounting does not cover the dirty set"
    );

    log::info!(
        "commit reconciled: {} confirmed, {} failed, {} mismatched",
        report.confirmed_count,
        report.failed_count,
        report.mismatch_count
    );
    report
}
