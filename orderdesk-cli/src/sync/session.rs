//! Editing session: owned state plus the commit orchestration
//!
//! One session owns one baseline snapshot, its diff tracker, the ready set,
//! and the coalescing stage. Commit runs the write, the verification read,
//! and the reconcile strictly in that order; the verification targets only
//! the cells the write reported as accepted. One commit at a time, and no
//! reload while one is in flight.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use chrono::Utc;

use crate::api::transport::RowTransport;

use super::baseline::BaselineSnapshot;
use super::columns::ColumnMap;
use super::debounce::EditCoalescer;
use super::dispatch::dispatch;
use super::ready::{ReadyItem, ReadySet};
use super::reconcile::{CommitReport, reconcile};
use super::record::NaturalKey;
use super::tracker::{DiffTracker, EditOutcome};
use super::value::EditableField;
use super::verify::verify;

pub struct EditSession {
    baseline: BaselineSnapshot,
    tracker: DiffTracker,
    ready: ReadySet,
    coalescer: EditCoalescer,
    columns: ColumnMap,
    commit_in_flight: bool,
}

impl EditSession {
    pub fn new(baseline: BaselineSnapshot, columns: ColumnMap) -> Self {
        Self {
            baseline,
            tracker: DiffTracker::new(),
            ready: ReadySet::new(),
            coalescer: EditCoalescer::default(),
            columns,
            commit_in_flight: false,
        }
    }

    pub fn baseline(&self) -> &BaselineSnapshot {
        &self.baseline
    }

    /// Commit one edit directly to the tracker (bypassing the coalescer)
    pub fn record_edit(
        &mut self,
        key: &NaturalKey,
        field: EditableField,
        raw: &str,
    ) -> Result<EditOutcome> {
        let outcome = self.tracker.record_edit(&self.baseline, key, field, raw)?;
        self.ready.rebuild(&self.baseline, &self.tracker);
        Ok(outcome)
    }

    /// Buffer a keystroke in the coalescing stage
    pub fn queue_edit(&mut self, key: NaturalKey, field: EditableField, raw: &str, now: Instant) {
        self.coalescer.push(key, field, raw, now);
    }

    /// Apply buffered edits whose quiet period has elapsed
    pub fn poll_edits(&mut self, now: Instant) -> Result<()> {
        for edit in self.coalescer.due(now) {
            self.tracker
                .record_edit(&self.baseline, &edit.key, edit.field, &edit.raw)?;
        }
        self.ready.rebuild(&self.baseline, &self.tracker);
        Ok(())
    }

    /// Drain every buffered edit into the tracker, regardless of deadline
    pub fn flush_edits(&mut self) -> Result<()> {
        for edit in self.coalescer.flush_all() {
            self.tracker
                .record_edit(&self.baseline, &edit.key, edit.field, &edit.raw)?;
        }
        self.ready.rebuild(&self.baseline, &self.tracker);
        Ok(())
    }

    pub fn ready_items(&self) -> &[ReadyItem] {
        self.ready.items()
    }

    pub fn set_delta_override(&mut self, key: &NaturalKey, delta: i64) -> bool {
        self.ready.set_delta_override(key, delta)
    }

    pub fn dirty_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn has_changes(&self) -> bool {
        !self.tracker.is_empty() || !self.coalescer.is_empty()
    }

    pub fn is_commit_in_flight(&self) -> bool {
        self.commit_in_flight
    }

    /// Push the dirty set to the remote store and reconcile the outcome.
    ///
    /// Sequential two-step: the batch write must fully resolve before the
    /// verification read starts. Per-cell failures never abort the commit;
    /// the one precondition that does is a missing target tab, which aborts
    /// before any network call.
    pub async fn commit(
        &mut self,
        transport: &dyn RowTransport,
        timeout: Duration,
    ) -> Result<CommitReport> {
        if self.commit_in_flight {
            bail!("a commit is already in flight for this session");
        }
        if self.baseline.tab().trim().is_empty() {
            bail!("no target tab selected");
        }
        self.flush_edits()?;

        self.commit_in_flight = true;
        let result = self.commit_inner(transport, timeout).await;
        self.commit_in_flight = false;

        self.ready.rebuild(&self.baseline, &self.tracker);
        result
    }

    async fn commit_inner(
        &mut self,
        transport: &dyn RowTransport,
        timeout: Duration,
    ) -> Result<CommitReport> {
        let started_at = Utc::now();
        let cells = self.tracker.dirty_cells();
        log::info!("commit started: {} dirty cell(s)", cells.len());

        let outcome = dispatch(transport, &self.baseline, &self.columns, cells, timeout).await;

        // verification covers exactly the accepted cells; a read failure
        // keeps all of them dirty (no partial credit)
        let verified = match verify(transport, outcome.accepted.clone(), timeout).await {
            Ok(verified) => verified,
            Err(err) => {
                log::error!("verification pass failed: {:#}", err);
                let mut rejected = outcome.rejected;
                rejected.extend(outcome.accepted.into_iter().map(|a| {
                    super::dispatch::RejectedCell {
                        cell: a.cell,
                        kind: super::dispatch::WriteErrorKind::TransportError,
                        reason: format!("verification failed: {:#}", err),
                    }
                }));
                return Ok(reconcile(
                    &mut self.tracker,
                    started_at,
                    rejected,
                    super::verify::VerifyOutcome::default(),
                ));
            }
        };

        Ok(reconcile(
            &mut self.tracker,
            started_at,
            outcome.rejected,
            verified,
        ))
    }

    /// Replace the baseline wholesale. All pending state is invalidated:
    /// dirty cells, ready items, delta overrides, buffered keystrokes.
    pub fn reload(&mut self, baseline: BaselineSnapshot) -> Result<()> {
        if self.commit_in_flight {
            bail!("cannot reload while a commit is in flight");
        }
        self.baseline = baseline;
        self.tracker.clear_all();
        self.coalescer.flush_all();
        self.ready.reset();
        log::info!("session reloaded: {} rows", self.baseline.len());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_commit_in_flight(&mut self, in_flight: bool) {
        self.commit_in_flight = in_flight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::record::OrderRecord;
    use crate::sync::testing::ScriptedTransport;
    use crate::sync::value::CellValue;

    fn baseline() -> BaselineSnapshot {
        BaselineSnapshot::from_records(
            "Orders",
            vec![OrderRecord {
                order_no: "SO-1".to_string(),
                barcode: "A".to_string(),
                row: 2,
                product_name: None,
                image_url: None,
                delivery_status: None,
                import_qty: Some(2),
                cancel_qty: None,
                note: None,
            }],
        )
        .unwrap()
    }

    fn key() -> NaturalKey {
        NaturalKey::from_parts("SO-1", "A").unwrap()
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_round_trip_leaves_session_clean() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();
        assert_eq!(session.ready_items().len(), 1);
        assert_eq!(session.ready_items()[0].delta_qty, 3);

        let transport = ScriptedTransport::ack_all();
        let report = session.commit(&transport, TIMEOUT).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(session.dirty_count(), 0);
        assert!(session.ready_items().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejected_while_in_flight() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();
        session.set_commit_in_flight(true);

        let transport = ScriptedTransport::ack_all();
        assert!(session.commit(&transport, TIMEOUT).await.is_err());
        // nothing was sent
        assert!(transport.update_requests().is_empty());
    }

    #[tokio::test]
    async fn test_reload_rejected_while_in_flight() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.set_commit_in_flight(true);
        assert!(session.reload(baseline()).is_err());

        session.set_commit_in_flight(false);
        assert!(session.reload(baseline()).is_ok());
    }

    #[tokio::test]
    async fn test_reload_clears_all_pending_state() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();
        session.set_delta_override(&key(), 9);
        session.queue_edit(key(), EditableField::Note, "buffered", Instant::now());

        session.reload(baseline()).unwrap();
        assert_eq!(session.dirty_count(), 0);
        assert!(!session.has_changes());

        // the override did not survive the reload
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();
        assert_eq!(session.ready_items()[0].delta_override, None);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_cells_dirty_with_precommit_values() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();

        let transport = ScriptedTransport::write_error("socket closed");
        let report = session.commit(&transport, TIMEOUT).await.unwrap();

        assert_eq!(report.failed_count, 1);
        assert_eq!(session.dirty_count(), 1);
        assert_eq!(session.ready_items().len(), 1);
        assert_eq!(
            session.ready_items()[0].changes[&EditableField::ImportQty],
            CellValue::Int(5)
        );
    }

    #[tokio::test]
    async fn test_verify_failure_gives_no_partial_credit() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();

        let transport = ScriptedTransport::read_error("quota exceeded");
        let report = session.commit(&transport, TIMEOUT).await.unwrap();

        assert_eq!(report.confirmed_count, 0);
        assert_eq!(report.failed_count, 1);
        assert_eq!(session.dirty_count(), 1);
        assert!(!session.is_commit_in_flight());
    }

    #[tokio::test]
    async fn test_poll_applies_only_due_edits() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        let t0 = Instant::now();
        session.queue_edit(key(), EditableField::ImportQty, "5", t0);

        // quiet period has not elapsed
        session.poll_edits(t0).unwrap();
        assert_eq!(session.dirty_count(), 0);

        session.poll_edits(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(session.dirty_count(), 1);
        assert_eq!(session.ready_items().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_flushes_buffered_edits_first() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.queue_edit(key(), EditableField::ImportQty, "5", Instant::now());
        assert_eq!(session.dirty_count(), 0);

        let transport = ScriptedTransport::ack_all();
        let report = session.commit(&transport, TIMEOUT).await.unwrap();
        assert_eq!(report.confirmed_count, 1);
    }

    #[tokio::test]
    async fn test_write_and_verify_are_sequential() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        session.record_edit(&key(), EditableField::ImportQty, "5").unwrap();

        let transport = ScriptedTransport::ack_all();
        session.commit(&transport, TIMEOUT).await.unwrap();

        // one write round trip, one read round trip, covering the same cell
        let writes = transport.update_requests();
        let reads = transport.read_requests();
        assert_eq!(writes.len(), 1);
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].checks.len(), writes[0].updates.len());
        assert_eq!(reads[0].checks[0].address, writes[0].updates[0].address);
    }

    #[tokio::test]
    async fn test_empty_commit_is_a_clean_noop() {
        let mut session = EditSession::new(baseline(), ColumnMap::default());
        let transport = ScriptedTransport::ack_all();
        let report = session.commit(&transport, TIMEOUT).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.confirmed_count, 0);
        assert!(transport.update_requests().is_empty());
    }
}
