//! Command handlers

pub mod columns;
pub mod push;
pub mod status;

use std::time::Instant;

use anyhow::{Context, Result};

use crate::api::transport::{RawRow, RowTransport};
use crate::api::SheetClient;
use crate::cli::edits::{Edit, EditAction};
use crate::config::Profile;
use crate::sync::baseline::BaselineSnapshot;
use crate::sync::record::OrderRecord;
use crate::sync::session::EditSession;

/// Build the HTTP transport from the profile
pub fn build_client(profile: &Profile) -> Result<SheetClient> {
    let api_key = profile.api_key()?;
    SheetClient::new(
        &profile.base_url,
        &profile.spreadsheet_id,
        api_key,
        profile.column_map()?,
    )
}

fn parse_qty(row: u32, field: &str, raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    match raw.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("row {}: unreadable {} '{}', treated as blank", row, field, raw);
            None
        }
    }
}

fn into_record(raw: RawRow) -> OrderRecord {
    OrderRecord {
        import_qty: parse_qty(raw.row, "import qty", raw.import_qty.as_deref()),
        cancel_qty: parse_qty(raw.row, "cancel qty", raw.cancel_qty.as_deref()),
        row: raw.row,
        order_no: raw.order_no,
        barcode: raw.barcode,
        product_name: raw.product_name,
        image_url: raw.image_url,
        delivery_status: raw.delivery_status,
        note: raw.note,
    }
}

/// Fetch the tab and build a fresh editing session on it
pub async fn load_session(transport: &dyn RowTransport, profile: &Profile) -> Result<EditSession> {
    profile.require_target()?;
    let rows = transport
        .fetch_rows(&profile.tab)
        .await
        .with_context(|| format!("failed to load tab '{}'", profile.tab))?;
    let records = rows.into_iter().map(into_record).collect();
    let baseline = BaselineSnapshot::from_records(profile.tab.clone(), records)?;
    Ok(EditSession::new(baseline, profile.column_map()?))
}

/// Run the edits through the coalescing stage into the session, then apply
/// any delta overrides on top of the rebuilt ready set
pub fn apply_edits(session: &mut EditSession, edits: &[Edit]) -> Result<()> {
    let now = Instant::now();
    for edit in edits {
        if let EditAction::Set { field, value } = &edit.action {
            session.queue_edit(edit.key.clone(), *field, value, now);
        }
    }
    session
        .flush_edits()
        .context("failed to apply edits to the loaded sheet")?;

    for edit in edits {
        if let EditAction::DeltaOverride(delta) = edit.action {
            if !session.set_delta_override(&edit.key, delta) {
                log::warn!(
                    "{}: delta override ignored, record has no pending changes",
                    edit.key
                );
            }
        }
    }
    Ok(())
}
