//! CSV export of the pending change set

use std::path::Path;

use anyhow::{Context, Result};

use crate::sync::ready::ReadyItem;
use crate::sync::value::EditableField;

/// Write the ready set to a CSV file for operator review
pub fn write_ready_csv(path: &Path, items: &[ReadyItem]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "order_no",
        "barcode",
        "product_name",
        "delivery_status",
        "import_qty",
        "cancel_qty",
        "note",
        "delta_qty",
    ])?;

    for item in items {
        let pending = |field: EditableField| {
            item.changes
                .get(&field)
                .map(|v| v.to_wire())
                .unwrap_or_default()
        };
        let import_qty = pending(EditableField::ImportQty);
        let cancel_qty = pending(EditableField::CancelQty);
        let note = pending(EditableField::Note);
        let delta = item.effective_delta().to_string();
        writer.write_record([
            item.order_no.as_str(),
            item.barcode.as_str(),
            item.product_name.as_deref().unwrap_or(""),
            item.delivery_status.as_deref().unwrap_or(""),
            import_qty.as_str(),
            cancel_qty.as_str(),
            note.as_str(),
            delta.as_str(),
        ])?;
    }
    writer.flush()?;
    log::info!("exported {} ready item(s) to {}", items.len(), path.display());
    Ok(())
}
