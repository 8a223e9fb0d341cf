//! Status command: dry-run view of the pending change set

use anyhow::Result;
use colored::Colorize;

use crate::cli::StatusArgs;
use crate::cli::edits::read_edits;
use crate::config::Profile;
use crate::export::write_ready_csv;
use crate::sync::ready::ReadyItem;

pub async fn run(args: StatusArgs, profile: &Profile) -> Result<()> {
    let client = super::build_client(profile)?;
    let mut session = super::load_session(&client, profile).await?;

    if let Some(path) = &args.edits {
        let edits = read_edits(path)?;
        super::apply_edits(&mut session, &edits)?;
    }

    println!(
        "{} rows loaded from '{}'",
        session.baseline().len(),
        profile.tab
    );

    if session.ready_items().is_empty() {
        println!("{}", "no pending changes".green());
        return Ok(());
    }

    println!(
        "{} record(s) with pending changes ({} dirty cell(s)):",
        session.ready_items().len(),
        session.dirty_count()
    );
    println!();
    for item in session.ready_items() {
        print_item(item);
    }

    if let Some(path) = &args.csv {
        write_ready_csv(path, session.ready_items())?;
        println!();
        println!("change set exported to {}", path.display());
    }

    Ok(())
}

fn print_item(item: &ReadyItem) {
    let name = item.product_name.as_deref().unwrap_or("-");
    println!(
        "  {}  {} ({})",
        item.key.to_string().bold(),
        name,
        item.delivery_status.as_deref().unwrap_or("no status")
    );
    for (field, pending) in &item.changes {
        println!("      {} -> {}", field.to_string().cyan(), pending);
    }
    if item.effective_delta() != 0 {
        println!("      {} {}", "delta".yellow(), item.effective_delta());
    }
}
