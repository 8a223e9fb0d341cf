//! Push command: commit the pending change set and report every cell's fate

use std::time::Duration;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::cli::PushArgs;
use crate::cli::edits::read_edits;
use crate::config::Profile;
use crate::sync::reconcile::CommitReport;

pub async fn run(args: PushArgs, profile: &Profile) -> Result<()> {
    let client = super::build_client(profile)?;
    let mut session = super::load_session(&client, profile).await?;

    let edits = read_edits(&args.edits)?;
    super::apply_edits(&mut session, &edits)?;

    if !session.has_changes() {
        println!("{}", "nothing to push: all edits match the sheet".green());
        return Ok(());
    }

    let timeout = Duration::from_secs(args.timeout_secs);
    let report = session.commit(&client, timeout).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        print_report(&report);
    }

    if !report.is_clean() {
        bail!(
            "{} cell(s) not confirmed; re-run push to retry them",
            report.unconfirmed_count()
        );
    }
    Ok(())
}

fn print_report(report: &CommitReport) {
    println!(
        "{} confirmed, {} failed, {} mismatched",
        report.confirmed_count.to_string().green(),
        report.failed_count.to_string().red(),
        report.mismatch_count.to_string().yellow()
    );

    for failed in &report.failed {
        println!(
            "  {} {} {}: {}",
            "failed".red(),
            failed.key,
            failed.field,
            failed.reason
        );
    }
    for mismatch in &report.mismatches {
        println!(
            "  {} {} {}: wrote '{}', sheet holds '{}'",
            "mismatch".yellow(),
            mismatch.key,
            mismatch.field,
            mismatch.expected,
            mismatch.actual
        );
    }
}
