//! Command-line interface

pub mod commands;
pub mod edits;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "orderdesk",
    version,
    about = "Back-office order sheet editor with reconciled batch sync"
)]
pub struct Cli {
    /// Path to the profile TOML (defaults to the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the sheet, apply edits locally and show the pending change set
    Status(StatusArgs),
    /// Load the sheet, apply edits and push them: batch write, verify, reconcile
    Push(PushArgs),
    /// Show the supported field → column mapping
    Columns,
}

#[derive(clap::Args)]
pub struct StatusArgs {
    /// CSV file of edits to apply (order_no,barcode,field,value)
    #[arg(long)]
    pub edits: Option<PathBuf>,

    /// Export the pending change set to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct PushArgs {
    /// CSV file of edits to apply (order_no,barcode,field,value)
    #[arg(long)]
    pub edits: PathBuf,

    /// Network timeout per commit phase, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Print the commit report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}
