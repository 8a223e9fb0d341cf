mod api;
mod cli;
mod config;
mod export;
mod sync;

use anyhow::Result;
use clap::Parser;
use is_terminal::IsTerminal;

use cli::{Cli, Commands};
use config::Profile;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    let profile = Profile::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Status(args) => cli::commands::status::run(args, &profile).await,
        Commands::Push(args) => cli::commands::push::run(args, &profile).await,
        Commands::Columns => cli::commands::columns::run(&profile),
    }
}
