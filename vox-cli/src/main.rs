use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vox_cli::commands;
use vox_cli::console::run_console;
use vox_cli::{Cli, Commands, ConsoleSession};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Voices => {
            println!("{}", commands::format_voices(cli.options.default_voice));
        }
        Commands::Ingest { files, name } => {
            let pipeline = commands::build_pipeline(&cli.options)?;
            commands::ingest(&pipeline, &files, name.as_deref()).await?;
        }
        Commands::Ask { question, voice, json } => {
            let pipeline = commands::build_pipeline(&cli.options)?;
            if !commands::ask(&pipeline, &question, voice.as_deref(), json).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Console => {
            let pipeline = commands::build_pipeline(&cli.options)?;
            run_console(&pipeline, ConsoleSession::new(cli.options.default_voice)).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
