//! `chatcore-settings` - inspect and edit the ChatCore settings file.

use std::process;

use chatcore::{
    cli::{Cli, CliCommand, execute, formatting::format_error},
    tracing_config,
};
use clap::Parser;
use tracing::{Level, span};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = match &cli.command {
        CliCommand::Watch { .. } => match tracing_config::init_with_file("info") {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("{}", format_error(&format!("Logging unavailable: {e}")));
                None
            }
        },
        _ => {
            if let Err(e) = tracing_config::init("warn") {
                eprintln!("{}", format_error(&format!("Logging unavailable: {e}")));
            }
            None
        }
    };

    let _span = span!(Level::INFO, "chatcore_settings").entered();

    let result = match cli.settings_dir() {
        Ok(dir) => execute(&dir, &cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            process::exit(1);
        }
    }
}
