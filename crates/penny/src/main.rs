// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Penny - an always-on personal assistant over Signal.
//!
//! This is the binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use penny_config::PennyConfig;

/// Penny - an always-on personal assistant over Signal.
#[derive(Parser, Debug)]
#[command(name = "penny", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Signal and start answering messages.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => penny_config::load_and_validate_path(path),
        None => penny_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            penny_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match render_config(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("error: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("penny: use --help for available commands");
        }
    }
}

/// The configuration as TOML, with secrets masked.
fn render_config(config: &PennyConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.search.api_key.is_some() {
        shown.search.api_key = Some("********".to_string());
    }
    toml::to_string_pretty(&shown)
}
