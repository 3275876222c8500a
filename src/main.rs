//! Ktuvit - Hebrew subtitles from the command line
//!
//! # Usage
//!
//! ```bash
//! ktuvit login user@example.com <hashed-password> --save
//! ktuvit subtitles tt0944947 -s 1 -e 2
//! ktuvit download tt0944947 A1B2C3 -o episode.srt
//! ```
//!
//! Set `RUST_LOG=ktuvit=debug` to trace requests on stderr.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ktuvit::Config;

use crate::cli::{Cli, Command, ExitCode, Output};

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Logs to stderr so stdout stays parseable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        Command::Login(cmd) => commands::login_cmd(cmd, config, &output).await,

        Command::Resolve(cmd) => {
            if let Err(e) = cli::validate_imdb_id(&cmd.imdb_id) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::resolve_cmd(cmd, config, &output).await
        }

        Command::Search(cmd) => commands::search_cmd(cmd, config, &output).await,

        Command::Subtitles(cmd) => {
            if let Err(e) = cli::validate_imdb_id(&cmd.imdb_id) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::subtitles_cmd(cmd, config, &output).await
        }

        Command::Download(cmd) => {
            if let Err(e) = cli::validate_imdb_id(&cmd.imdb_id) {
                return output.error(e, ExitCode::InvalidArgs);
            }
            commands::download_cmd(cmd, config, &output).await
        }
    }
}
