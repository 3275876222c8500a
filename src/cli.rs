//! CLI - Command Line Interface for Ktuvit
//!
//! Every library operation is scriptable. Output is JSON when `--json` is
//! given or stdout is not a terminal; logs go to stderr.
//!
//! # Examples
//!
//! ```bash
//! # Store the login cookie once
//! ktuvit login user@example.com <hashed-password> --save
//!
//! # Resolve, list, download
//! ktuvit resolve tt0944947
//! ktuvit subtitles tt0944947 -s 1 -e 2
//! ktuvit download tt0944947 A1B2C3 -o episode.srt
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use ktuvit::{KtuvitError, TitleType};

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or missing input
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Title or subtitle not found
    NotFound = 4,
    /// Ktuvit rejected the request
    Rejected = 5,
    /// Response could not be parsed or decoded
    BadResponse = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<&KtuvitError> for ExitCode {
    fn from(err: &KtuvitError) -> Self {
        match err {
            KtuvitError::MissingCatalogId | KtuvitError::NameUnavailable(_) => ExitCode::InvalidArgs,
            KtuvitError::SearchRejected(_) | KtuvitError::LoginFailed => ExitCode::Rejected,
            KtuvitError::Transport(_) | KtuvitError::Status(_) => ExitCode::NetworkError,
            KtuvitError::Parse(_)
            | KtuvitError::Decode { .. }
            | KtuvitError::UnknownEncoding(_)
            | KtuvitError::MissingToken => ExitCode::BadResponse,
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Ktuvit - Hebrew subtitles from the command line
#[derive(Parser, Debug)]
#[command(
    name = "ktuvit",
    version,
    about = "Search, list and download Hebrew subtitles from ktuvit.me",
    after_help = "EXAMPLES:\n\
                  ktuvit resolve tt0944947                 Ktuvit ID for an IMDB title\n\
                  ktuvit subtitles tt0944947 -s 1 -e 2     List episode subtitles\n\
                  ktuvit download tt1375666 12345 -o x.srt Download a subtitle"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a login cookie for email + hashed password
    Login(LoginCmd),

    /// Resolve an IMDB ID to a Ktuvit title ID
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Search Ktuvit titles by name
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List subtitles for a movie or episode
    #[command(visible_alias = "sub")]
    Subtitles(SubtitlesCmd),

    /// Download a subtitle as text
    #[command(visible_alias = "dl")]
    Download(DownloadCmd),
}

/// Title type filter
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    Movie,
    Series,
}

impl From<TypeFilter> for TitleType {
    fn from(t: TypeFilter) -> Self {
        match t {
            TypeFilter::Movie => TitleType::Movie,
            TypeFilter::Series => TitleType::Series,
        }
    }
}

// =============================================================================
// Login Command
// =============================================================================

#[derive(Args, Debug)]
pub struct LoginCmd {
    /// Account email
    #[arg(required = true)]
    pub email: String,

    /// Password hash as sent by the site's login form
    #[arg(required = true)]
    pub hashed_password: String,

    /// Store the cookie in the config file
    #[arg(long)]
    pub save: bool,
}

// =============================================================================
// Resolve Command
// =============================================================================

#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// IMDB ID (e.g., tt0944947)
    #[arg(required = true)]
    pub imdb_id: String,

    #[command(flatten)]
    pub title: TitleArgs,
}

/// Hints that skip the name lookup or narrow the search
#[derive(Args, Debug, Default)]
pub struct TitleArgs {
    /// Title name (skips the IMDB name lookup)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Title type
    #[arg(long, short = 't', value_enum)]
    pub title_type: Option<TypeFilter>,

    /// Release year (ranges like 2019–2021 are trimmed)
    #[arg(long, short = 'y')]
    pub year: Option<String>,
}

// =============================================================================
// Search Command
// =============================================================================

#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Title name
    #[arg(required = true)]
    pub query: String,

    /// Title type
    #[arg(long, short = 't', value_enum)]
    pub title_type: Option<TypeFilter>,

    /// Release year
    #[arg(long, short = 'y')]
    pub year: Option<String>,

    /// Only titles that have subtitles
    #[arg(long)]
    pub with_subs_only: bool,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

// =============================================================================
// Subtitles Command
// =============================================================================

#[derive(Args, Debug)]
pub struct SubtitlesCmd {
    /// IMDB ID (e.g., tt0944947)
    #[arg(required = true)]
    pub imdb_id: String,

    /// Season number (for series)
    #[arg(long, short = 's', requires = "episode")]
    pub season: Option<u32>,

    /// Episode number (for series)
    #[arg(long, short = 'e', requires = "season")]
    pub episode: Option<u32>,

    #[command(flatten)]
    pub title: TitleArgs,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: usize,
}

// =============================================================================
// Download Command
// =============================================================================

#[derive(Args, Debug)]
pub struct DownloadCmd {
    /// IMDB ID (e.g., tt1375666)
    #[arg(required = true)]
    pub imdb_id: String,

    /// Ktuvit subtitle ID (from `ktuvit subtitles`)
    #[arg(required = true)]
    pub subtitle_id: String,

    #[command(flatten)]
    pub title: TitleArgs,

    /// Write the subtitle to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Bytes to sample before committing to a charset
    #[arg(long)]
    pub sample_limit: Option<usize>,
}

// =============================================================================
// JSON Response Types
// =============================================================================

/// Standard JSON envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl<T> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn error_msg(msg: &str, code: ExitCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
            code: Some(code.into()),
        }
    }
}

/// `resolve` result
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub imdb_id: String,
    pub ktuvit_id: String,
}

/// `download` result when written to a file
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub path: PathBuf,
    pub encoding: String,
    pub chars: usize,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Report a library error with its matching exit code
    pub fn failure(&self, context: &str, err: &KtuvitError) -> ExitCode {
        self.error(format!("{}: {}", context, err), ExitCode::from(err))
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// IMDB ID Validation
// =============================================================================

/// Validate IMDB ID format (tt followed by digits)
pub fn validate_imdb_id(id: &str) -> Result<&str, &'static str> {
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err("Invalid IMDB ID format (expected tt followed by 7+ digits)")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_command() {
        let cli = Cli::parse_from(["ktuvit", "resolve", "tt0944947", "-n", "Game of Thrones"]);
        if let Command::Resolve(cmd) = cli.command {
            assert_eq!(cmd.imdb_id, "tt0944947");
            assert_eq!(cmd.title.name.as_deref(), Some("Game of Thrones"));
        } else {
            panic!("Expected Resolve command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["ktuvit", "--json", "--quiet", "search", "fauda"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(cli.should_json());
    }

    #[test]
    fn test_subtitles_episode_args() {
        let cli = Cli::parse_from(["ktuvit", "subtitles", "tt0944947", "-s", "1", "-e", "2"]);
        if let Command::Subtitles(cmd) = cli.command {
            assert_eq!(cmd.season, Some(1));
            assert_eq!(cmd.episode, Some(2));
            assert_eq!(cmd.limit, 50);
        } else {
            panic!("Expected Subtitles command");
        }
    }

    #[test]
    fn test_season_requires_episode() {
        let result = Cli::try_parse_from(["ktuvit", "subtitles", "tt0944947", "-s", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_command() {
        let cli = Cli::parse_from([
            "ktuvit",
            "download",
            "tt1375666",
            "12345",
            "-o",
            "out.srt",
            "--sample-limit",
            "4096",
            "-t",
            "movie",
        ]);
        if let Command::Download(cmd) = cli.command {
            assert_eq!(cmd.subtitle_id, "12345");
            assert_eq!(cmd.output, Some(PathBuf::from("out.srt")));
            assert_eq!(cmd.sample_limit, Some(4096));
            assert_eq!(cmd.title.title_type, Some(TypeFilter::Movie));
        } else {
            panic!("Expected Download command");
        }
    }

    #[test]
    fn test_validate_imdb_id() {
        assert!(validate_imdb_id("tt0944947").is_ok());
        assert!(validate_imdb_id("tt12345678").is_ok());
        assert!(validate_imdb_id("tt123456").is_err());
        assert!(validate_imdb_id("nm1234567").is_err());
        assert!(validate_imdb_id("1234567").is_err());
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ExitCode::from(&KtuvitError::MissingCatalogId), ExitCode::InvalidArgs);
        assert_eq!(
            ExitCode::from(&KtuvitError::SearchRejected("x".into())),
            ExitCode::Rejected
        );
        assert_eq!(ExitCode::from(&KtuvitError::Status(500)), ExitCode::NetworkError);
        assert_eq!(ExitCode::from(&KtuvitError::MissingToken), ExitCode::BadResponse);
        assert_eq!(i32::from(ExitCode::NotFound), 4);
    }
}
