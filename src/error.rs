//! Error types for the Ktuvit client
//!
//! Variants are grouped the way callers need to react to them:
//! bad input, the site rejecting a query, transport failures, and
//! parse/decode failures. "No match" is not an error and is returned
//! as `Ok(None)` by the resolution calls.

use thiserror::Error;

/// Ktuvit client error types
#[derive(Error, Debug)]
pub enum KtuvitError {
    // ---- input ----
    #[error("IMDB ID not provided")]
    MissingCatalogId,

    #[error("No title name available for {0}")]
    NameUnavailable(String),

    // ---- remote rejection ----
    #[error("Search rejected by Ktuvit: {0}")]
    SearchRejected(String),

    // ---- transport ----
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    // ---- parse / decode ----
    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Unknown encoding label: {0}")]
    UnknownEncoding(String),

    #[error("Malformed {encoding} byte sequence in response")]
    Decode {
        encoding: &'static str,
        /// Text decoded so far, malformed sequences replaced with U+FFFD
        partial: String,
    },

    #[error("Download token missing from response")]
    MissingToken,

    #[error("Login cookie missing from response")]
    LoginFailed,
}

impl KtuvitError {
    /// True for failures at the HTTP layer (as opposed to bad input or bad data)
    pub fn is_transport(&self) -> bool {
        matches!(self, KtuvitError::Transport(_) | KtuvitError::Status(_))
    }
}

impl From<serde_json::Error> for KtuvitError {
    fn from(e: serde_json::Error) -> Self {
        KtuvitError::Parse(format!("JSON parse error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, KtuvitError>;
