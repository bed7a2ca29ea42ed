//! Line source error types.

use std::path::PathBuf;

/// Errors that can occur while fetching the line listing.
///
/// Any of these aborts the network build in progress; a previously built
/// network stays in service.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status or an unsuccessful envelope
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// A row failed schema validation
    #[error("invalid line record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Local data file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
