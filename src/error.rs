//! Centralized error handling for scrubber.
//!
//! Every fallible library operation returns [`Result`], whose error type is
//! [`ScrubError`]. The variants follow the failure classes of a run:
//!
//! ```
//! use scrubber::error::ScrubError;
//!
//! fn describe(err: &ScrubError) -> &'static str {
//!     match err {
//!         ScrubError::NoInputFiles(_) => "nothing to do",
//!         ScrubError::MissingCredential(_) => "set EMAIL_USER / EMAIL_PASS",
//!         ScrubError::Mail(_) => "delivery failed",
//!         _ => "processing failed",
//!     }
//! }
//! ```
//!
//! Coercion failures inside the column cleaners are *not* errors; they
//! become nulls and are handled by the row-dropping rules.
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`ScrubError`]:
//!
//! ```no_run
//! use scrubber::error::ResultExt as _;
//!
//! fn load() -> scrubber::error::Result<String> {
//!     std::fs::read_to_string("input/sales.csv").context("Failed to read sales file")
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for scrubber operations.
#[derive(Debug)]
pub enum ScrubError {
    /// I/O errors (reading inputs, writing outputs, appending summaries)
    Io(std::io::Error),

    /// Data loading and transformation errors (Polars, spreadsheet parsing)
    DataProcessing(String),

    /// Configuration file errors
    Config(String),

    /// File name or extension that cannot be handled
    InvalidPath(String),

    /// No supported input file was found in the input directory
    NoInputFiles(PathBuf),

    /// A required credential variable is missing or empty
    MissingCredential(&'static str),

    /// Message building, addressing or SMTP transport failure
    Mail(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for ScrubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::NoInputFiles(dir) => write!(
                f,
                "No supported files (.csv, .tsv, .xlsx) were found in {}",
                dir.display()
            ),
            Self::MissingCredential(var) => write!(
                f,
                "Email credential {var} is not set; export it or add it to a .env file"
            ),
            Self::Mail(msg) => write!(f, "Mail error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ScrubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScrubError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ScrubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for ScrubError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<calamine::XlsxError> for ScrubError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::DataProcessing(format!("spreadsheet: {err}"))
    }
}

impl From<lettre::error::Error> for ScrubError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Mail(format!("failed to build message: {err}"))
    }
}

impl From<lettre::address::AddressError> for ScrubError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::Mail(format!("invalid address: {err}"))
    }
}

impl From<lettre::message::header::ContentTypeErr> for ScrubError {
    fn from(err: lettre::message::header::ContentTypeErr) -> Self {
        Self::Mail(format!("invalid content type: {err}"))
    }
}

impl From<lettre::transport::smtp::Error> for ScrubError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Mail(format!("SMTP: {err}"))
    }
}

/// Result type alias for scrubber operations.
pub type Result<T> = std::result::Result<T, ScrubError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ScrubError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: ScrubError = e.into();
            ScrubError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: ScrubError = e.into();
            ScrubError::Other(format!("{}: {}", f(), err))
        })
    }
}
