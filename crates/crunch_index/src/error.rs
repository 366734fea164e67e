//! Error types for indexing operations.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. External error types (`std::io::Error`, `serde_json::Error`,
//! `walkdir::Error`) are automatically converted via `From` impls.
//!
//! Variants without an external source are the fatal conditions of a run: the
//! orchestrator stops at the first one and leaves the output tree as it is.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while indexing.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed without a more specific location.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem I/O failed on a known path.
    #[error("IO error at {path}: {source}")]
    IoAt {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize JSON (identifier metadata, report).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal failed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The configured base install does not exist.
    #[error("Base install not found: {0}")]
    BaseInstallMissing(Utf8PathBuf),

    /// A pool was configured without a root directory.
    #[error("Pool '{pool}' has no index root configured")]
    MissingIndexRoot { pool: String },

    /// No free quarantine name was found for an occupied destination.
    #[error("Could not quarantine {path}: no free name after {attempts} attempts")]
    QuarantineBudgetExceeded { path: Utf8PathBuf, attempts: usize },

    /// A file was reached for linking before its item was sequenced.
    #[error("Item '{item}' has no identifier while linking {path}")]
    MissingIdentifier { item: String, path: Utf8PathBuf },

    /// A row of the external item list failed validation.
    #[error("Invalid item record: {0}")]
    InvalidItemRecord(String),

    /// A path could not be represented as UTF-8.
    #[error("Non UTF-8 path: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The archive extraction collaborator reported a failure.
    #[error("Failed to extract {archive}: {message}")]
    Archive {
        archive: Utf8PathBuf,
        message: String,
    },

    /// The thumbnail collaborator reported a failure.
    #[error("Failed to render thumbnail for {file}: {message}")]
    Thumbnail { file: Utf8PathBuf, message: String },

    /// Catch-all for errors from collaborators and other sources.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

/// Attach the offending path to an I/O error.
pub(crate) fn io_at(path: impl Into<Utf8PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::IoAt { path, source }
}
