//! Error types for the shardstream library.
//!
//! All operations that can fail return a [`Result<T>`], an alias for
//! `Result<T, StreamError>`.
//!
//! # Error Categories
//!
//! - **Listing errors**: [`RootNotFound`], [`InvalidMask`]
//! - **Per-file errors**: [`FileAccess`]
//! - **Archive errors**: [`MalformedArchive`]
//! - **System errors**: [`Io`]
//!
//! [`RootNotFound`]: StreamError::RootNotFound
//! [`InvalidMask`]: StreamError::InvalidMask
//! [`FileAccess`]: StreamError::FileAccess
//! [`MalformedArchive`]: StreamError::MalformedArchive
//! [`Io`]: StreamError::Io

use std::io;
use std::path::{Path, PathBuf};

/// Result type alias for operations that may return a [`StreamError`].
pub type Result<T> = std::result::Result<T, StreamError>;

/// Error types for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The listing root does not exist or is not a directory.
    #[error("root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// The file-name mask could not be compiled.
    #[error("invalid file mask {mask:?}: {reason}")]
    InvalidMask {
        /// The mask as given.
        mask: String,
        /// Why compilation failed.
        reason: String,
    },

    /// Open, read, or traversal failed for an individual file.
    #[error("failed to read {path}: {source}")]
    FileAccess {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// An archive stream did not parse as tar (or gzip-compressed tar).
    #[error("malformed archive {archive}: {source}")]
    MalformedArchive {
        /// The archive whose bytes failed to parse.
        archive: PathBuf,
        /// The underlying parse or I/O failure.
        source: io::Error,
    },

    /// I/O failure not attributable to a specific input file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<walkdir::Error> for StreamError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_owned).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => StreamError::FileAccess { path, source },
            // walkdir only produces a non-I/O error for symlink loops
            None => StreamError::FileAccess {
                path,
                source: io::Error::other("filesystem loop detected"),
            },
        }
    }
}

/// What to do when an individual input item fails to load.
///
/// The producers never retry; this only selects between surfacing the error
/// and moving on to the next item. Accepted by
/// [`FileOpener::with_policy`](crate::FileOpener::with_policy) and
/// [`TarExtractor::with_policy`](crate::TarExtractor::with_policy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Yield the error to the caller and end the sequence.
    #[default]
    Abort,

    /// Log a warning and continue with the next item.
    Skip,
}
