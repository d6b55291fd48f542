//! Index client errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Backend is not answering.
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// Backend refused a request (e.g. a document without a unique key).
    #[error("index rejected request: {0}")]
    Rejected(String),

    /// Snapshot file could not be read or written.
    #[error("{context}: {}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot file is not a valid document set.
    #[error("corrupt snapshot {}: {reason}", path.display())]
    Snapshot { path: PathBuf, reason: String },
}

impl IndexError {
    pub fn io(context: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        IndexError::Io {
            context: context.into(),
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Unavailable(_) => "INDEX_UNAVAILABLE",
            IndexError::Rejected(_) => "INDEX_REJECTED",
            IndexError::Io { .. } => "INDEX_IO_ERROR",
            IndexError::Snapshot { .. } => "INDEX_CORRUPT_SNAPSHOT",
        }
    }
}
