//! Errors of the persisted session store.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias for session store operations.
pub type StoreResult<T> = Result<T, SessionStoreError>;

/// Failures of the persisted session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The backing file could not be read or written.
    #[error("session store i/o failed for `{}`", path.display())]
    Io {
        /// Backing file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file does not hold a JSON object of stored values.
    #[error("session store file `{}` is corrupt", path.display())]
    Corrupt {
        /// Backing file.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The stored values could not be encoded.
    #[error("failed to encode session store contents")]
    Encode(#[source] serde_json::Error),
}
