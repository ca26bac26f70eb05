//! Error types for folio
//!
//! The live viewer never surfaces these to its callers; they flow through the
//! loading and watching internals and into the binary's startup path.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by folio's library code.
#[derive(Debug, Error)]
pub enum FolioError {
    /// A note could not be opened or read.
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Underlying IO error bubbled up from filesystem operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file-change subscription backend reported a failure.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// The settings file exists but is not valid TOML for [`crate::Config`].
    #[error("invalid config at {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Settings could not be serialized back to TOML.
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The platform exposes no per-user configuration directory.
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}

impl FolioError {
    pub fn read<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        FolioError::Read {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using [`FolioError`].
pub type FolioResult<T> = Result<T, FolioError>;
