//! Configuration store errors.

use std::io;
use std::path::PathBuf;

use neutron_config::{PathError, ValidationError};

/// Errors that can occur while saving the configuration artifact.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
  /// The record broke one of its invariants. Nothing was written.
  #[error("invalid parameter record: {0}")]
  InvalidRecord(#[from] ValidationError),

  /// The target directory is not writable.
  #[error("permission denied writing {path}: {source}")]
  PermissionDenied {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The artifact path leads outside the installation root.
  #[error("invalid artifact path: {0}")]
  PathInvalid(#[from] PathError),

  /// Any other filesystem failure.
  #[error("failed to write {path}: {source}")]
  IoFailure {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl WriteError {
  /// Classify an I/O error raised while writing `path`.
  pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    let path = path.into();
    match source.kind() {
      io::ErrorKind::PermissionDenied => Self::PermissionDenied { path, source },
      _ => Self::IoFailure { path, source },
    }
  }
}

/// Errors that can occur while reading the configuration artifact back.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
  /// No artifact has been saved yet.
  #[error("no configuration saved at {path}")]
  NotFound { path: PathBuf },

  #[error("invalid artifact path: {0}")]
  PathInvalid(#[from] PathError),

  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The file exists but does not hold a parameter record.
  #[error("malformed configuration in {path}: {source}")]
  Malformed {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}
