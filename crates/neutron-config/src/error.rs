use std::path::PathBuf;

use thiserror::Error;

/// A parameter record that breaks one of its structural invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("run.run_name must not be empty")]
  EmptyRunName,

  #[error("run.simulations must be a positive integer, got {0}")]
  NonPositiveSimulations(u64),

  #[error("material.lambda must be a positive finite number, got {0}")]
  InvalidLambda(f64),

  #[error("material.pabs must lie in [0, 1], got {0}")]
  PabsOutOfRange(f64),

  #[error("material.k must be a finite number, got {0}")]
  NonFiniteK(f64),

  #[error("geometry.shape must not be empty")]
  EmptyShape,
}

/// Errors raised while resolving paths against the installation root.
#[derive(Debug, Error)]
pub enum PathError {
  /// The root itself could not be determined or is not a directory.
  #[error("installation root {path} is unavailable: {source}")]
  RootUnavailable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The name has separators, parent references or is absolute.
  #[error("'{name}' is not a plain file name")]
  NotAFileName { name: String },

  /// The path, after following symlinks, lands outside the root.
  #[error("{path} resolves outside the installation root {root}")]
  EscapesRoot { path: PathBuf, root: PathBuf },

  /// The path could not be inspected.
  #[error("cannot inspect {path}: {source}")]
  Inaccessible {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
