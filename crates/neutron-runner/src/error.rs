//! Simulation run errors.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use neutron_config::PathError;

/// Which captured stream an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
  Stdout,
  Stderr,
}

impl fmt::Display for OutputStream {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Stdout => f.write_str("stdout"),
      Self::Stderr => f.write_str("stderr"),
    }
  }
}

/// Errors that can occur while running the simulation.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
  /// Nothing launchable at the resolved script path.
  #[error("simulation script not found at {path}")]
  ScriptNotFound { path: PathBuf },

  /// The script or artifact name leads outside the installation root.
  #[error("invalid path: {0}")]
  PathInvalid(#[from] PathError),

  /// The executable bit could not be set. Reported as a warning only; the
  /// launch attempt decides whether the run can proceed.
  #[error("could not make {path} executable: {source}")]
  PermissionAdjustFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The process could not be launched or exited unsuccessfully.
  ///
  /// `message` is the captured stderr when there was any, otherwise the
  /// launch failure or the exit status.
  #[error("simulation failed: {message}")]
  ExecutionFailed {
    message: String,
    exit_code: Option<i32>,
  },

  /// One of the output streams went past the capture limit.
  #[error("simulation {stream} exceeded the {limit} byte capture limit")]
  OutputTooLarge { stream: OutputStream, limit: usize },

  /// The run was cancelled and the process killed.
  #[error("simulation run cancelled")]
  Cancelled,

  /// I/O failure around the process (inspecting the script, reading pipes).
  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: io::Error,
  },
}

impl RunError {
  pub(crate) fn permission_adjust(path: &Path, source: io::Error) -> Self {
    Self::PermissionAdjustFailed {
      path: path.to_path_buf(),
      source,
    }
  }

  pub(crate) fn launch(path: &Path, source: io::Error) -> Self {
    Self::ExecutionFailed {
      message: format!("failed to launch {}: {}", path.display(), source),
      exit_code: None,
    }
  }

  pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
    Self::Io {
      context: context.into(),
      source,
    }
  }

  /// Whether this error is only ever reported as a warning.
  pub fn is_warning(&self) -> bool {
    matches!(self, Self::PermissionAdjustFailed { .. })
  }
}
