use neutron_runner::RunError;
use neutron_store::{ReadError, WriteError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any failure surfaced through the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
  #[error(transparent)]
  Write(#[from] WriteError),

  #[error(transparent)]
  Read(#[from] ReadError),

  #[error(transparent)]
  Run(#[from] RunError),
}

/// Machine-readable failure kind, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  InvalidRecord,
  PermissionDenied,
  PathInvalid,
  IoFailure,
  NotFound,
  Malformed,
  ScriptNotFound,
  PermissionAdjustFailed,
  ExecutionFailed,
  OutputTooLarge,
  Cancelled,
}

impl BridgeError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Write(e) => match e {
        WriteError::InvalidRecord(_) => ErrorKind::InvalidRecord,
        WriteError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
        WriteError::PathInvalid(_) => ErrorKind::PathInvalid,
        WriteError::IoFailure { .. } => ErrorKind::IoFailure,
      },
      Self::Read(e) => match e {
        ReadError::NotFound { .. } => ErrorKind::NotFound,
        ReadError::PathInvalid(_) => ErrorKind::PathInvalid,
        ReadError::Io { .. } => ErrorKind::IoFailure,
        ReadError::Malformed { .. } => ErrorKind::Malformed,
      },
      Self::Run(e) => match e {
        RunError::ScriptNotFound { .. } => ErrorKind::ScriptNotFound,
        RunError::PathInvalid(_) => ErrorKind::PathInvalid,
        RunError::PermissionAdjustFailed { .. } => ErrorKind::PermissionAdjustFailed,
        RunError::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
        RunError::OutputTooLarge { .. } => ErrorKind::OutputTooLarge,
        RunError::Cancelled => ErrorKind::Cancelled,
        RunError::Io { .. } => ErrorKind::IoFailure,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use neutron_config::ValidationError;
  use neutron_runner::OutputStream;

  use super::*;

  #[test]
  fn test_kind_mapping() {
    let err = BridgeError::from(WriteError::InvalidRecord(ValidationError::EmptyShape));
    assert_eq!(err.kind(), ErrorKind::InvalidRecord);

    let err = BridgeError::from(RunError::OutputTooLarge {
      stream: OutputStream::Stdout,
      limit: 10,
    });
    assert_eq!(err.kind(), ErrorKind::OutputTooLarge);

    let err = BridgeError::from(RunError::ScriptNotFound {
      path: "/opt/neutron/Particle_Transport.sh".into(),
    });
    assert_eq!(err.kind(), ErrorKind::ScriptNotFound);
  }

  #[test]
  fn test_message_is_transparent() {
    let err = BridgeError::from(RunError::ExecutionFailed {
      message: "bad shape".to_string(),
      exit_code: Some(1),
    });
    assert_eq!(err.to_string(), "simulation failed: bad shape");
  }
}
