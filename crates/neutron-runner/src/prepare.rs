use std::path::Path;

use crate::error::RunError;

/// Make sure the script carries the `0o755` bits. Returns whether the mode
/// had to change.
#[cfg(unix)]
pub(crate) async fn ensure_executable(path: &Path) -> Result<bool, RunError> {
  use std::fs::Permissions;
  use std::os::unix::fs::PermissionsExt;

  let metadata = tokio::fs::metadata(path)
    .await
    .map_err(|e| RunError::permission_adjust(path, e))?;
  let mode = metadata.permissions().mode();
  if mode & 0o755 == 0o755 {
    return Ok(false);
  }

  tokio::fs::set_permissions(path, Permissions::from_mode(mode | 0o755))
    .await
    .map_err(|e| RunError::permission_adjust(path, e))?;
  Ok(true)
}

/// No permission bits to adjust on this platform.
#[cfg(not(unix))]
pub(crate) async fn ensure_executable(_path: &Path) -> Result<bool, RunError> {
  Ok(false)
}

#[cfg(all(test, unix))]
mod tests {
  use std::os::unix::fs::PermissionsExt;

  use super::*;

  #[tokio::test]
  async fn test_sets_missing_bits() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("run.sh");
    std::fs::write(&script, b"#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

    assert!(ensure_executable(&script).await.unwrap());

    let mode = std::fs::metadata(&script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
  }

  #[tokio::test]
  async fn test_leaves_executable_script_alone() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("run.sh");
    std::fs::write(&script, b"#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o775)).unwrap();

    assert!(!ensure_executable(&script).await.unwrap());

    let mode = std::fs::metadata(&script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o775);
  }

  #[tokio::test]
  async fn test_missing_file_is_permission_adjust_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = ensure_executable(&dir.path().join("missing.sh")).await;

    let err = result.unwrap_err();
    assert!(err.is_warning());
  }
}
