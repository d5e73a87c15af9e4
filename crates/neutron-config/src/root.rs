use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// The directory the application is installed in.
///
/// Computed once at startup and passed to every component that touches the
/// filesystem. The stored path is canonical, so containment checks compare
/// like with like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
  path: PathBuf,
}

impl InstallRoot {
  /// Anchor at an explicit directory.
  pub fn new(path: impl AsRef<Path>) -> Result<Self, PathError> {
    let path = path.as_ref();
    let canonical = std::fs::canonicalize(path).map_err(|source| PathError::RootUnavailable {
      path: path.to_path_buf(),
      source,
    })?;

    if !canonical.is_dir() {
      return Err(PathError::RootUnavailable {
        path: path.to_path_buf(),
        source: io::Error::other("not a directory"),
      });
    }

    Ok(Self { path: canonical })
  }

  /// Anchor at the directory containing the running executable.
  pub fn from_current_exe() -> Result<Self, PathError> {
    let exe = std::env::current_exe().map_err(|source| PathError::RootUnavailable {
      path: PathBuf::new(),
      source,
    })?;

    match exe.parent() {
      Some(dir) => Self::new(dir),
      None => Err(PathError::RootUnavailable {
        path: exe.clone(),
        source: io::Error::other("executable has no parent directory"),
      }),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Join a plain file name onto the root.
  ///
  /// Rejects anything that is not a single normal path component, so the
  /// result is always a direct child of the root.
  pub fn resolve(&self, name: &str) -> Result<PathBuf, PathError> {
    if name.contains(['/', '\\']) {
      return Err(PathError::NotAFileName {
        name: name.to_string(),
      });
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
      (Some(Component::Normal(_)), None) => Ok(self.path.join(name)),
      _ => Err(PathError::NotAFileName {
        name: name.to_string(),
      }),
    }
  }

  /// Check that `path` does not lead outside the root once symlinks are
  /// followed. A path that does not exist yet is accepted.
  pub async fn confine(&self, path: &Path) -> Result<(), PathError> {
    match tokio::fs::canonicalize(path).await {
      Ok(real) => self.check_within(real),
      Err(e) if e.kind() == io::ErrorKind::NotFound => self.confine_dangling(path).await,
      Err(source) => Err(PathError::Inaccessible {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  /// Whether a canonical path lies inside the root.
  pub fn contains(&self, path: &Path) -> bool {
    path.starts_with(&self.path)
  }

  fn check_within(&self, real: PathBuf) -> Result<(), PathError> {
    if self.contains(&real) {
      Ok(())
    } else {
      Err(PathError::EscapesRoot {
        path: real,
        root: self.path.clone(),
      })
    }
  }

  async fn confine_dangling(&self, path: &Path) -> Result<(), PathError> {
    let meta = match tokio::fs::symlink_metadata(path).await {
      Ok(meta) => meta,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
      Err(source) => {
        return Err(PathError::Inaccessible {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    if !meta.file_type().is_symlink() {
      return Ok(());
    }

    let target = tokio::fs::read_link(path)
      .await
      .map_err(|source| PathError::Inaccessible {
        path: path.to_path_buf(),
        source,
      })?;
    let target = match path.parent() {
      Some(parent) => parent.join(target),
      None => target,
    };

    if target
      .components()
      .any(|c| matches!(c, Component::ParentDir))
    {
      return Err(PathError::EscapesRoot {
        path: target,
        root: self.path.clone(),
      });
    }
    self.check_within(target)
  }
}
