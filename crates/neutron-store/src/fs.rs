use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use neutron_config::{InstallRoot, ParameterRecord, PathError};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::{ConfigStore, ReadError, WriteError};

/// File name the simulation executable expects its configuration under.
pub const DEFAULT_ARTIFACT_NAME: &str = "config.json";

/// Filesystem-based configuration store.
///
/// The artifact lives at `{root}/{artifact_name}`. Saves go through a
/// sibling temporary file that is renamed over the artifact, so readers see
/// either the previous record or the new one, never a partial write.
pub struct FsConfigStore {
  root: InstallRoot,
  artifact_name: String,
  artifact_path: PathBuf,
  temp_path: PathBuf,
  write_lock: Mutex<()>,
}

impl FsConfigStore {
  /// Create a store for the default artifact under `root`.
  pub fn new(root: InstallRoot) -> Result<Self, PathError> {
    Self::with_artifact_name(root, DEFAULT_ARTIFACT_NAME)
  }

  /// Create a store for a custom artifact file name under `root`.
  pub fn with_artifact_name(
    root: InstallRoot,
    artifact_name: impl Into<String>,
  ) -> Result<Self, PathError> {
    let artifact_name = artifact_name.into();
    let artifact_path = root.resolve(&artifact_name)?;
    let temp_path = root.resolve(&format!(".{}.tmp", artifact_name))?;

    Ok(Self {
      root,
      artifact_name,
      artifact_path,
      temp_path,
      write_lock: Mutex::new(()),
    })
  }

  pub fn root(&self) -> &InstallRoot {
    &self.root
  }

  async fn remove_temp(&self) {
    if let Err(e) = fs::remove_file(&self.temp_path).await
      && e.kind() != io::ErrorKind::NotFound
    {
      warn!(
        path = %self.temp_path.display(),
        error = %e,
        "failed to remove temporary configuration file"
      );
    }
  }
}

#[async_trait]
impl ConfigStore for FsConfigStore {
  #[instrument(
    name = "config_save",
    skip(self, record),
    fields(path = %self.artifact_path.display(), run_name = %record.run.run_name)
  )]
  async fn save(&self, record: &ParameterRecord) -> Result<(), WriteError> {
    if let Err(e) = record.validate() {
      error!(error = %e, "rejected parameter record");
      return Err(e.into());
    }

    if !record.geometry.shape.is_known() {
      warn!(
        shape = %record.geometry.shape,
        "shape is not one the bundled executable recognizes"
      );
    }

    let contents = record
      .to_artifact_json()
      .map_err(|e| WriteError::from_io(&self.artifact_path, io::Error::from(e)))?;

    let _guard = self.write_lock.lock().await;

    if let Err(e) = self.root.confine(&self.artifact_path).await {
      error!(error = %e, "refusing to write configuration");
      return Err(e.into());
    }

    let written = write_replace(&self.temp_path, &self.artifact_path, contents.as_bytes()).await;
    if let Err(e) = written {
      self.remove_temp().await;
      let err = WriteError::from_io(&self.artifact_path, e);
      error!(error = %err, "failed to save configuration");
      return Err(err);
    }

    info!(bytes = contents.len(), "configuration saved");
    Ok(())
  }

  async fn load(&self) -> Result<ParameterRecord, ReadError> {
    self.root.confine(&self.artifact_path).await?;

    let content = fs::read_to_string(&self.artifact_path)
      .await
      .map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
          ReadError::NotFound {
            path: self.artifact_path.clone(),
          }
        } else {
          ReadError::Io {
            path: self.artifact_path.clone(),
            source: e,
          }
        }
      })?;

    serde_json::from_str(&content).map_err(|source| ReadError::Malformed {
      path: self.artifact_path.clone(),
      source,
    })
  }

  fn artifact_name(&self) -> &str {
    &self.artifact_name
  }

  fn artifact_path(&self) -> &Path {
    &self.artifact_path
  }
}

/// Write `contents` to `temp`, sync it, then rename it over `target`.
async fn write_replace(temp: &Path, target: &Path, contents: &[u8]) -> io::Result<()> {
  // A leftover from an interrupted save; create_new below must not follow it.
  match fs::remove_file(temp).await {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }

  let mut file = OpenOptions::new()
    .write(true)
    .create_new(true)
    .open(temp)
    .await?;
  file.write_all(contents).await?;
  file.flush().await?;
  file.sync_all().await?;
  drop(file);

  fs::rename(temp, target).await
}
