//! Neutron Store
//!
//! This crate provides the configuration store: the single artifact the
//! simulation executable reads its parameters from.
//!
//! The [`ConfigStore`] trait is the handle components hold to "the current
//! configuration". It is passed around explicitly rather than reached through
//! global state, so tests can point a store at a scratch directory.
//! [`FsConfigStore`] keeps the artifact as a JSON file directly under the
//! installation root and replaces it atomically on every save.

mod error;
mod fs;

pub use error::{ReadError, WriteError};
pub use fs::{DEFAULT_ARTIFACT_NAME, FsConfigStore};

use std::path::Path;

use async_trait::async_trait;
use neutron_config::ParameterRecord;

/// Configuration store trait.
///
/// Exactly one artifact exists per store. `save` replaces it in full.
#[async_trait]
pub trait ConfigStore: Send + Sync {
  /// Validate and persist a record, replacing the current artifact.
  async fn save(&self, record: &ParameterRecord) -> Result<(), WriteError>;

  /// Read the current artifact back.
  async fn load(&self) -> Result<ParameterRecord, ReadError>;

  /// File name of the artifact, as handed to the simulation executable.
  fn artifact_name(&self) -> &str;

  /// Absolute path of the artifact.
  fn artifact_path(&self) -> &Path;
}
