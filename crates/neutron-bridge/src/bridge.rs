//! Save/run bridge.

use std::path::PathBuf;
use std::sync::Arc;

use neutron_config::{InstallRoot, ParameterRecord, PathError};
use neutron_runner::{
  DEFAULT_INTERPRETER, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SCRIPT_NAME, ExecutionOutput, ProcessRunner,
  RunnerConfig,
};
use neutron_store::{ConfigStore, DEFAULT_ARTIFACT_NAME, FsConfigStore};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::BridgeError;

/// Configuration for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
  /// Installation root; holds the artifact and the simulation script.
  pub root: InstallRoot,
  pub artifact_name: String,
  pub script_name: String,
  /// Program to launch the script with, `bash` by default. `None` executes
  /// it directly.
  pub interpreter: Option<PathBuf>,
  /// Per-stream capture limit for the simulation's output.
  pub max_output_bytes: usize,
}

impl BridgeConfig {
  pub fn new(root: InstallRoot) -> Self {
    Self {
      root,
      artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
      script_name: DEFAULT_SCRIPT_NAME.to_string(),
      interpreter: Some(PathBuf::from(DEFAULT_INTERPRETER)),
      max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
    }
  }

  fn runner_config(&self) -> RunnerConfig {
    RunnerConfig {
      root: self.root.clone(),
      script_name: self.script_name.clone(),
      artifact_name: self.artifact_name.clone(),
      interpreter: self.interpreter.clone(),
      max_output_bytes: self.max_output_bytes,
    }
  }
}

/// The caller-facing pair of operations.
///
/// Saves and runs share one artifact. A save waits for in-flight runs and
/// blocks new ones until it completes, so every run sees the most recently
/// completed save and the executable never has its configuration replaced
/// underneath it.
pub struct Bridge {
  store: Arc<dyn ConfigStore>,
  runner: ProcessRunner,
  artifact_guard: RwLock<()>,
}

impl Bridge {
  /// Create a bridge backed by the filesystem store under `config.root`.
  pub fn new(config: BridgeConfig) -> Result<Self, PathError> {
    let store = FsConfigStore::with_artifact_name(config.root.clone(), &config.artifact_name)?;
    Ok(Self::with_store(Arc::new(store), config.runner_config()))
  }

  /// Create a bridge around an existing store.
  ///
  /// The runner hands the executable the store's artifact name, resolved
  /// against the runner's root, so the store must keep its artifact there.
  pub fn with_store(store: Arc<dyn ConfigStore>, mut runner: RunnerConfig) -> Self {
    runner.artifact_name = store.artifact_name().to_string();
    Self {
      store,
      runner: ProcessRunner::new(runner),
      artifact_guard: RwLock::new(()),
    }
  }

  pub fn store(&self) -> &Arc<dyn ConfigStore> {
    &self.store
  }

  pub fn runner(&self) -> &ProcessRunner {
    &self.runner
  }

  /// Persist `record` as the current configuration.
  pub async fn save_config(&self, record: ParameterRecord) -> Result<(), BridgeError> {
    let _guard = self.artifact_guard.write().await;
    self.store.save(&record).await?;
    Ok(())
  }

  /// Read the current configuration back.
  pub async fn load_config(&self) -> Result<ParameterRecord, BridgeError> {
    let _guard = self.artifact_guard.read().await;
    Ok(self.store.load().await?)
  }

  /// Run the simulation against the current configuration and return its
  /// standard output.
  pub async fn run_simulation(&self, cancel: CancellationToken) -> Result<String, BridgeError> {
    self
      .run_simulation_report(cancel)
      .await
      .map(|output| output.stdout)
  }

  /// Like [`Bridge::run_simulation`] but keeps stderr, exit code and
  /// preparation warnings.
  pub async fn run_simulation_report(
    &self,
    cancel: CancellationToken,
  ) -> Result<ExecutionOutput, BridgeError> {
    let _guard = self.artifact_guard.read().await;
    info!(artifact = %self.store.artifact_path().display(), "running simulation");
    Ok(self.runner.execute(cancel).await?)
  }
}
