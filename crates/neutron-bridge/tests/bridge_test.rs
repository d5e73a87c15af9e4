//! Integration tests for Bridge: save, then hand the artifact to a script.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use neutron_bridge::{
  Bridge, BridgeConfig, BridgeResponse, ConfigStore, ErrorKind, InstallRoot, ParameterRecord,
};
use neutron_config::{GeometryParams, MaterialParams, RunParams, Shape};
use neutron_runner::RunnerConfig;
use neutron_store::{ReadError, WriteError};
use tokio_util::sync::CancellationToken;

fn test_record(run_name: &str) -> ParameterRecord {
  ParameterRecord {
    run: RunParams {
      run_name: run_name.to_string(),
      simulations: 1000,
    },
    material: MaterialParams {
      lambda: 0.5,
      pabs: 0.3,
      k: 1.0,
    },
    geometry: GeometryParams {
      shape: Shape::new("sphere"),
    },
  }
}

/// Bridge over a scratch root whose script prints the artifact it was given.
fn create_bridge() -> (Bridge, tempfile::TempDir) {
  let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
  std::fs::write(
    temp_dir.path().join("Particle_Transport.sh"),
    "#!/bin/sh\ncat \"$1\"\n",
  )
  .unwrap();

  let root = InstallRoot::new(temp_dir.path()).unwrap();
  let mut config = BridgeConfig::new(root);
  config.interpreter = Some(PathBuf::from("sh"));
  let bridge = Bridge::new(config).expect("failed to create bridge");
  (bridge, temp_dir)
}

#[tokio::test]
async fn test_run_sees_saved_configuration() {
  let (bridge, _dir) = create_bridge();
  let record = test_record("test1");

  bridge.save_config(record.clone()).await.expect("save failed");
  let stdout = bridge
    .run_simulation(CancellationToken::new())
    .await
    .expect("run failed");

  let seen: ParameterRecord = serde_json::from_str(&stdout).expect("script output not a record");
  assert_eq!(seen, record);
  assert_eq!(stdout, record.to_artifact_json().unwrap());
}

#[tokio::test]
async fn test_run_sees_latest_save() {
  let (bridge, _dir) = create_bridge();

  bridge.save_config(test_record("first")).await.unwrap();
  bridge.save_config(test_record("second")).await.unwrap();
  let stdout = bridge.run_simulation(CancellationToken::new()).await.unwrap();

  let seen: ParameterRecord = serde_json::from_str(&stdout).unwrap();
  assert_eq!(seen.run.run_name, "second");
}

#[tokio::test]
async fn test_run_before_any_save_reports_stderr() {
  let (bridge, _dir) = create_bridge();

  let err = bridge
    .run_simulation(CancellationToken::new())
    .await
    .unwrap_err();

  assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
  assert!(err.to_string().contains("config.json"));
}

#[tokio::test]
async fn test_missing_script_response() {
  let temp_dir = tempfile::tempdir().unwrap();
  let root = InstallRoot::new(temp_dir.path()).unwrap();
  let bridge = Bridge::new(BridgeConfig::new(root)).unwrap();

  let err = bridge
    .run_simulation(CancellationToken::new())
    .await
    .unwrap_err();
  let response = BridgeResponse::from(&err);

  match response {
    BridgeResponse::Error { kind, message } => {
      assert_eq!(kind, ErrorKind::ScriptNotFound);
      assert!(message.contains("Particle_Transport.sh"));
    }
    other => panic!("expected error response, got {:?}", other),
  }
}

#[tokio::test]
async fn test_invalid_record_response() {
  let (bridge, dir) = create_bridge();
  let mut record = test_record("bad");
  record.material.pabs = -0.1;

  let err = bridge.save_config(record).await.unwrap_err();

  assert_eq!(err.kind(), ErrorKind::InvalidRecord);
  assert!(!dir.path().join("config.json").exists());
}

#[tokio::test]
async fn test_load_config() {
  let (bridge, _dir) = create_bridge();
  let err = bridge.load_config().await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  bridge.save_config(test_record("shown")).await.unwrap();
  let loaded = bridge.load_config().await.unwrap();
  assert_eq!(loaded.run.run_name, "shown");
}

/// Store that records saves in memory and mirrors them to a file so the
/// script still has something to read.
struct RecordingStore {
  path: PathBuf,
  saved: Mutex<Vec<ParameterRecord>>,
}

#[async_trait]
impl ConfigStore for RecordingStore {
  async fn save(&self, record: &ParameterRecord) -> Result<(), WriteError> {
    record.validate()?;
    let json = record.to_artifact_json().unwrap();
    std::fs::write(&self.path, json).map_err(|e| WriteError::from_io(&self.path, e))?;
    self.saved.lock().unwrap().push(record.clone());
    Ok(())
  }

  async fn load(&self) -> Result<ParameterRecord, ReadError> {
    self
      .saved
      .lock()
      .unwrap()
      .last()
      .cloned()
      .ok_or_else(|| ReadError::NotFound {
        path: self.path.clone(),
      })
  }

  fn artifact_name(&self) -> &str {
    "params.json"
  }

  fn artifact_path(&self) -> &Path {
    &self.path
  }
}

#[tokio::test]
async fn test_injected_store_drives_artifact_name() {
  let (_, temp_dir) = create_bridge();
  let root = InstallRoot::new(temp_dir.path()).unwrap();
  let store = Arc::new(RecordingStore {
    path: root.path().join("params.json"),
    saved: Mutex::new(Vec::new()),
  });

  let mut runner = RunnerConfig::new(root, "ignored.json");
  runner.interpreter = Some(PathBuf::from("sh"));
  let bridge = Bridge::with_store(store.clone(), runner);

  bridge.save_config(test_record("injected")).await.unwrap();
  let stdout = bridge.run_simulation(CancellationToken::new()).await.unwrap();

  assert_eq!(bridge.runner().config().artifact_name, "params.json");
  assert_eq!(store.saved.lock().unwrap().len(), 1);
  let seen: ParameterRecord = serde_json::from_str(&stdout).unwrap();
  assert_eq!(seen.run.run_name, "injected");
}

#[tokio::test]
async fn test_save_waits_for_running_simulation() {
  let temp_dir = tempfile::tempdir().unwrap();
  std::fs::write(
    temp_dir.path().join("Particle_Transport.sh"),
    "#!/bin/sh\nsleep 1\ncat \"$1\"\n",
  )
  .unwrap();
  let root = InstallRoot::new(temp_dir.path()).unwrap();
  let mut config = BridgeConfig::new(root);
  config.interpreter = Some(PathBuf::from("sh"));
  let bridge = Arc::new(Bridge::new(config).unwrap());

  bridge.save_config(test_record("before")).await.unwrap();

  let run = tokio::spawn({
    let bridge = bridge.clone();
    async move { bridge.run_simulation(CancellationToken::new()).await }
  });
  // Let the run take the artifact guard first.
  tokio::time::sleep(std::time::Duration::from_millis(200)).await;
  bridge.save_config(test_record("after")).await.unwrap();

  let stdout = run.await.unwrap().unwrap();
  let seen: ParameterRecord = serde_json::from_str(&stdout).unwrap();
  assert_eq!(seen.run.run_name, "before");
  assert_eq!(bridge.load_config().await.unwrap().run.run_name, "after");
}
