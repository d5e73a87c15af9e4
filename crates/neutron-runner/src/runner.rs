//! Process runner implementation.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use neutron_config::InstallRoot;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::capture::{Captured, read_bounded};
use crate::error::{OutputStream, RunError};
use crate::prepare::ensure_executable;
use crate::result::ExecutionOutput;
use crate::state::RunState;

/// Script the installation ships as the simulation entry point.
pub const DEFAULT_SCRIPT_NAME: &str = "Particle_Transport.sh";

/// Program the script is handed to unless direct execution is requested.
pub const DEFAULT_INTERPRETER: &str = "bash";

/// Per-stream capture limit.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 5 * 1024 * 1024;

/// How to find and launch the simulation.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
  /// Directory holding both the script and the configuration artifact.
  /// Also the child's working directory.
  pub root: InstallRoot,
  /// File name of the script under `root`.
  pub script_name: String,
  /// File name of the configuration artifact, passed as the only argument.
  pub artifact_name: String,
  /// Program to launch the script with, `bash` by default. When unset the
  /// script is executed directly and must carry its own `#!` line.
  pub interpreter: Option<PathBuf>,
  /// Limit applied to stdout and stderr separately.
  pub max_output_bytes: usize,
}

impl RunnerConfig {
  /// Defaults for the bundled simulation.
  pub fn new(root: InstallRoot, artifact_name: impl Into<String>) -> Self {
    Self {
      root,
      script_name: DEFAULT_SCRIPT_NAME.to_string(),
      artifact_name: artifact_name.into(),
      interpreter: Some(PathBuf::from(DEFAULT_INTERPRETER)),
      max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
    }
  }
}

/// Runs the simulation executable, one invocation at a time.
///
/// A second call while a run is in flight waits for the first to finish;
/// every run captures into its own buffers.
pub struct ProcessRunner {
  config: RunnerConfig,
  run_lock: Mutex<()>,
  state: watch::Sender<RunState>,
}

impl ProcessRunner {
  pub fn new(config: RunnerConfig) -> Self {
    let (state, _) = watch::channel(RunState::Idle);
    Self {
      config,
      run_lock: Mutex::new(()),
      state,
    }
  }

  pub fn config(&self) -> &RunnerConfig {
    &self.config
  }

  /// State of the latest run.
  pub fn state(&self) -> RunState {
    *self.state.borrow()
  }

  /// Watch state transitions.
  pub fn subscribe(&self) -> watch::Receiver<RunState> {
    self.state.subscribe()
  }

  /// Run the simulation and return its standard output.
  pub async fn run(&self, cancel: CancellationToken) -> Result<String, RunError> {
    self.execute(cancel).await.map(|output| output.stdout)
  }

  /// Run the simulation and return everything it produced.
  #[instrument(
    name = "simulation_run",
    skip(self, cancel),
    fields(
      script = %self.config.script_name,
      artifact = %self.config.artifact_name,
    )
  )]
  pub async fn execute(&self, cancel: CancellationToken) -> Result<ExecutionOutput, RunError> {
    let _guard = self.run_lock.lock().await;
    info!("simulation run started");

    let result = self.execute_inner(&cancel).await;

    match &result {
      Ok(output) => {
        self.transition(RunState::Succeeded);
        info!(
          exit_code = ?output.exit_code,
          stdout_bytes = output.stdout.len(),
          "simulation run succeeded"
        );
      }
      Err(e) => {
        self.transition(RunState::Failed);
        error!(error = %e, "simulation run failed");
      }
    }

    result
  }

  async fn execute_inner(&self, cancel: &CancellationToken) -> Result<ExecutionOutput, RunError> {
    if cancel.is_cancelled() {
      return Err(RunError::Cancelled);
    }

    self.transition(RunState::Locating);
    let script = self.locate().await?;

    self.transition(RunState::Preparing);
    let mut warnings = Vec::new();
    match ensure_executable(&script).await {
      Ok(true) => debug!(path = %script.display(), "set executable bits on script"),
      Ok(false) => {}
      Err(e) => {
        warn!(error = %e, "continuing without adjusting script permissions");
        warnings.push(e);
      }
    }

    self.transition(RunState::Running);
    let program = self.config.interpreter.as_deref().unwrap_or(script.as_path());
    let mut child = self
      .command(&script)
      .spawn()
      .map_err(|e| RunError::launch(program, e))?;
    debug!(pid = ?child.id(), "simulation process spawned");

    let (stdout, stderr) = self.capture(&mut child, cancel).await?;

    let status = tokio::select! {
      _ = cancel.cancelled() => {
        terminate(&mut child).await;
        return Err(RunError::Cancelled);
      }
      status = child.wait() => {
        status.map_err(|e| RunError::io("failed to wait for simulation process", e))?
      }
    };

    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    if !status.success() {
      let message = if stderr.trim().is_empty() {
        format!("process exited with {}", status)
      } else {
        stderr.trim_end().to_string()
      };
      return Err(RunError::ExecutionFailed {
        message,
        exit_code: status.code(),
      });
    }

    if !stderr.trim().is_empty() {
      warn!(stderr = %stderr.trim_end(), "simulation wrote to stderr");
    }

    Ok(ExecutionOutput {
      stdout,
      stderr,
      exit_code: status.code(),
      warnings,
    })
  }

  /// Resolve the script under the root and check there is a file to launch.
  async fn locate(&self) -> Result<PathBuf, RunError> {
    let root = &self.config.root;
    root.resolve(&self.config.artifact_name)?;
    let path = root.resolve(&self.config.script_name)?;

    match tokio::fs::metadata(&path).await {
      Ok(metadata) if metadata.is_file() => {}
      Ok(_) => return Err(RunError::ScriptNotFound { path }),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(RunError::ScriptNotFound { path });
      }
      Err(e) => {
        return Err(RunError::io(
          format!("failed to inspect {}", path.display()),
          e,
        ));
      }
    }

    root.confine(&path).await?;
    Ok(path)
  }

  fn command(&self, script: &Path) -> Command {
    let mut command = match &self.config.interpreter {
      Some(interpreter) => {
        let mut command = Command::new(interpreter);
        command.arg(script);
        command
      }
      None => Command::new(script),
    };

    command
      .arg(&self.config.artifact_name)
      .current_dir(self.config.root.path())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);
    command
  }

  /// Drain stdout and stderr concurrently until both hit EOF.
  async fn capture(
    &self,
    child: &mut Child,
    cancel: &CancellationToken,
  ) -> Result<(Vec<u8>, Vec<u8>), RunError> {
    let limit = self.config.max_output_bytes;
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
      terminate(child).await;
      return Err(RunError::io(
        "simulation output was not captured",
        io::Error::other("missing pipe"),
      ));
    };

    let stdout = read_bounded(stdout, limit);
    let stderr = read_bounded(stderr, limit);
    tokio::pin!(stdout, stderr);

    let mut out: Option<Vec<u8>> = None;
    let mut err: Option<Vec<u8>> = None;

    while out.is_none() || err.is_none() {
      tokio::select! {
        _ = cancel.cancelled() => {
          terminate(child).await;
          return Err(RunError::Cancelled);
        }
        captured = &mut stdout, if out.is_none() => {
          out = Some(settle(child, captured, OutputStream::Stdout, limit).await?);
        }
        captured = &mut stderr, if err.is_none() => {
          err = Some(settle(child, captured, OutputStream::Stderr, limit).await?);
        }
      }
    }

    Ok((out.unwrap_or_default(), err.unwrap_or_default()))
  }

  fn transition(&self, state: RunState) {
    debug!(%state, "run state changed");
    self.state.send_replace(state);
  }
}

/// Turn a finished stream read into bytes, killing the child on failure.
async fn settle(
  child: &mut Child,
  captured: io::Result<Captured>,
  stream: OutputStream,
  limit: usize,
) -> Result<Vec<u8>, RunError> {
  match captured {
    Ok(Captured {
      overflowed: true, ..
    }) => {
      terminate(child).await;
      Err(RunError::OutputTooLarge { stream, limit })
    }
    Ok(Captured { bytes, .. }) => Ok(bytes),
    Err(e) => {
      terminate(child).await;
      Err(RunError::io(format!("failed to read simulation {}", stream), e))
    }
  }
}

async fn terminate(child: &mut Child) {
  if let Err(e) = child.kill().await {
    warn!(error = %e, "failed to kill simulation process");
  }
}
