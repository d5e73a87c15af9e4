//! Simulation run result.

use crate::error::RunError;

/// What a successful run produced.
#[derive(Debug)]
pub struct ExecutionOutput {
  /// Captured standard output.
  pub stdout: String,
  /// Captured standard error. Does not affect success.
  pub stderr: String,
  /// Exit code, if the platform reported one.
  pub exit_code: Option<i32>,
  /// Non-fatal problems hit while preparing the run.
  pub warnings: Vec<RunError>,
}
