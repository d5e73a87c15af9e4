//! Simulation process runner for neutron.
//!
//! This crate provides the [`ProcessRunner`] which locates the simulation
//! executable under the installation root, makes sure it can be launched,
//! runs it against the saved configuration artifact and captures what it
//! prints. Output is bounded, runs on one runner never overlap, and a
//! cancelled run takes its child process down with it.

mod capture;
mod error;
mod prepare;
mod result;
mod runner;
mod state;

pub use error::{OutputStream, RunError};
pub use result::ExecutionOutput;
pub use runner::{
  DEFAULT_INTERPRETER, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SCRIPT_NAME, ProcessRunner, RunnerConfig,
};
pub use state::RunState;
