use std::fmt;

/// Lifecycle of a single run.
///
/// `Idle → Locating → Preparing → Running → {Succeeded, Failed}`. A runner
/// reports the state of its latest run; the next run starts again from
/// `Locating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
  Idle,
  Locating,
  Preparing,
  Running,
  Succeeded,
  Failed,
}

impl RunState {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Succeeded | Self::Failed)
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Idle => "idle",
      Self::Locating => "locating",
      Self::Preparing => "preparing",
      Self::Running => "running",
      Self::Succeeded => "succeeded",
      Self::Failed => "failed",
    };
    f.write_str(name)
  }
}
