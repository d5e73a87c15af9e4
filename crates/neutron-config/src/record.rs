use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One simulation request, as collected by the presentation layer.
///
/// Field order is the serialization order, and the serialized key order is
/// part of the artifact format. Do not reorder fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterRecord {
  pub run: RunParams,
  pub material: MaterialParams,
  pub geometry: GeometryParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunParams {
  /// Label for the run; the executable names its output directory after it.
  pub run_name: String,
  /// Number of simulation trials.
  pub simulations: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialParams {
  /// Mean free path (or decay constant).
  pub lambda: f64,
  /// Absorption probability.
  pub pabs: f64,
  /// Material-specific coefficient.
  pub k: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeometryParams {
  pub shape: Shape,
}

/// Geometry identifier.
///
/// The value space belongs to the simulation executable, so any non-empty
/// string is carried through. [`Shape::KNOWN`] lists the identifiers the
/// bundled executable understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(String);

impl Shape {
  pub const KNOWN: [&'static str; 4] = ["regular_slab", "sphere", "finite_slab", "double_slab"];

  pub fn new(shape: impl Into<String>) -> Self {
    Self(shape.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether the bundled executable is known to accept this shape.
  pub fn is_known(&self) -> bool {
    Self::KNOWN.contains(&self.0.as_str())
  }
}

impl fmt::Display for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Shape {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl ParameterRecord {
  /// Check the structural invariants. Returns the first violation found.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.run.run_name.trim().is_empty() {
      return Err(ValidationError::EmptyRunName);
    }
    if self.run.simulations == 0 {
      return Err(ValidationError::NonPositiveSimulations(self.run.simulations));
    }

    let MaterialParams { lambda, pabs, k } = self.material;
    if !lambda.is_finite() || lambda <= 0.0 {
      return Err(ValidationError::InvalidLambda(lambda));
    }
    // NaN fails the range check too
    if !(0.0..=1.0).contains(&pabs) {
      return Err(ValidationError::PabsOutOfRange(pabs));
    }
    if !k.is_finite() {
      return Err(ValidationError::NonFiniteK(k));
    }

    if self.geometry.shape.as_str().trim().is_empty() {
      return Err(ValidationError::EmptyShape);
    }

    Ok(())
  }

  /// Render the record in the artifact format: pretty JSON, 2-space indent,
  /// keys in declaration order, no trailing newline.
  pub fn to_artifact_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}
