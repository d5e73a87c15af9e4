use neutron_config::ParameterRecord;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ErrorKind};

/// Outcome of a bridge operation in the shape the presentation layer reads.
///
/// ```json
/// { "status": "ok", "output": "OK: 1000 particles processed" }
/// { "status": "error", "kind": "script_not_found", "message": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeResponse {
  Ok {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<ParameterRecord>,
  },
  Error {
    kind: ErrorKind,
    message: String,
  },
}

impl BridgeResponse {
  pub fn saved() -> Self {
    Self::Ok {
      output: None,
      config: None,
    }
  }

  pub fn output(output: impl Into<String>) -> Self {
    Self::Ok {
      output: Some(output.into()),
      config: None,
    }
  }

  pub fn config(record: ParameterRecord) -> Self {
    Self::Ok {
      output: None,
      config: Some(record),
    }
  }

  pub fn is_ok(&self) -> bool {
    matches!(self, Self::Ok { .. })
  }
}

impl From<&BridgeError> for BridgeResponse {
  fn from(error: &BridgeError) -> Self {
    Self::Error {
      kind: error.kind(),
      message: error.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use neutron_runner::RunError;
  use serde_json::json;

  use super::*;

  #[test]
  fn test_saved_shape() {
    let value = serde_json::to_value(BridgeResponse::saved()).unwrap();
    assert_eq!(value, json!({ "status": "ok" }));
  }

  #[test]
  fn test_output_shape() {
    let value = serde_json::to_value(BridgeResponse::output("OK: 1000 particles processed")).unwrap();
    assert_eq!(
      value,
      json!({ "status": "ok", "output": "OK: 1000 particles processed" })
    );
  }

  #[test]
  fn test_error_shape() {
    let error = BridgeError::from(RunError::Cancelled);
    let response = BridgeResponse::from(&error);

    assert!(!response.is_ok());
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
      value,
      json!({
        "status": "error",
        "kind": "cancelled",
        "message": "simulation run cancelled"
      })
    );
  }

  #[test]
  fn test_error_round_trips() {
    let text = r#"{"status":"error","kind":"execution_failed","message":"boom"}"#;
    let response: BridgeResponse = serde_json::from_str(text).unwrap();
    assert_eq!(
      response,
      BridgeResponse::Error {
        kind: ErrorKind::ExecutionFailed,
        message: "boom".to_string()
      }
    );
  }
}
