//! Model records and task states as reported by the cluster's ML plugin

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task state reported for a finished long-running operation.
pub const TASK_STATE_COMPLETED: &str = "COMPLETED";

/// Task state reported when a long-running operation failed.
pub const TASK_STATE_FAILED: &str = "FAILED";

/// Deployment state a model must report before it can serve inference.
pub const MODEL_STATE_DEPLOYED: &str = "DEPLOYED";

/// One registered model as listed by the cluster.
///
/// `name` is not unique (every version of a model shares it); `id` is the
/// cluster-assigned unique identifier. Records are rebuilt on every catalog
/// fetch and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub version: String,
    pub id: String,
}

impl ModelRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ModelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.id)
    }
}

/// Serialized format of a registered model binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelFormat {
    TorchScript,
    Onnx,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::TorchScript => write!(f, "TORCH_SCRIPT"),
            ModelFormat::Onnx => write!(f, "ONNX"),
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "torch_script" | "torchscript" => Ok(ModelFormat::TorchScript),
            "onnx" => Ok(ModelFormat::Onnx),
            other => Err(format!("Unknown model format: {}", other)),
        }
    }
}

/// Status of a long-running cluster task, as returned by the task endpoint.
///
/// `state` stays a plain string on purpose: the poller only distinguishes the
/// two terminal values and treats everything else as still in progress, so
/// states added by future cluster versions flow through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
}

impl TaskStatus {
    /// True once the task can never make further progress.
    pub fn is_terminal(&self) -> bool {
        self.state == TASK_STATE_COMPLETED || self.state == TASK_STATE_FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_format_wire_names() {
        assert_eq!(ModelFormat::TorchScript.to_string(), "TORCH_SCRIPT");
        assert_eq!(ModelFormat::Onnx.to_string(), "ONNX");
        assert_eq!(
            serde_json::to_value(ModelFormat::TorchScript).unwrap(),
            json!("TORCH_SCRIPT")
        );
        assert_eq!(
            "torchscript".parse::<ModelFormat>().unwrap(),
            ModelFormat::TorchScript
        );
        assert!("gguf".parse::<ModelFormat>().is_err());
    }

    #[test]
    fn test_task_status_parses_unknown_states() {
        let status: TaskStatus = serde_json::from_value(json!({
            "state": "CANCELLING",
            "task_type": "REGISTER_MODEL",
        }))
        .unwrap();

        assert_eq!(status.state, "CANCELLING");
        assert!(!status.is_terminal());
        assert!(status.error.is_none());
    }

    #[test]
    fn test_task_status_terminal_states() {
        let done: TaskStatus = serde_json::from_value(json!({
            "state": "COMPLETED",
            "model_id": "N8AE1osB0jLkkocY6j4U",
        }))
        .unwrap();
        assert!(done.is_terminal());

        let failed: TaskStatus = serde_json::from_value(json!({
            "state": "FAILED",
            "error": "native memory circuit breaker is open",
        }))
        .unwrap();
        assert!(failed.is_terminal());
        assert_eq!(
            failed.error.as_deref(),
            Some("native memory circuit breaker is open")
        );
    }

    #[test]
    fn test_record_display() {
        let record = ModelRecord::new("msmarco-distilbert", "1.0.1", "xK9aBc");
        assert_eq!(record.to_string(), "msmarco-distilbert v1.0.1 (xK9aBc)");
    }
}
