//! The externally observable outcome of one submission.

use serde::{Deserialize, Serialize};

pub const UNKNOWN_COMPILATION_ERROR: &str = "Unknown compilation error";

/// Serializes as `{"status": "<kind>", "output": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "output")]
pub enum ExecutionResult {
    Success(String),
    CompilationError(String),
    RuntimeError(String),
    TimeoutError(String),
    #[serde(rename = "Error")]
    InfrastructureError(String),
}

impl ExecutionResult {
    pub fn status(&self) -> &'static str {
        match self {
            ExecutionResult::Success(_) => "Success",
            ExecutionResult::CompilationError(_) => "CompilationError",
            ExecutionResult::RuntimeError(_) => "RuntimeError",
            ExecutionResult::TimeoutError(_) => "TimeoutError",
            ExecutionResult::InfrastructureError(_) => "Error",
        }
    }

    pub fn output(&self) -> &str {
        match self {
            ExecutionResult::Success(s)
            | ExecutionResult::CompilationError(s)
            | ExecutionResult::RuntimeError(s)
            | ExecutionResult::TimeoutError(s)
            | ExecutionResult::InfrastructureError(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let value = serde_json::to_value(ExecutionResult::Success("hello-42\n".into())).unwrap();
        assert_eq!(value, json!({"status": "Success", "output": "hello-42\n"}));

        let value =
            serde_json::to_value(ExecutionResult::InfrastructureError("disk full".into())).unwrap();
        assert_eq!(value, json!({"status": "Error", "output": "disk full"}));
    }

    #[test]
    fn status_matches_serialized_tag() {
        let results = [
            ExecutionResult::Success(String::new()),
            ExecutionResult::CompilationError(String::new()),
            ExecutionResult::RuntimeError(String::new()),
            ExecutionResult::TimeoutError(String::new()),
            ExecutionResult::InfrastructureError(String::new()),
        ];
        for result in results {
            let value = serde_json::to_value(&result).unwrap();
            assert_eq!(value["status"], result.status());
        }
    }
}
