//! Failure types and structured representation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ShapeError;

/// Type of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Item key set differs from the schema
    ShapeMismatch,
    /// Field value has the wrong primitive kind
    TypeMismatch,
    /// Non-nullable field holds null
    NullabilityViolation,
    /// Status code differs from the expected one
    UnexpectedStatus,
    /// Body is not the expected array or error object
    UnexpectedBodyShape,
    /// Request never produced a response
    TransportError,
}

impl FailureKind {
    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ShapeMismatch => "Item keys do not match the field schema",
            Self::TypeMismatch => "Field value has the wrong type",
            Self::NullabilityViolation => "Non-nullable field is null",
            Self::UnexpectedStatus => "Unexpected status code",
            Self::UnexpectedBodyShape => "Unexpected response body",
            Self::TransportError => "Request failed before a response arrived",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot of HTTP request for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    /// Path and query as sent, relative to the server base
    pub url: String,
}

/// Snapshot of HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

/// One failed assertion within a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CaseFailure {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Failure for the item at `index` of a result array.
    #[must_use]
    pub fn from_shape(index: usize, err: &ShapeError) -> Self {
        let kind = match err {
            ShapeError::NotAnObject { .. } | ShapeError::ShapeMismatch { .. } => {
                FailureKind::ShapeMismatch
            }
            ShapeError::TypeMismatch { .. } => FailureKind::TypeMismatch,
            ShapeError::NullabilityViolation { .. } => FailureKind::NullabilityViolation,
        };
        Self::new(kind, format!("item[{index}]: {err}"))
    }
}

impl std::fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
