//! Function executors
//!
//! One executor per registered function. Executors are external
//! collaborators from the orchestrator's point of view: their failures are
//! data (`FunctionResult::Failure`), never a fatal condition for the chat
//! request — the model gets the failure back as the function's result and
//! can explain it conversationally.

pub mod currency;
pub mod news;
pub mod normalize;
pub mod weather;

pub use currency::CurrencyFunction;
pub use news::NewsFunction;
pub use weather::WeatherFunction;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::registry::{FunctionSpec, ValidatedArgs};

/// Failure classification for a single function dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallFailureKind {
    /// The model named a function that is not registered
    UnknownFunction,
    /// The model's arguments failed schema validation
    BadArgument,
    /// The executor failed at runtime (provider unreachable, timeout, ...)
    ExecutionError,
}

impl CallFailureKind {
    /// Stable snake_case identifier, used in payloads and the call log
    pub fn as_str(&self) -> &'static str {
        match self {
            CallFailureKind::UnknownFunction => "unknown_function",
            CallFailureKind::BadArgument => "bad_argument",
            CallFailureKind::ExecutionError => "execution_error",
        }
    }
}

impl std::fmt::Display for CallFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable dispatch failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    /// Failure kind
    pub kind: CallFailureKind,
    /// Human-readable detail, safe to show to the model
    pub message: String,
}

impl CallFailure {
    /// Create a failure with the given kind and detail
    pub fn new(kind: CallFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a bad-argument failure
    pub fn bad_argument(message: impl Into<String>) -> Self {
        Self::new(CallFailureKind::BadArgument, message)
    }

    /// Shorthand for an execution failure
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(CallFailureKind::ExecutionError, message)
    }

    /// Shorthand for an unknown-function failure
    pub fn unknown_function(name: &str) -> Self {
        Self::new(
            CallFailureKind::UnknownFunction,
            format!("unknown function: {name}"),
        )
    }
}

impl std::fmt::Display for CallFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of executing (or failing to execute) a function
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResult {
    /// The executor produced a result payload
    Success(Value),
    /// Dispatch failed; carried back to the model as data
    Failure(CallFailure),
}

impl FunctionResult {
    /// Create a success result
    pub fn success(payload: Value) -> Self {
        FunctionResult::Success(payload)
    }

    /// Create a failure result
    pub fn failure(kind: CallFailureKind, message: impl Into<String>) -> Self {
        FunctionResult::Failure(CallFailure::new(kind, message))
    }

    /// Whether this result is a success
    pub fn is_success(&self) -> bool {
        matches!(self, FunctionResult::Success(_))
    }

    /// Failure kind, if any
    pub fn error_kind(&self) -> Option<CallFailureKind> {
        match self {
            FunctionResult::Success(_) => None,
            FunctionResult::Failure(f) => Some(f.kind),
        }
    }

    /// Serialize into the content of a function-role message
    pub fn to_payload(&self) -> Value {
        match self {
            FunctionResult::Success(v) => v.clone(),
            FunctionResult::Failure(f) => json!({
                "error": {
                    "kind": f.kind.as_str(),
                    "message": f.message,
                }
            }),
        }
    }
}

impl From<CallFailure> for FunctionResult {
    fn from(failure: CallFailure) -> Self {
        FunctionResult::Failure(failure)
    }
}

/// Trait implemented by each registered function's executor
#[async_trait::async_trait]
pub trait FunctionExecutor: Send + Sync {
    /// The signature this executor fulfils
    fn spec(&self) -> FunctionSpec;

    /// Execute the function with validated arguments
    async fn execute(&self, args: &ValidatedArgs) -> FunctionResult;
}
