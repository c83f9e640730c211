//! Model gateway
//!
//! The seam between the orchestrator and the LLM backend. A gateway takes
//! the full ordered transcript plus the function catalog and returns either
//! a final answer or a structured function call request. Transport-level
//! failures are a distinct error kind; they terminate the request rather
//! than being fed back to the model.

pub mod ollama;

pub use ollama::OllamaGateway;

use serde_json::Value;
use thiserror::Error;

use crate::core::chat::{ChatMessage, FunctionCall};
use crate::core::registry::FunctionSchema;

/// A structured function call emitted by the model in lieu of an answer
///
/// Created by the gateway, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallRequest {
    /// Function name as the model emitted it (not yet resolved)
    pub name: String,
    /// Raw argument payload (untrusted)
    pub arguments: Value,
}

impl From<FunctionCallRequest> for FunctionCall {
    fn from(req: FunctionCallRequest) -> Self {
        FunctionCall {
            name: req.name,
            arguments: req.arguments,
        }
    }
}

/// Discriminated outcome of one model round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// The model produced its final natural-language answer
    Final(String),
    /// The model requested a function call
    CallRequest(FunctionCallRequest),
}

/// Transport-level gateway failure
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The model endpoint could not be reached
    #[error("model endpoint unreachable: {0}")]
    Transport(String),

    /// The model call exceeded its timeout
    #[error("model call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The response envelope could not be parsed
    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// Adapter over an LLM chat backend
///
/// The protocol is stateless per call: the full transcript is sent on every
/// round-trip, together with the catalog of callable functions.
#[async_trait::async_trait]
pub trait ModelGateway: Send + Sync {
    /// One model round-trip over the given transcript
    async fn complete(
        &self,
        transcript: &[ChatMessage],
        tools: &[FunctionSchema],
    ) -> Result<ModelTurn, GatewayError>;
}
