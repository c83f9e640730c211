//! Chat transcript types
//!
//! Message shapes are wire-compatible with the Ollama chat API. The LLM
//! protocol is stateless per call, so the full transcript is re-sent on
//! every round-trip; `ChatSession` is the single ordered, replayable view
//! the orchestrator maintains across turns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message role
    System,
    /// User message role
    User,
    /// Assistant message role
    Assistant,
    /// Function result message role
    Function,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Function => write!(f, "function"),
        }
    }
}

/// A function call requested by the model on an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// Raw argument payload as emitted by the model
    pub arguments: Value,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: MessageRole,
    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Function name (for function result messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function call descriptor (for assistant call-request messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }

    /// Create an assistant message carrying a function call request
    pub fn assistant_call(call: FunctionCall) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Create a function result message
    pub fn function_result(name: impl Into<String>, payload: &Value) -> Self {
        Self {
            role: MessageRole::Function,
            content: Some(payload.to_string()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// Ordered conversation transcript for one in-flight request
///
/// Append-only; owned exclusively by the request being served and discarded
/// when the final answer is returned. Carries no validation logic.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with a system preamble
    pub fn with_system(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(text)],
        }
    }

    /// Append a user message
    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Append the model's final answer
    pub fn append_assistant_final(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(text));
    }

    /// Append an assistant message recording a function call request
    pub fn append_assistant_call_request(&mut self, call: FunctionCall) {
        self.messages.push(ChatMessage::assistant_call(call));
    }

    /// Append a function result message
    ///
    /// Invariant: a function message immediately follows the assistant
    /// message that requested that function.
    pub fn append_function_result(&mut self, name: &str, payload: &Value) {
        debug_assert!(
            matches!(
                self.messages.last(),
                Some(ChatMessage {
                    role: MessageRole::Assistant,
                    function_call: Some(call),
                    ..
                }) if call.name == name
            ),
            "function result must follow the assistant message requesting it"
        );
        self.messages.push(ChatMessage::function_result(name, payload));
    }

    /// Full transcript, in order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages in the transcript
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
