//! Core orchestration logic
//!
//! Everything between the HTTP surface and the external collaborators lives
//! here: the conversation transcript, the fixed function registry and its
//! executors, the model gateway abstraction, and the orchestration loop that
//! ties them together.

pub mod chat;
pub mod functions;
pub mod gateway;
pub mod orchestrator;
pub mod registry;
