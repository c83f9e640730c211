//! # toolchat
//!
//! A chat gateway that orchestrates LLM function calling: one user message
//! in, one final answer out, with validated tool dispatch in between.
//!
//! ## Features
//!
//! - **Function-calling loop**: the model can request `get_weather_for_date`,
//!   `get_news_for_city` and `convert_currency`; results are fed back until
//!   it produces a final answer or the turn bound is hit
//! - **Strict validation**: arguments are schema-checked and normalized
//!   (friendly dates, city cleanup, currency codes) before any provider call
//! - **Recoverable failures**: unknown functions, bad arguments and provider
//!   errors go back to the model as data instead of failing the request
//! - **Audit trail**: every attempted function call lands in an append-only
//!   SQLite call log, correlated with its chat request
//! - **Ollama backend**: strict JSON tool-calling prompt over `/api/chat`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolchat::config::Config;
//! use toolchat::server::HttpServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/toolchat.yaml").await?;
//!     let server = HttpServer::new(&config).await?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use crate::config::Config;
pub use crate::core::orchestrator::{ChatOutcome, ChatStatus, Orchestrator};
pub use crate::server::HttpServer;
pub use crate::utils::error::{Result, ServiceError};
