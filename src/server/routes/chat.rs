//! Chat endpoint
//!
//! One request drives one full orchestration loop: the user's message goes
//! in, the model's final answer (plus a summary of every function call made
//! along the way) comes out.

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::chat::ChatSession;
use crate::core::orchestrator::{CallSummary, ChatStatus};
use crate::server::routes::errors;
use crate::server::state::AppState;

/// Baseline assistant persona; swapped for the strict tool-calling prompt
/// by the gateway whenever functions are registered.
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer the user's question concisely.";

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Opaque caller identifier, echoed into logs only
    pub user_id: Option<String>,
    /// The user's message
    pub message: String,
    /// Caller-supplied correlation id; generated when absent
    pub correlation_id: Option<Uuid>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Final answer text, absent when the loop did not converge
    pub response: Option<String>,
    /// Terminal status of the orchestration loop
    pub status: ChatStatus,
    /// Correlation id tying the response to its call log records
    pub correlation_id: Uuid,
    /// Gateway round-trips used
    pub turns_used: u32,
    /// Function calls made while answering, in order
    pub function_calls: Vec<CallSummary>,
}

/// Configure chat routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat", web::post().to(chat));
}

/// Chat endpoint
///
/// Runs the full function-calling loop for one user message and returns the
/// final answer together with an explicit status.
pub async fn chat(
    state: web::Data<AppState>,
    request: web::Json<ChatRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();

    if request.message.trim().is_empty() {
        warn!("chat request with empty message rejected");
        return Ok(errors::validation_error("message must not be empty"));
    }

    let correlation_id = request.correlation_id.unwrap_or_else(Uuid::new_v4);
    info!(
        %correlation_id,
        user_id = request.user_id.as_deref().unwrap_or("-"),
        "chat request received"
    );

    let mut session = ChatSession::with_system(DEFAULT_SYSTEM_PROMPT);
    session.append_user(request.message);

    let outcome = state.orchestrator.run(&mut session, correlation_id).await;

    let body = ChatResponse {
        response: outcome.text,
        status: outcome.status,
        correlation_id: outcome.correlation_id,
        turns_used: outcome.turns_used,
        function_calls: outcome.calls,
    };

    let response = match body.status {
        ChatStatus::GatewayError => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::Ok().json(body),
    };
    Ok(response)
}
