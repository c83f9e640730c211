//! Orchestration loop
//!
//! The control loop over one chat session: send the transcript and function
//! catalog to the model gateway, detect function call requests, validate
//! and dispatch them through the registry, record the call, feed the result
//! back, and repeat until the model produces a final answer or the turn
//! bound is hit.
//!
//! Failure propagation follows a strict split: unknown functions, bad
//! arguments and executor failures are recovered locally — they become
//! function-result messages the model can react to. Only gateway transport
//! failures and the turn bound terminate the request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::core::chat::ChatSession;
use crate::core::functions::{CallFailure, CallFailureKind, FunctionResult};
use crate::core::gateway::{FunctionCallRequest, ModelGateway, ModelTurn};
use crate::core::registry::FunctionRegistry;
use crate::storage::{CallLogRecord, CallLogStore};

/// Terminal status of one chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    /// The model converged to a final answer
    Ok,
    /// The turn bound was exhausted before a final answer
    TurnLimitExceeded,
    /// The model gateway failed at the transport level
    GatewayError,
}

/// Summary of one dispatched (or rejected) function call
#[derive(Debug, Clone, Serialize)]
pub struct CallSummary {
    /// Function name as requested by the model
    pub function: String,
    /// Raw arguments as emitted by the model
    pub arguments: Value,
    /// Result payload fed back to the model
    pub result: Value,
    /// Whether the call succeeded
    pub ok: bool,
}

/// Result of running the orchestration loop for one request
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// Correlation id tying the outcome to its call log records
    pub correlation_id: Uuid,
    /// Terminal status; anything but `Ok` is an explicit failure flag
    pub status: ChatStatus,
    /// Final answer text (best-effort partial on failure)
    pub text: Option<String>,
    /// Number of gateway round-trips used
    pub turns_used: u32,
    /// Function calls made along the way, in order
    pub calls: Vec<CallSummary>,
}

/// The function-calling control loop
///
/// Holds only shared read-only state (`Arc`s); one orchestrator serves all
/// concurrent requests, each with its own session.
pub struct Orchestrator {
    gateway: Arc<dyn ModelGateway>,
    registry: Arc<FunctionRegistry>,
    call_log: Arc<dyn CallLogStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<FunctionRegistry>,
        call_log: Arc<dyn CallLogStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            registry,
            call_log,
            config,
        }
    }

    /// Drive one session to completion
    ///
    /// Turns are strictly sequential within a request. If the caller goes
    /// away the returned future is simply dropped; no partial state leaks
    /// because the session is owned by the request.
    #[instrument(skip_all, fields(%correlation_id))]
    pub async fn run(&self, session: &mut ChatSession, correlation_id: Uuid) -> ChatOutcome {
        let tools = self.registry.schemas();
        let mut calls = Vec::new();

        for turn in 1..=self.config.max_turns {
            let model_turn = match self.gateway.complete(session.messages(), &tools).await {
                Ok(model_turn) => model_turn,
                Err(e) => {
                    error!(error = %e, turn, "model gateway failed");
                    return ChatOutcome {
                        correlation_id,
                        status: ChatStatus::GatewayError,
                        text: None,
                        turns_used: turn,
                        calls,
                    };
                }
            };

            match model_turn {
                ModelTurn::Final(text) => {
                    info!(turn, "model produced final answer");
                    session.append_assistant_final(text.clone());
                    return ChatOutcome {
                        correlation_id,
                        status: ChatStatus::Ok,
                        text: Some(text),
                        turns_used: turn,
                        calls,
                    };
                }
                ModelTurn::CallRequest(request) => {
                    info!(function = %request.name, turn, "model requested a function call");
                    session.append_assistant_call_request(request.clone().into());

                    let result = self.dispatch(&request, correlation_id).await;
                    let payload = result.to_payload();
                    calls.push(CallSummary {
                        function: request.name.clone(),
                        arguments: request.arguments.clone(),
                        result: payload.clone(),
                        ok: result.is_success(),
                    });
                    session.append_function_result(&request.name, &payload);
                }
            }
        }

        warn!(
            max_turns = self.config.max_turns,
            "turn limit exceeded without a final answer"
        );
        ChatOutcome {
            correlation_id,
            status: ChatStatus::TurnLimitExceeded,
            text: None,
            turns_used: self.config.max_turns,
            calls,
        }
    }

    /// Resolve, validate, execute and record one function call request
    ///
    /// Every failure mode comes back as a `FunctionResult` so the loop can
    /// hand it to the model as the function's result.
    async fn dispatch(&self, request: &FunctionCallRequest, correlation_id: Uuid) -> FunctionResult {
        let Some(entry) = self.registry.resolve(&request.name) else {
            warn!(function = %request.name, "unknown function requested by model");
            return CallFailure::unknown_function(&request.name).into();
        };

        let args = match entry.spec().validate(&request.arguments) {
            Ok(args) => args,
            Err(failure) => {
                warn!(function = %request.name, %failure, "argument validation failed");
                if self.config.log_rejected_arguments {
                    let now = Utc::now();
                    self.record(CallLogRecord {
                        id: Uuid::new_v4(),
                        correlation_id,
                        function_name: request.name.clone(),
                        arguments: request.arguments.clone(),
                        result: None,
                        error_kind: Some(failure.kind.as_str().to_string()),
                        started_at: now,
                        finished_at: now,
                    })
                    .await;
                }
                return failure.into();
            }
        };

        let function_timeout = Duration::from_secs(self.config.function_timeout_secs);
        let started_at = Utc::now();
        let result = match timeout(function_timeout, entry.execute(&args)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(function = %request.name, ?function_timeout, "function call timed out");
                FunctionResult::failure(
                    CallFailureKind::ExecutionError,
                    format!("function timed out after {}s", function_timeout.as_secs()),
                )
            }
        };
        let finished_at = Utc::now();

        // Exactly one record per resolved-and-attempted execution, written
        // before the next gateway turn.
        self.record(CallLogRecord {
            id: Uuid::new_v4(),
            correlation_id,
            function_name: request.name.clone(),
            arguments: args.to_value(),
            result: Some(result.to_payload()),
            error_kind: result.error_kind().map(|k| k.as_str().to_string()),
            started_at,
            finished_at,
        })
        .await;

        result
    }

    /// Best-effort append; a storage failure never aborts the turn
    async fn record(&self, record: CallLogRecord) {
        if let Err(e) = self.call_log.record(record).await {
            error!(error = %e, "failed to write call log record");
        }
    }
}

#[cfg(test)]
mod tests;
