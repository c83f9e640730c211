use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::*;
use crate::core::chat::MessageRole;
use crate::core::functions::FunctionExecutor;
use crate::core::gateway::GatewayError;
use crate::core::registry::{FunctionSpec, ParamKind, ParamSpec, ValidatedArgs};
use crate::storage::MemoryCallLog;

/// Gateway stub driven by a fixed script, optionally repeating a call
/// request forever once the script is exhausted.
struct ScriptedGateway {
    script: Mutex<VecDeque<Result<ModelTurn, GatewayError>>>,
    repeat: Option<FunctionCallRequest>,
    round_trips: AtomicU32,
}

impl ScriptedGateway {
    fn new(turns: Vec<Result<ModelTurn, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            repeat: None,
            round_trips: AtomicU32::new(0),
        }
    }

    fn always_requesting(request: FunctionCallRequest) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(request),
            round_trips: AtomicU32::new(0),
        }
    }

    fn round_trips(&self) -> u32 {
        self.round_trips.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(
        &self,
        _transcript: &[crate::core::chat::ChatMessage],
        _tools: &[crate::core::registry::FunctionSchema],
    ) -> Result<ModelTurn, GatewayError> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if let Some(turn) = self.script.lock().await.pop_front() {
            return turn;
        }
        match &self.repeat {
            Some(request) => Ok(ModelTurn::CallRequest(request.clone())),
            None => panic!("gateway script exhausted"),
        }
    }
}

struct StubExecutor {
    spec: FunctionSpec,
    result: FunctionResult,
    invocations: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl StubExecutor {
    fn new(spec: FunctionSpec, result: FunctionResult) -> (Self, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        (
            Self {
                spec,
                result,
                invocations: Arc::clone(&invocations),
                delay: None,
            },
            invocations,
        )
    }
}

#[async_trait::async_trait]
impl FunctionExecutor for StubExecutor {
    fn spec(&self) -> FunctionSpec {
        self.spec.clone()
    }

    async fn execute(&self, _args: &ValidatedArgs) -> FunctionResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

fn weather_spec() -> FunctionSpec {
    FunctionSpec {
        name: "get_weather_for_date",
        description: "Get weather for a city on a particular date",
        params: vec![
            ParamSpec {
                name: "city",
                description: "City name",
                kind: ParamKind::String,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "date",
                description: "Requested date",
                kind: ParamKind::Date,
                required: true,
                default: None,
            },
        ],
    }
}

fn convert_spec() -> FunctionSpec {
    FunctionSpec {
        name: "convert_currency",
        description: "Convert between currencies",
        params: vec![
            ParamSpec {
                name: "amount",
                description: "Amount",
                kind: ParamKind::Number,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "base",
                description: "Source currency",
                kind: ParamKind::Currency,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "target",
                description: "Target currency",
                kind: ParamKind::Currency,
                required: true,
                default: None,
            },
        ],
    }
}

fn weather_request(date: &str) -> FunctionCallRequest {
    FunctionCallRequest {
        name: "get_weather_for_date".to_string(),
        arguments: json!({"city": "Paris", "date": date}),
    }
}

struct Harness {
    orchestrator: Orchestrator,
    gateway: Arc<ScriptedGateway>,
    call_log: Arc<MemoryCallLog>,
}

fn harness(
    gateway: ScriptedGateway,
    executors: Vec<StubExecutor>,
    config: OrchestratorConfig,
) -> Harness {
    let mut registry = FunctionRegistry::new();
    for executor in executors {
        registry.register(Arc::new(executor));
    }
    let gateway = Arc::new(gateway);
    let call_log = Arc::new(MemoryCallLog::new());
    let orchestrator = Orchestrator::new(
        Arc::clone(&gateway) as Arc<dyn ModelGateway>,
        Arc::new(registry),
        Arc::clone(&call_log) as Arc<dyn CallLogStore>,
        config,
    );
    Harness {
        orchestrator,
        gateway,
        call_log,
    }
}

fn config() -> OrchestratorConfig {
    OrchestratorConfig::default()
}

async fn run(h: &Harness, message: &str) -> (ChatOutcome, ChatSession) {
    let mut session = ChatSession::with_system("You are an assistant that can call tools.");
    session.append_user(message);
    let outcome = h.orchestrator.run(&mut session, Uuid::new_v4()).await;
    (outcome, session)
}

fn function_payload(session: &ChatSession) -> Value {
    let msg = session
        .messages()
        .iter()
        .find(|m| m.role == MessageRole::Function)
        .expect("no function message in transcript");
    serde_json::from_str(msg.content.as_deref().unwrap()).unwrap()
}

#[tokio::test]
async fn direct_answer_needs_no_function_call() {
    let h = harness(
        ScriptedGateway::new(vec![Ok(ModelTurn::Final("Hello!".into()))]),
        vec![],
        config(),
    );
    let (outcome, _) = run(&h, "Hi there").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(outcome.text.as_deref(), Some("Hello!"));
    assert_eq!(outcome.turns_used, 1);
    assert!(outcome.calls.is_empty());
    assert!(h.call_log.records().await.is_empty());
}

#[tokio::test]
async fn weather_happy_path_writes_exactly_one_record() {
    let (executor, invocations) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny", "temperature_c": 21.0})),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("2024-06-01"))),
            Ok(ModelTurn::Final("Sunny and 21C in Paris.".into())),
        ]),
        vec![executor],
        config(),
    );

    let (outcome, session) = run(&h, "Weather in Paris on 2024-06-01?").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(outcome.text.as_deref(), Some("Sunny and 21C in Paris."));
    assert_eq!(invocations.load(Ordering::SeqCst), 1);

    let records = h.call_log.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].function_name, "get_weather_for_date");
    assert_eq!(records[0].correlation_id, outcome.correlation_id);
    assert!(records[0].error_kind.is_none());
    assert!(records[0].finished_at >= records[0].started_at);

    // assistant call request, then the function result, then the answer
    let roles: Vec<MessageRole> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Function,
            MessageRole::Assistant,
        ]
    );
}

#[tokio::test]
async fn malformed_date_never_reaches_the_executor() {
    let (executor, invocations) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny"})),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("13/32/2024"))),
            Ok(ModelTurn::Final("That date does not exist.".into())),
        ]),
        vec![executor],
        config(),
    );

    let (outcome, session) = run(&h, "Weather in Paris on 13/32/2024?").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert!(h.call_log.records().await.is_empty());
    assert_eq!(function_payload(&session)["error"]["kind"], "bad_argument");
}

#[tokio::test]
async fn unknown_function_is_fed_back_and_loop_continues() {
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(FunctionCallRequest {
                name: "get_stock_price".to_string(),
                arguments: json!({"symbol": "ACME"}),
            })),
            Ok(ModelTurn::Final("I cannot look up stock prices.".into())),
        ]),
        vec![],
        config(),
    );

    let (outcome, session) = run(&h, "ACME stock price?").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(outcome.turns_used, 2);
    assert!(h.call_log.records().await.is_empty());
    assert_eq!(
        function_payload(&session)["error"]["kind"],
        "unknown_function"
    );
}

#[tokio::test]
async fn turn_limit_is_enforced_exactly() {
    let (executor, invocations) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny"})),
    );
    let h = harness(
        ScriptedGateway::always_requesting(weather_request("2024-06-01")),
        vec![executor],
        config(),
    );

    let (outcome, _) = run(&h, "Weather forever").await;

    assert_eq!(outcome.status, ChatStatus::TurnLimitExceeded);
    assert_eq!(outcome.turns_used, config().max_turns);
    // never fewer, never more
    assert_eq!(h.gateway.round_trips(), config().max_turns);
    assert_eq!(
        invocations.load(Ordering::SeqCst) as u32,
        config().max_turns
    );
}

#[tokio::test]
async fn gateway_failure_on_first_call_terminates_immediately() {
    let h = harness(
        ScriptedGateway::new(vec![Err(GatewayError::Transport(
            "connection refused".into(),
        ))]),
        vec![],
        config(),
    );

    let (outcome, _) = run(&h, "Hello?").await;

    assert_eq!(outcome.status, ChatStatus::GatewayError);
    assert_eq!(outcome.text, None);
    assert_eq!(outcome.turns_used, 1);
    assert!(h.call_log.records().await.is_empty());
}

#[tokio::test]
async fn invalid_currency_code_yields_no_records_and_a_clarification() {
    let (executor, invocations) = StubExecutor::new(
        convert_spec(),
        FunctionResult::success(json!({"converted": 1.0})),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(FunctionCallRequest {
                name: "convert_currency".to_string(),
                arguments: json!({"amount": 100, "base": "XXX", "target": "USD"}),
            })),
            Ok(ModelTurn::Final(
                "\"XXX\" is not a currency I recognize, which one did you mean?".into(),
            )),
        ]),
        vec![executor],
        config(),
    );

    let (outcome, session) = run(&h, "Convert 100 XXX to USD").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert!(h.call_log.records().await.is_empty());
    assert_eq!(function_payload(&session)["error"]["kind"], "bad_argument");
}

#[tokio::test]
async fn executor_failures_are_recorded_and_recovered() {
    let (executor, _) = StubExecutor::new(
        weather_spec(),
        FunctionResult::failure(CallFailureKind::ExecutionError, "provider unreachable"),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("2024-06-01"))),
            Ok(ModelTurn::Final("The weather service seems down.".into())),
        ]),
        vec![executor],
        config(),
    );

    let (outcome, session) = run(&h, "Weather in Paris?").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    let records = h.call_log.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_kind.as_deref(), Some("execution_error"));
    assert_eq!(
        function_payload(&session)["error"]["kind"],
        "execution_error"
    );
}

#[tokio::test]
async fn identical_calls_produce_independent_records() {
    let (executor, _) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny"})),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("2024-06-01"))),
            Ok(ModelTurn::CallRequest(weather_request("2024-06-01"))),
            Ok(ModelTurn::Final("Still sunny.".into())),
        ]),
        vec![executor],
        config(),
    );

    let (_, _) = run(&h, "Double check the weather").await;

    let records = h.call_log.records().await;
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].id, records[1].id);
    assert_eq!(records[0].arguments, records[1].arguments);
}

#[tokio::test]
async fn rejected_arguments_are_logged_when_configured() {
    let (executor, _) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny"})),
    );
    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("13/32/2024"))),
            Ok(ModelTurn::Final("Bad date.".into())),
        ]),
        vec![executor],
        OrchestratorConfig {
            log_rejected_arguments: true,
            ..config()
        },
    );

    let (_, _) = run(&h, "Weather on 13/32/2024").await;

    let records = h.call_log.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_kind.as_deref(), Some("bad_argument"));
    assert!(records[0].result.is_none());
}

#[tokio::test(start_paused = true)]
async fn slow_executors_time_out_into_execution_errors() {
    let (mut executor, _) = StubExecutor::new(
        weather_spec(),
        FunctionResult::success(json!({"condition": "sunny"})),
    );
    executor.delay = Some(Duration::from_secs(120));

    let h = harness(
        ScriptedGateway::new(vec![
            Ok(ModelTurn::CallRequest(weather_request("2024-06-01"))),
            Ok(ModelTurn::Final("The weather service is slow today.".into())),
        ]),
        vec![executor],
        config(),
    );

    let (outcome, session) = run(&h, "Weather in Paris?").await;

    assert_eq!(outcome.status, ChatStatus::Ok);
    assert_eq!(
        function_payload(&session)["error"]["kind"],
        "execution_error"
    );
    let records = h.call_log.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_kind.as_deref(), Some("execution_error"));
}
