//! End-to-end tests over the HTTP surface
//!
//! Drives the real actix app (routes, orchestrator, gateway, executors)
//! against wiremock stand-ins for the Ollama server and the currency
//! provider. Only the network edges are faked.

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolchat::config::{Config, ModelConfig, OrchestratorConfig};
use toolchat::core::functions::CurrencyFunction;
use toolchat::core::gateway::{ModelGateway, OllamaGateway};
use toolchat::core::orchestrator::Orchestrator;
use toolchat::core::registry::FunctionRegistry;
use toolchat::server::routes;
use toolchat::server::AppState;
use toolchat::storage::{CallLogStore, MemoryCallLog};

fn model_config(base_url: &str) -> ModelConfig {
    ModelConfig {
        base_url: base_url.to_string(),
        model: "llama3.1:8b".to_string(),
        keep_alive: "5m".to_string(),
        timeout_secs: 5,
    }
}

/// Wire the real service graph, pointing both network edges at mocks
fn build_state(
    ollama_url: &str,
    frankfurter_url: &str,
    call_log: Arc<MemoryCallLog>,
) -> AppState {
    let client = reqwest::Client::new();

    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(
        CurrencyFunction::new(client.clone()).with_base_url(frankfurter_url),
    ));
    let registry = Arc::new(registry);

    let gateway: Arc<dyn ModelGateway> =
        Arc::new(OllamaGateway::new(client, &model_config(ollama_url)));

    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        Arc::clone(&registry),
        call_log as Arc<dyn CallLogStore>,
        OrchestratorConfig::default(),
    ));

    AppState::new(Config::default(), registry, orchestrator)
}

/// Mount an Ollama mock that first requests a tool call, then answers
async fn mount_scripted_ollama(server: &MockServer, call: Value, final_text: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": call.to_string()}
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": json!({"tool": null, "final": final_text}).to_string(),
            }
        })))
        .mount(server)
        .await;
}

#[actix_web::test]
async fn currency_conversion_end_to_end() {
    let ollama = MockServer::start().await;
    let frankfurter = MockServer::start().await;

    mount_scripted_ollama(
        &ollama,
        json!({
            "tool": "convert_currency",
            "arguments": {"amount": 100, "base": "eur", "target": "usd"},
        }),
        "100 EUR is about 108.30 USD.",
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 100.0,
            "base": "EUR",
            "rates": {"USD": 108.30}
        })))
        .mount(&frankfurter)
        .await;

    let call_log = Arc::new(MemoryCallLog::new());
    let state = build_state(&ollama.uri(), &frankfurter.uri(), Arc::clone(&call_log));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::chat::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({"message": "Convert 100 EUR to USD"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["response"], "100 EUR is about 108.30 USD.");
    assert_eq!(body["turns_used"], 2);
    assert_eq!(body["function_calls"].as_array().unwrap().len(), 1);
    assert_eq!(body["function_calls"][0]["function"], "convert_currency");
    assert_eq!(body["function_calls"][0]["ok"], true);

    let records = call_log.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].function_name, "convert_currency");
    // currency codes are upper-cased before dispatch and logging
    assert_eq!(records[0].arguments["base"], "EUR");
}

#[actix_web::test]
async fn empty_message_is_rejected_with_400() {
    let call_log = Arc::new(MemoryCallLog::new());
    let state = build_state("http://127.0.0.1:1", "http://127.0.0.1:1", call_log);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::chat::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({"message": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unreachable_model_maps_to_bad_gateway() {
    let call_log = Arc::new(MemoryCallLog::new());
    let state = build_state("http://127.0.0.1:1", "http://127.0.0.1:1", Arc::clone(&call_log));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::chat::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/chat")
        .set_json(json!({"message": "hello"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "gateway_error");
    assert!(call_log.records().await.is_empty());
}

#[actix_web::test]
async fn health_reports_registered_functions() {
    let call_log = Arc::new(MemoryCallLog::new());
    let state = build_state("http://127.0.0.1:1", "http://127.0.0.1:1", call_log);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::health::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["registered_functions"], 1);
}
