//! Currency conversion executor
//!
//! Backed by the Frankfurter exchange-rate API. Needs no API key.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

use super::{CallFailureKind, FunctionExecutor, FunctionResult};
use crate::core::registry::{FunctionSpec, ParamKind, ParamSpec, ValidatedArgs};

const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Executor for `convert_currency(amount, base, target)`
pub struct CurrencyFunction {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

impl CurrencyFunction {
    /// Create an executor against the public Frankfurter endpoint
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the provider base URL (tests point this at a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait::async_trait]
impl FunctionExecutor for CurrencyFunction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "convert_currency",
            description: "Convert an amount from a base currency to a target currency",
            params: vec![
                ParamSpec {
                    name: "amount",
                    description: "Amount to convert",
                    kind: ParamKind::Number,
                    required: true,
                    default: None,
                },
                ParamSpec {
                    name: "base",
                    description: "Source currency code, e.g. \"EUR\"",
                    kind: ParamKind::Currency,
                    required: true,
                    default: None,
                },
                ParamSpec {
                    name: "target",
                    description: "Target currency code, e.g. \"USD\"",
                    kind: ParamKind::Currency,
                    required: true,
                    default: None,
                },
            ],
        }
    }

    async fn execute(&self, args: &ValidatedArgs) -> FunctionResult {
        let amount = args.get_f64("amount").unwrap_or_default();
        let base = args.get_str("base").unwrap_or_default().to_string();
        let target = args.get_str("target").unwrap_or_default().to_string();

        debug!(amount, %base, %target, "currency conversion");

        if base == target {
            return FunctionResult::success(json!({
                "amount": amount,
                "base": base,
                "target": target,
                "converted": amount,
                "rate": 1.0,
            }));
        }

        let url = format!("{}/latest", self.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[
                ("amount", amount.to_string()),
                ("from", base.clone()),
                ("to", target.clone()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return FunctionResult::failure(
                    CallFailureKind::ExecutionError,
                    format!("currency request failed: {e}"),
                )
            }
        };

        if !response.status().is_success() {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("currency provider returned status {}", response.status()),
            );
        }

        let body: RatesResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return FunctionResult::failure(
                    CallFailureKind::ExecutionError,
                    format!("currency response was not valid JSON: {e}"),
                )
            }
        };

        let Some(converted) = body.rates.get(&target).copied() else {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("currency provider returned no rate for {target}"),
            );
        };

        let rate = if amount > 0.0 {
            Some(converted / amount)
        } else {
            None
        };

        FunctionResult::success(json!({
            "amount": amount,
            "base": base,
            "target": target,
            "converted": converted,
            "rate": rate,
        }))
    }
}
