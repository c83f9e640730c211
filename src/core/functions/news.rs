//! News lookup executor
//!
//! Backed by the NewsAPI `everything` endpoint, searching for the city name
//! and returning the most recently published articles.

use serde_json::{json, Value};
use tracing::debug;

use super::normalize::normalize_city;
use super::{CallFailureKind, FunctionExecutor, FunctionResult};
use crate::core::registry::{FunctionSpec, ParamKind, ParamSpec, ValidatedArgs};

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const DEFAULT_PAGE_SIZE: i64 = 5;
const MAX_PAGE_SIZE: i64 = 20;

/// Executor for `get_news_for_city(city, page_size)`
pub struct NewsFunction {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsFunction {
    /// Create an executor against the public NewsAPI endpoint
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
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
impl FunctionExecutor for NewsFunction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "get_news_for_city",
            description: "Get recent news articles mentioning a city",
            params: vec![
                ParamSpec {
                    name: "city",
                    description: "City name to search for",
                    kind: ParamKind::String,
                    required: true,
                    default: None,
                },
                ParamSpec {
                    name: "page_size",
                    description: "Number of articles to return",
                    kind: ParamKind::Integer {
                        min: 1,
                        max: MAX_PAGE_SIZE,
                    },
                    required: false,
                    default: Some(json!(DEFAULT_PAGE_SIZE)),
                },
            ],
        }
    }

    async fn execute(&self, args: &ValidatedArgs) -> FunctionResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                "news provider is not configured (missing NEWSAPI_KEY)",
            );
        };

        let city = match normalize_city(args.get_str("city").unwrap_or_default()) {
            Ok(city) => city,
            Err(message) => {
                return FunctionResult::failure(CallFailureKind::BadArgument, message)
            }
        };
        let page_size = args.get_i64("page_size").unwrap_or(DEFAULT_PAGE_SIZE);

        debug!(%city, page_size, "news lookup");

        let url = format!("{}/everything", self.base_url);
        let response = match self
            .client
            .get(&url)
            .query(&[
                ("q", city.as_str()),
                ("pageSize", &page_size.to_string()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("apiKey", api_key),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return FunctionResult::failure(
                    CallFailureKind::ExecutionError,
                    format!("news request failed: {e}"),
                )
            }
        };

        if !response.status().is_success() {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("news provider returned status {}", response.status()),
            );
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return FunctionResult::failure(
                    CallFailureKind::ExecutionError,
                    format!("news response was not valid JSON: {e}"),
                )
            }
        };

        let articles: Vec<Value> = body
            .pointer("/articles")
            .and_then(Value::as_array)
            .map(|articles| {
                articles
                    .iter()
                    .take(page_size as usize)
                    .map(|article| {
                        json!({
                            "title": article.pointer("/title"),
                            "source": article.pointer("/source/name"),
                            "published_at": article.pointer("/publishedAt"),
                            "url": article.pointer("/url"),
                            "description": article.pointer("/description"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        FunctionResult::success(json!({
            "city": city,
            "count": articles.len(),
            "articles": articles,
        }))
    }
}
