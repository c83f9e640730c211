//! Weather lookup executor
//!
//! Backed by OpenWeatherMap: direct geocoding plus the current-weather and
//! 5-day/3-hour forecast endpoints. Forecast requests are bucketed per day
//! and summarized; dates outside the forecast window come back as an
//! execution failure the model can relay.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::normalize::normalize_city;
use super::{CallFailureKind, FunctionExecutor, FunctionResult};
use crate::core::registry::{FunctionSpec, ParamKind, ParamSpec, ValidatedArgs};

const DEFAULT_GEO_BASE_URL: &str = "http://api.openweathermap.org/geo/1.0";
const DEFAULT_DATA_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Executor for `get_weather_for_date(city, date)`
pub struct WeatherFunction {
    client: reqwest::Client,
    api_key: Option<String>,
    geo_base_url: String,
    data_base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeoHit {
    lat: f64,
    lon: f64,
    name: Option<String>,
    country: Option<String>,
}

impl WeatherFunction {
    /// Create an executor against the public OpenWeatherMap endpoints
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            data_base_url: DEFAULT_DATA_BASE_URL.to_string(),
        }
    }

    /// Override the provider base URLs (tests point these at a mock server)
    pub fn with_base_urls(
        mut self,
        geo_base_url: impl Into<String>,
        data_base_url: impl Into<String>,
    ) -> Self {
        self.geo_base_url = geo_base_url.into();
        self.data_base_url = data_base_url.into();
        self
    }

    async fn geocode(&self, city: &str, api_key: &str) -> Result<GeoHit, FunctionResult> {
        let url = format!("{}/direct", self.geo_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("limit", "1"), ("appid", api_key)])
            .send()
            .await
            .map_err(|e| provider_failure("geocoding request failed", &e))?;

        if !response.status().is_success() {
            return Err(FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("geocoding failed with status {}", response.status()),
            ));
        }

        let hits: Vec<GeoHit> = response
            .json()
            .await
            .map_err(|e| provider_failure("geocoding response was not valid JSON", &e))?;

        hits.into_iter().next().ok_or_else(|| {
            FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("could not geocode city {city:?} (check the spelling)"),
            )
        })
    }

    async fn current_weather(
        &self,
        geo: &GeoHit,
        date: NaiveDate,
        api_key: &str,
    ) -> FunctionResult {
        let url = format!("{}/weather", self.data_base_url);
        let body = match self.fetch_json(&url, geo, api_key).await {
            Ok(body) => body,
            Err(failure) => return failure,
        };

        FunctionResult::success(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "city": geo.name.as_deref(),
            "country": geo.country.as_deref(),
            "type": "current",
            "temperature_c": body.pointer("/main/temp"),
            "feels_like_c": body.pointer("/main/feels_like"),
            "humidity": body.pointer("/main/humidity"),
            "condition": body.pointer("/weather/0/description"),
            "wind_mps": body.pointer("/wind/speed"),
        }))
    }

    async fn forecast_weather(
        &self,
        geo: &GeoHit,
        date: NaiveDate,
        api_key: &str,
    ) -> FunctionResult {
        let url = format!("{}/forecast", self.data_base_url);
        let body = match self.fetch_json(&url, geo, api_key).await {
            Ok(body) => body,
            Err(failure) => return failure,
        };

        let entries = body
            .pointer("/list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let day_entries: Vec<&Value> = entries
            .iter()
            .filter(|entry| {
                entry
                    .pointer("/dt")
                    .and_then(Value::as_i64)
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                    .is_some_and(|dt| dt.date_naive() == date)
            })
            .collect();

        if day_entries.is_empty() {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                "requested date is outside the available 5-day forecast window",
            );
        }

        let temps = collect_numbers(&day_entries, "/main/temp");
        let feels = collect_numbers(&day_entries, "/main/feels_like");
        let humidity = collect_numbers(&day_entries, "/main/humidity");

        FunctionResult::success(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "city": geo.name.as_deref(),
            "country": geo.country.as_deref(),
            "type": "forecast",
            "temp_min_c": temps.iter().cloned().fold(f64::INFINITY, f64::min).finite(),
            "temp_max_c": temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max).finite(),
            "temp_avg_c": average(&temps),
            "feels_like_avg_c": average(&feels),
            "humidity_avg": average(&humidity),
            "condition": most_common_condition(&day_entries),
        }))
    }

    async fn fetch_json(
        &self,
        url: &str,
        geo: &GeoHit,
        api_key: &str,
    ) -> Result<Value, FunctionResult> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", geo.lat.to_string()),
                ("lon", geo.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| provider_failure("weather request failed", &e))?;

        if !response.status().is_success() {
            return Err(FunctionResult::failure(
                CallFailureKind::ExecutionError,
                format!("weather provider returned status {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| provider_failure("weather response was not valid JSON", &e))
    }
}

#[async_trait::async_trait]
impl FunctionExecutor for WeatherFunction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "get_weather_for_date",
            description:
                "Get the weather for a city on a particular date (today or within the next 5 days)",
            params: vec![
                ParamSpec {
                    name: "city",
                    description: "City name, e.g. \"Paris\"",
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

    async fn execute(&self, args: &ValidatedArgs) -> FunctionResult {
        let Some(api_key) = self.api_key.clone() else {
            return FunctionResult::failure(
                CallFailureKind::ExecutionError,
                "weather provider is not configured (missing OPENWEATHER_API_KEY)",
            );
        };

        let city = match normalize_city(args.get_str("city").unwrap_or_default()) {
            Ok(city) => city,
            Err(message) => {
                return FunctionResult::failure(CallFailureKind::BadArgument, message)
            }
        };
        let Some(date) = args
            .get_str("date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            return FunctionResult::failure(CallFailureKind::BadArgument, "missing date argument");
        };

        debug!(%city, %date, "weather lookup");

        let geo = match self.geocode(&city, &api_key).await {
            Ok(geo) => geo,
            Err(failure) => return failure,
        };

        if date == Local::now().date_naive() {
            self.current_weather(&geo, date, &api_key).await
        } else {
            self.forecast_weather(&geo, date, &api_key).await
        }
    }
}

fn provider_failure(context: &str, err: &dyn std::fmt::Display) -> FunctionResult {
    FunctionResult::failure(CallFailureKind::ExecutionError, format!("{context}: {err}"))
}

fn collect_numbers(entries: &[&Value], pointer: &str) -> Vec<f64> {
    entries
        .iter()
        .filter_map(|entry| entry.pointer(pointer).and_then(Value::as_f64))
        .collect()
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn most_common_condition(entries: &[&Value]) -> Option<String> {
    let mut counts: Map<String, Value> = Map::new();
    for entry in entries {
        if let Some(desc) = entry
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
        {
            let count = counts
                .entry(desc.to_ascii_lowercase())
                .or_insert(json!(0u64));
            *count = json!(count.as_u64().unwrap_or(0) + 1);
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| count.as_u64().unwrap_or(0))
        .map(|(desc, _)| desc)
}

trait FiniteOrNull {
    fn finite(self) -> Option<f64>;
}

impl FiniteOrNull for f64 {
    fn finite(self) -> Option<f64> {
        self.is_finite().then_some(self)
    }
}
