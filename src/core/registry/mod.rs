//! Function registry
//!
//! Static mapping from function name to signature and executor. The
//! registry is built once at startup, is immutable afterwards, and is
//! shared read-only across requests behind an `Arc` — no locking on the
//! lookup path.
//!
//! Validation is deliberately strict: the model's arguments are untrusted.
//! Missing required parameters, unknown parameters, malformed dates,
//! unrecognized currency codes and non-finite or negative amounts are all
//! rejected as bad arguments before any executor runs.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::functions::normalize::{normalize_currency, normalize_date};
use crate::core::functions::{CallFailure, FunctionExecutor, FunctionResult};

/// Currency codes the conversion provider supports
///
/// Pattern-matching alone cannot reject codes like `XXX`, so membership in
/// this set is part of argument validation. Sorted for binary search.
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "IDR",
    "ILS", "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "RON", "SEK",
    "SGD", "THB", "TRY", "USD", "ZAR",
];

/// Semantic parameter type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// Free-form non-empty string
    String,
    /// Calendar date, normalized to ISO `YYYY-MM-DD`
    Date,
    /// Finite, non-negative number
    Number,
    /// Positive integer, clamped into the given inclusive range
    Integer {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },
    /// 3-letter code from [`SUPPORTED_CURRENCIES`]
    Currency,
}

/// One parameter of a function signature
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Parameter name as the model must emit it
    pub name: &'static str,
    /// Short description, rendered into the model-facing schema
    pub description: &'static str,
    /// Semantic type
    pub kind: ParamKind,
    /// Whether the parameter must be present
    pub required: bool,
    /// Value used when an optional parameter is absent
    pub default: Option<Value>,
}

/// Immutable function signature
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    /// Function name
    pub name: &'static str,
    /// Description shown to the model
    pub description: &'static str,
    /// Ordered parameter list
    pub params: Vec<ParamSpec>,
}

/// Model-facing schema entry, serialized into the tool catalog
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSchema {
    /// Function name
    pub name: String,
    /// Function description
    pub description: String,
    /// JSON-Schema-style parameter description
    pub parameters: Value,
}

/// Arguments that passed validation, with normalized values
#[derive(Debug, Clone, Default)]
pub struct ValidatedArgs {
    values: Map<String, Value>,
}

impl ValidatedArgs {
    /// String argument (dates are ISO strings, currencies upper case)
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Numeric argument
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// Integer argument
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// The full normalized argument object, for the call log
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl FunctionSpec {
    /// Validate and normalize a raw argument payload against this signature
    pub fn validate(&self, raw: &Value) -> Result<ValidatedArgs, CallFailure> {
        let object = raw
            .as_object()
            .ok_or_else(|| CallFailure::bad_argument("arguments must be a JSON object"))?;

        for key in object.keys() {
            if !self.params.iter().any(|p| p.name == key) {
                return Err(CallFailure::bad_argument(format!(
                    "unknown parameter {key:?} for function {}",
                    self.name
                )));
            }
        }

        let mut values = Map::new();
        for param in &self.params {
            match object.get(param.name) {
                Some(value) => {
                    values.insert(param.name.to_string(), check_param(param, value)?);
                }
                None if param.required => {
                    return Err(CallFailure::bad_argument(format!(
                        "missing required parameter {:?}",
                        param.name
                    )));
                }
                None => {
                    if let Some(default) = &param.default {
                        values.insert(param.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(ValidatedArgs { values })
    }

    /// Render the model-facing schema for this signature
    pub fn schema(&self) -> FunctionSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.to_string(), param_schema(param));
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        FunctionSchema {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": Value::Object(properties),
                "required": Value::Array(required),
            }),
        }
    }
}

fn param_schema(param: &ParamSpec) -> Value {
    match param.kind {
        ParamKind::String => json!({
            "type": "string",
            "description": param.description,
        }),
        ParamKind::Date => json!({
            "type": "string",
            "description": format!("{} (YYYY-MM-DD)", param.description),
        }),
        ParamKind::Number => json!({
            "type": "number",
            "minimum": 0,
            "description": param.description,
        }),
        ParamKind::Integer { min, max } => json!({
            "type": "integer",
            "minimum": min,
            "maximum": max,
            "description": param.description,
        }),
        ParamKind::Currency => json!({
            "type": "string",
            "pattern": "^[A-Z]{3}$",
            "description": param.description,
        }),
    }
}

fn check_param(param: &ParamSpec, value: &Value) -> Result<Value, CallFailure> {
    match param.kind {
        ParamKind::String => {
            let s = expect_str(param, value)?.trim();
            if s.is_empty() {
                return Err(CallFailure::bad_argument(format!(
                    "parameter {:?} must not be empty",
                    param.name
                )));
            }
            Ok(Value::String(s.to_string()))
        }
        ParamKind::Date => {
            let s = expect_str(param, value)?;
            let date = normalize_date(s).map_err(CallFailure::bad_argument)?;
            Ok(Value::String(date.format("%Y-%m-%d").to_string()))
        }
        ParamKind::Number => {
            let n = expect_number(param, value)?;
            if !n.is_finite() || n < 0.0 {
                return Err(CallFailure::bad_argument(format!(
                    "parameter {:?} must be a finite non-negative number",
                    param.name
                )));
            }
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| {
                    CallFailure::bad_argument(format!(
                        "parameter {:?} must be a finite number",
                        param.name
                    ))
                })
        }
        ParamKind::Integer { min, max } => {
            let n = match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| {
                CallFailure::bad_argument(format!("parameter {:?} must be an integer", param.name))
            })?;
            if n <= 0 {
                return Err(CallFailure::bad_argument(format!(
                    "parameter {:?} must be a positive integer",
                    param.name
                )));
            }
            Ok(Value::Number(n.clamp(min, max).into()))
        }
        ParamKind::Currency => {
            let s = expect_str(param, value)?;
            let code = normalize_currency(s).map_err(CallFailure::bad_argument)?;
            if SUPPORTED_CURRENCIES.binary_search(&code.as_str()).is_err() {
                return Err(CallFailure::bad_argument(format!(
                    "unrecognized currency code {code:?}"
                )));
            }
            Ok(Value::String(code))
        }
    }
}

fn expect_str<'a>(param: &ParamSpec, value: &'a Value) -> Result<&'a str, CallFailure> {
    value.as_str().ok_or_else(|| {
        CallFailure::bad_argument(format!("parameter {:?} must be a string", param.name))
    })
}

fn expect_number(param: &ParamSpec, value: &Value) -> Result<f64, CallFailure> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Models routinely quote numbers; accept the string form too.
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        CallFailure::bad_argument(format!("parameter {:?} must be a number", param.name))
    })
}

/// A resolved registry entry: signature plus executor
pub struct RegisteredFunction {
    spec: FunctionSpec,
    executor: Arc<dyn FunctionExecutor>,
}

impl RegisteredFunction {
    /// The function's signature
    pub fn spec(&self) -> &FunctionSpec {
        &self.spec
    }

    /// Run the executor with validated arguments
    pub async fn execute(&self, args: &ValidatedArgs) -> FunctionResult {
        self.executor.execute(args).await
    }
}

/// Read-only lookup table over the fixed function set
#[derive(Default)]
pub struct FunctionRegistry {
    functions: Vec<RegisteredFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under the name its spec declares
    ///
    /// Intended to run during startup only; the registry is frozen (shared
    /// behind `Arc`) once the server starts serving.
    pub fn register(&mut self, executor: Arc<dyn FunctionExecutor>) {
        let spec = executor.spec();
        debug_assert!(
            self.resolve(spec.name).is_none(),
            "duplicate function registration: {}",
            spec.name
        );
        self.functions.push(RegisteredFunction { spec, executor });
    }

    /// Look up a function by name
    pub fn resolve(&self, name: &str) -> Option<&RegisteredFunction> {
        self.functions.iter().find(|f| f.spec.name == name)
    }

    /// The model-facing catalog, in registration order
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.functions.iter().map(|f| f.spec.schema()).collect()
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
