//! Wire types shared by the request client, the frame protocol and the
//! comparison engine.
//!
//! The backend contract is:
//! - request: `{unit_system, inputs: {...}}`
//! - success: `{calculator, unit_system, normalized_inputs, results, warnings?, meta}`
//! - error: `{error_code?, message?, field_errors?: [{field, reason}]}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::calculator::Calculator;
use crate::units::{parse_decimal, UnitSystem};

/// Reason recorded for a required field left empty
pub const REQUIRED: &str = "required";

/// Provenance block attached to every backend result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Backend version
    pub version: String,
    /// When the backend computed the result
    pub timestamp: DateTime<Utc>,
    /// Backend implementation tag
    pub source: String,
}

/// A calculation returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    /// Calculator name echoed by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculator: Option<String>,
    /// Unit system the results are expressed in
    pub unit_system: UnitSystem,
    /// Backend's canonical-unit echo of the inputs it computed from
    #[serde(default)]
    pub normalized_inputs: Value,
    /// Calculator-specific result fields
    pub results: Map<String, Value>,
    /// Non-fatal backend remarks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Provenance
    pub meta: Meta,
}

impl CalcResult {
    /// Look up a result field by dotted path (`compression.swept_volume`)
    pub fn value(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.results.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Numeric result field; `None` when absent, null or not a number
    pub fn number(&self, path: &str) -> Option<f64> {
        self.value(path).and_then(Value::as_f64)
    }

    /// Textual result field (e.g. `geometry`)
    pub fn text(&self, path: &str) -> Option<&str> {
        self.value(path).and_then(Value::as_str)
    }

    /// Normalized input by name
    pub fn normalized_input(&self, name: &str) -> Option<&Value> {
        self.normalized_inputs.as_object()?.get(name)
    }
}

/// A result received from a sibling frame
///
/// Baselines are never edited; a newer inbound message replaces the whole
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    page_id: Option<String>,
    result: CalcResult,
}

impl Baseline {
    /// Baseline tagged with `page_id`
    pub fn new(page_id: Option<String>, result: CalcResult) -> Self {
        Self { page_id, result }
    }

    /// Correlator the sender tagged the baseline with
    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    /// The relayed result
    pub fn result(&self) -> &CalcResult {
        &self.result
    }
}

/// One submission's inputs
///
/// Built fresh from form state for every attempt and never mutated
/// afterwards; use [`RequestBuilder`] to construct one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcRequest {
    #[serde(skip)]
    calculator: Calculator,
    unit_system: UnitSystem,
    inputs: Map<String, Value>,
}

impl CalcRequest {
    /// Start building a request for `calculator`
    pub fn builder(calculator: Calculator, unit_system: UnitSystem) -> RequestBuilder {
        RequestBuilder {
            calculator,
            unit_system,
            inputs: Map::new(),
        }
    }

    /// Target calculator
    pub fn calculator(&self) -> Calculator {
        self.calculator
    }

    /// Unit system the inputs are expressed in
    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    /// Inputs sent under `inputs`
    pub fn inputs(&self) -> &Map<String, Value> {
        &self.inputs
    }

    /// JSON body sent to the backend
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert(
            "unit_system".to_string(),
            Value::String(self.unit_system.as_str().to_string()),
        );
        body.insert("inputs".to_string(), Value::Object(self.inputs.clone()));
        Value::Object(body)
    }
}

/// Builder for [`CalcRequest`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    calculator: Calculator,
    unit_system: UnitSystem,
    inputs: Map<String, Value>,
}

impl RequestBuilder {
    /// Set a numeric input; non-finite values are sent as null
    pub fn number(mut self, key: &str, value: f64) -> Self {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.inputs.insert(key.to_string(), value);
        self
    }

    /// Set a string input
    pub fn text(mut self, key: &str, value: &str) -> Self {
        self.inputs
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Set an arbitrary JSON input (nested objects such as `compression`)
    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.inputs.insert(key.to_string(), value);
        self
    }

    /// Set a numeric input from form text
    ///
    /// Empty text leaves the field out so presence validation reports it;
    /// unparsable text is sent as null.
    pub fn decimal_text(self, key: &str, text: &str) -> Self {
        if text.trim().is_empty() {
            return self;
        }
        match parse_decimal(text) {
            Some(value) => self.number(key, value),
            None => self.value(key, Value::Null),
        }
    }

    /// Finish the request
    pub fn build(self) -> CalcRequest {
        CalcRequest {
            calculator: self.calculator,
            unit_system: self.unit_system,
            inputs: self.inputs,
        }
    }
}

/// Backend error body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Per-field rejections
    #[serde(default)]
    pub field_errors: Vec<ApiFieldError>,
}

/// One entry of `field_errors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiFieldError {
    /// Field path, possibly prefixed with `inputs.`
    pub field: String,
    /// Why the field was rejected
    pub reason: String,
}

/// Field name → reason, keyed the way form fields are named
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// No errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Map backend field errors, stripping the `inputs.` prefix
    pub fn from_api(errors: &[ApiFieldError]) -> Self {
        let mut mapped = FieldErrors::new();
        for error in errors {
            mapped.insert(strip_inputs_prefix(&error.field), &error.reason);
        }
        mapped
    }

    /// Record `reason` for `field`, replacing any earlier one
    pub fn insert(&mut self, field: &str, reason: &str) {
        self.0.insert(field.to_string(), reason.to_string());
    }

    /// Reason recorded for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` has an error
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Whether no field has an error
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Field and reason pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names in sorted order
    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

/// `inputs.bore` → `bore`
pub fn strip_inputs_prefix(field: &str) -> &str {
    field.strip_prefix("inputs.").unwrap_or(field)
}
