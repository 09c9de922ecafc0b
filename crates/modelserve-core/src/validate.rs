//! Request-boundary validation.
//!
//! Raw, untyped request values go in; typed feature vectors or a list of
//! field-level violations come out. Nothing downstream of this module ever
//! sees an unchecked value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Where a request value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Query,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
        }
    }
}

/// Which constraint a value failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    FloatParsing,
    IntParsing,
    FiniteNumber,
    GreaterThan,
    GreaterThanEqual,
    LessThanEqual,
    QueryInvalid,
    JsonInvalid,
    ModelAttributesType,
}

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// `["query", "sepal_length"]`, `["body", "age"]`, or `["body"]` for an unparseable payload.
    pub loc: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub msg: String,
    /// The offending raw value, `null` when the field was absent.
    pub input: Value,
}

impl FieldViolation {
    /// The field name, if the violation is attached to one.
    pub fn field(&self) -> Option<&str> {
        self.loc.get(1).map(String::as_str)
    }
}

/// Every violation found in a single request, in field order.
///
/// Serializes as `{"detail": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{} invalid field(s)", detail.len())]
pub struct ValidationErrors {
    pub detail: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// A query string or body that could not be decoded at all.
    pub fn unparseable(location: Location, reason: impl Into<String>) -> Self {
        let kind = match location {
            Location::Query => ViolationKind::QueryInvalid,
            Location::Body => ViolationKind::JsonInvalid,
        };
        Self {
            detail: vec![FieldViolation {
                loc: vec![location.as_str().to_string()],
                kind,
                msg: reason.into(),
                input: Value::Null,
            }],
        }
    }

    /// A well-formed payload that is not a key/value object.
    pub fn not_an_object(location: Location, input: Value) -> Self {
        Self {
            detail: vec![FieldViolation {
                loc: vec![location.as_str().to_string()],
                kind: ViolationKind::ModelAttributesType,
                msg: "Input should be a valid dictionary or object to extract fields from".into(),
                input,
            }],
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.detail.iter().filter_map(FieldViolation::field).collect()
    }
}

/// Declared bounds of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub name: &'static str,
    pub min: f64,
    /// `true` for `value > min`, `false` for `value >= min`.
    pub min_exclusive: bool,
    pub max: f64,
}

impl FieldRange {
    pub const fn inclusive(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            min,
            min_exclusive: false,
            max,
        }
    }

    pub const fn positive(name: &'static str, max: f64) -> Self {
        Self {
            name,
            min: 0.0,
            min_exclusive: true,
            max,
        }
    }

    fn check(&self, value: f64) -> Option<(ViolationKind, String)> {
        if self.min_exclusive && value <= self.min {
            return Some((
                ViolationKind::GreaterThan,
                format!("Input should be greater than {}", self.min),
            ));
        }
        if !self.min_exclusive && value < self.min {
            return Some((
                ViolationKind::GreaterThanEqual,
                format!("Input should be greater than or equal to {}", self.min),
            ));
        }
        if value > self.max {
            return Some((
                ViolationKind::LessThanEqual,
                format!("Input should be less than or equal to {}", self.max),
            ));
        }
        None
    }
}

/// Collects violations across all fields of one request.
///
/// Each `float`/`integer` call returns `Some` for a clean value and `None`
/// after recording exactly one violation, so a caller holding all `Some`
/// values knows the request is clean.
pub struct Validator {
    location: Location,
    violations: Vec<FieldViolation>,
}

impl Validator {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            violations: Vec::new(),
        }
    }

    /// Parse and bound-check a floating-point field given as text.
    pub fn float(&mut self, range: &FieldRange, raw: Option<&str>) -> Option<f64> {
        let Some(raw) = raw else {
            self.reject(range, ViolationKind::Missing, "Field required", Value::Null);
            return None;
        };
        let input = Value::String(raw.to_string());
        let Ok(value) = raw.trim().parse::<f64>() else {
            self.reject(
                range,
                ViolationKind::FloatParsing,
                "Input should be a valid number, unable to parse string as a number",
                input,
            );
            return None;
        };
        if !value.is_finite() {
            self.reject(
                range,
                ViolationKind::FiniteNumber,
                "Input should be a finite number",
                input,
            );
            return None;
        }
        self.bounded(range, value, input)
    }

    /// Coerce and bound-check an integer field given as a JSON value.
    ///
    /// Accepts JSON integers, floats with no fractional part, and strings
    /// holding an integer.
    pub fn integer(&mut self, range: &FieldRange, raw: Option<&Value>) -> Option<i64> {
        let Some(raw) = raw else {
            self.reject(range, ViolationKind::Missing, "Field required", Value::Null);
            return None;
        };
        let Some(value) = coerce_integer(raw) else {
            self.reject(
                range,
                ViolationKind::IntParsing,
                "Input should be a valid integer",
                raw.clone(),
            );
            return None;
        };
        // In-range values fit an i64.
        self.bounded(range, value as f64, raw.clone())
            .map(|_| value as i64)
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors {
            detail: self.violations,
        }
    }

    fn bounded(&mut self, range: &FieldRange, value: f64, input: Value) -> Option<f64> {
        match range.check(value) {
            None => Some(value),
            Some((kind, msg)) => {
                self.reject(range, kind, &msg, input);
                None
            }
        }
    }

    fn reject(&mut self, range: &FieldRange, kind: ViolationKind, msg: &str, input: Value) {
        trace!(field = range.name, ?kind, "rejected request value");
        self.violations.push(FieldViolation {
            loc: vec![self.location.as_str().to_string(), range.name.to_string()],
            kind,
            msg: msg.to_string(),
            input,
        });
    }
}

/// Widened to `i128` so integers beyond `i64` still reach the bound check.
fn coerce_integer(raw: &Value) -> Option<i128> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i128)
            }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
