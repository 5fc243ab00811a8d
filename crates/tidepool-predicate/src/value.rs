//! Value types, evaluator versions, and typed scalar values.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PredicateError, PredicateResult};

/// Revision of the predicate engine a request targets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorVersion {
    /// Booleans, integers, strings, and dates.
    #[default]
    V1,
    /// V1 plus floating point and timestamps.
    V2,
}

impl fmt::Display for EvaluatorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("v1"),
            Self::V2 => f.write_str("v2"),
        }
    }
}

/// Declared type of a column or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `true` / `false`.
    Bool,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// UTF-8 string.
    String,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTC instant.
    Timestamp,
}

/// Types that compare with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Bool,
    Integer,
    Floating,
    String,
    Date,
    Timestamp,
}

impl ValueType {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Long => "long",
            Self::String => "string",
            Self::Date => "date",
            Self::Float => "float",
            Self::Double => "double",
            Self::Timestamp => "timestamp",
        }
    }

    /// Whether `version` of the evaluator accepts this type.
    #[must_use]
    pub const fn is_supported(self, version: EvaluatorVersion) -> bool {
        match self {
            Self::Bool | Self::Int | Self::Long | Self::String | Self::Date => true,
            Self::Float | Self::Double | Self::Timestamp => {
                matches!(version, EvaluatorVersion::V2)
            }
        }
    }

    const fn family(self) -> Family {
        match self {
            Self::Bool => Family::Bool,
            Self::Int | Self::Long => Family::Integer,
            Self::Float | Self::Double => Family::Floating,
            Self::String => Family::String,
            Self::Date => Family::Date,
            Self::Timestamp => Family::Timestamp,
        }
    }

    /// Whether values of `self` and `other` can be compared.
    #[must_use]
    pub fn is_comparable_with(self, other: Self) -> bool {
        self.family() == other.family()
    }

    /// Coerces text into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::InvalidLiteral`] when `raw` does not parse.
    pub fn parse_value(self, raw: &str) -> PredicateResult<Value> {
        let invalid = |message: String| PredicateError::InvalidLiteral {
            value: raw.to_string(),
            value_type: self,
            message,
        };
        match self {
            Self::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid("expected true or false".to_string())),
            },
            Self::Int => raw
                .trim()
                .parse::<i32>()
                .map(|v| Value::Integer(i64::from(v)))
                .map_err(|e| invalid(e.to_string())),
            Self::Long => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| invalid(e.to_string())),
            Self::Float => raw
                .trim()
                .parse::<f32>()
                .map(|v| Value::Floating(f64::from(v)))
                .map_err(|e| invalid(e.to_string())),
            Self::Double => raw
                .trim()
                .parse::<f64>()
                .map(Value::Floating)
                .map_err(|e| invalid(e.to_string())),
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| invalid(e.to_string())),
            Self::Timestamp => parse_timestamp(raw.trim())
                .map(Value::Timestamp)
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| rfc_err),
    }
}

/// A typed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// `int` or `long`.
    Integer(i64),
    /// `float` or `double`.
    Floating(f64),
    /// String.
    String(String),
    /// Date.
    Date(NaiveDate),
    /// Timestamp.
    Timestamp(DateTime<Utc>),
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.partial_cmp(b),
            (Self::Floating(a), Self::Floating(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
