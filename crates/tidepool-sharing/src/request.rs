//! Query request resolution.
//!
//! A [`QueryRequest`] arrives in the protocol's wire shape; [`QueryRequest::resolve`]
//! turns it into an immutable [`ReadTableRequest`] or rejects it before any
//! table loader is consulted.

use serde::{Deserialize, Serialize};
use tidepool_predicate::{EvaluatorVersion, Predicate};

use crate::error::{SharingError, SharingResult};
use crate::version::{ReadMode, parse_timestamp};

/// Body of a table query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// SQL-style hints; accepted and passed through, never evaluated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicate_hints: Vec<String>,
    /// JSON predicate used for file pruning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_predicate_hints: Option<String>,
    /// Evaluator revision for `json_predicate_hints`; defaults to v1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate_evaluator_version: Option<EvaluatorVersion>,
    /// Row-count hint passed to the table loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_hint: Option<i64>,
    /// Exact version to read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Instant to read as of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Start of a change-feed version range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_version: Option<i64>,
    /// End of a change-feed version range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_version: Option<i64>,
    /// Start of a change-feed time range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_timestamp: Option<String>,
    /// End of a change-feed time range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_timestamp: Option<String>,
}

/// A validated table read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadTableRequest {
    /// Point in history to read.
    pub mode: ReadMode,
    /// Validated pruning predicate.
    pub predicate: Option<Predicate>,
    /// SQL-style hints, passed through.
    pub predicate_hints: Vec<String>,
    /// Row-count hint.
    pub limit_hint: Option<u64>,
}

impl QueryRequest {
    /// Creates a request for the current version.
    #[must_use]
    pub fn current() -> Self {
        Self::default()
    }

    /// Resolves the read mode and validates hints.
    ///
    /// # Errors
    ///
    /// - [`SharingError::NotImplemented`] for change-feed range fields
    /// - [`SharingError::BadRequest`] when both `version` and `timestamp` are
    ///   given, or `version`/`limit_hint` is negative
    /// - [`SharingError::MalformedTimestamp`] when `timestamp` does not parse
    /// - [`SharingError::Predicate`] when `json_predicate_hints` is invalid
    pub fn resolve(&self) -> SharingResult<ReadTableRequest> {
        if self.starting_version.is_some()
            || self.ending_version.is_some()
            || self.starting_timestamp.is_some()
            || self.ending_timestamp.is_some()
        {
            return Err(SharingError::NotImplemented {
                message: "starting/ending version and timestamp ranges are not supported"
                    .to_string(),
            });
        }

        let mode = match (self.version, self.timestamp.as_deref()) {
            (Some(_), Some(_)) => {
                return Err(SharingError::bad_request(
                    "cannot specify both version and timestamp",
                ));
            }
            (Some(version), None) => {
                if version < 0 {
                    return Err(SharingError::bad_request(format!(
                        "version must be non-negative, got {version}"
                    )));
                }
                ReadMode::Version(version)
            }
            (None, Some(timestamp)) => ReadMode::AsOfTimestamp(parse_timestamp(timestamp)?),
            (None, None) => ReadMode::CurrentVersion,
        };

        let limit_hint = self
            .limit_hint
            .map(|limit| {
                u64::try_from(limit).map_err(|_| {
                    SharingError::bad_request(format!(
                        "limitHint must be non-negative, got {limit}"
                    ))
                })
            })
            .transpose()?;

        let predicate = self
            .json_predicate_hints
            .as_deref()
            .filter(|hint| !hint.trim().is_empty())
            .map(|hint| {
                Predicate::from_json(hint, self.predicate_evaluator_version.unwrap_or_default())
            })
            .transpose()?;

        Ok(ReadTableRequest {
            mode,
            predicate,
            predicate_hints: self.predicate_hints.clone(),
            limit_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_predicate::PredicateError;

    #[test]
    fn neither_version_nor_timestamp_reads_current() {
        let read = QueryRequest::current().resolve().unwrap();
        assert_eq!(read.mode, ReadMode::CurrentVersion);
        assert!(read.predicate.is_none());
    }

    #[test]
    fn exactly_one_selector_picks_its_mode() {
        let by_version = QueryRequest {
            version: Some(3),
            ..QueryRequest::default()
        };
        assert_eq!(by_version.resolve().unwrap().mode, ReadMode::Version(3));

        let by_time = QueryRequest {
            timestamp: Some("2023-10-01T00:00:00Z".to_string()),
            ..QueryRequest::default()
        };
        assert!(matches!(
            by_time.resolve().unwrap().mode,
            ReadMode::AsOfTimestamp(_)
        ));
    }

    #[test]
    fn both_selectors_are_rejected() {
        let both = QueryRequest {
            version: Some(1),
            timestamp: Some("2023-10-01T00:00:00Z".to_string()),
            ..QueryRequest::default()
        };
        let err = both.resolve().unwrap_err();
        assert!(matches!(err, SharingError::BadRequest { .. }));
        assert!(err.to_string().contains("cannot specify both version and timestamp"));
    }

    #[test]
    fn range_fields_are_not_implemented() {
        for request in [
            QueryRequest {
                starting_version: Some(0),
                ..QueryRequest::default()
            },
            QueryRequest {
                ending_version: Some(1),
                ..QueryRequest::default()
            },
            QueryRequest {
                starting_timestamp: Some("2023-10-01T00:00:00Z".to_string()),
                ..QueryRequest::default()
            },
            QueryRequest {
                ending_timestamp: Some("2023-10-01T00:00:00Z".to_string()),
                ..QueryRequest::default()
            },
        ] {
            assert!(matches!(
                request.resolve(),
                Err(SharingError::NotImplemented { .. })
            ));
        }
    }

    #[test]
    fn negative_values_and_bad_timestamps_are_rejected() {
        let negative_version = QueryRequest {
            version: Some(-1),
            ..QueryRequest::default()
        };
        assert!(matches!(
            negative_version.resolve(),
            Err(SharingError::BadRequest { .. })
        ));

        let negative_limit = QueryRequest {
            limit_hint: Some(-5),
            ..QueryRequest::default()
        };
        assert!(matches!(
            negative_limit.resolve(),
            Err(SharingError::BadRequest { .. })
        ));

        let malformed = QueryRequest {
            timestamp: Some("yesterday".to_string()),
            ..QueryRequest::default()
        };
        assert!(matches!(
            malformed.resolve(),
            Err(SharingError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn predicate_is_validated_with_requested_evaluator() {
        let hint = r#"{"op":"lessThan","children":[
            {"op":"column","name":"price","valueType":"double"},
            {"op":"literal","value":"1.5","valueType":"double"}]}"#;
        let v1 = QueryRequest {
            json_predicate_hints: Some(hint.to_string()),
            ..QueryRequest::default()
        };
        assert!(matches!(
            v1.resolve(),
            Err(SharingError::Predicate(PredicateError::UnsupportedType { .. }))
        ));

        let v2 = QueryRequest {
            json_predicate_hints: Some(hint.to_string()),
            predicate_evaluator_version: Some(EvaluatorVersion::V2),
            ..QueryRequest::default()
        };
        assert!(v2.resolve().unwrap().predicate.is_some());
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let request: QueryRequest = serde_json::from_str(
            r#"{"predicateHints":["a > 1"],"limitHint":10,"version":2,"predicateEvaluatorVersion":"v2"}"#,
        )
        .unwrap();
        assert_eq!(request.predicate_hints, vec!["a > 1".to_string()]);
        assert_eq!(request.limit_hint, Some(10));
        assert_eq!(request.version, Some(2));
        assert_eq!(request.predicate_evaluator_version, Some(EvaluatorVersion::V2));
    }
}
