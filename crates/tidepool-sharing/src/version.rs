//! Version resolution against a table's commit history.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SharingError, SharingResult};

/// One commit of a table's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCommit {
    /// Commit version.
    pub version: i64,
    /// Commit instant.
    pub timestamp: DateTime<Utc>,
}

impl TableCommit {
    /// Creates a commit record.
    #[must_use]
    pub const fn new(version: i64, timestamp: DateTime<Utc>) -> Self {
        Self { version, timestamp }
    }
}

/// Which point in a table's history a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// The latest commit.
    CurrentVersion,
    /// An exact version.
    Version(i64),
    /// The latest commit at or before an instant.
    AsOfTimestamp(DateTime<Utc>),
}

/// Resolves `mode` against `history` (ascending by version).
///
/// Returns `None` when the history is empty, the version was never committed,
/// or the instant falls before the first commit or after the last one.
#[must_use]
pub fn resolve_version(history: &[TableCommit], mode: ReadMode) -> Option<i64> {
    match mode {
        ReadMode::CurrentVersion => history.last().map(|commit| commit.version),
        ReadMode::Version(version) => history
            .iter()
            .any(|commit| commit.version == version)
            .then_some(version),
        ReadMode::AsOfTimestamp(at) => {
            let first = history.first()?;
            let last = history.last()?;
            if at < first.timestamp || at > last.timestamp {
                return None;
            }
            history
                .iter()
                .rev()
                .find(|commit| commit.timestamp <= at)
                .map(|commit| commit.version)
        }
    }
}

/// Parses an ISO-8601 offset date-time; seconds may be omitted.
///
/// # Errors
///
/// Returns [`SharingError::MalformedTimestamp`] carrying the parser's message.
pub fn parse_timestamp(raw: &str) -> SharingResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(source) => parse_without_seconds(trimmed).ok_or_else(|| {
            SharingError::MalformedTimestamp {
                value: raw.to_string(),
                source,
            }
        }),
    }
}

fn parse_without_seconds(raw: &str) -> Option<DateTime<Utc>> {
    if let Some(naive) = raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        return NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|parsed| parsed.and_utc());
    }
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z")
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
