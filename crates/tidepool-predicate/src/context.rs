//! Per-file evaluation context.

use std::collections::BTreeMap;

use tidepool_core::model::TableFileToBeSigned;

/// Partition values and column statistics of one data file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalContext {
    partition_values: BTreeMap<String, String>,
    stats_values: BTreeMap<String, (String, String)>,
}

impl EvalContext {
    /// Creates a context from partition values and `(min, max)` statistics.
    #[must_use]
    pub fn new(
        partition_values: BTreeMap<String, String>,
        stats_values: BTreeMap<String, (String, String)>,
    ) -> Self {
        Self {
            partition_values,
            stats_values,
        }
    }

    /// Builds the context for a loader-produced file.
    ///
    /// Unreadable statistics are treated as absent, which keeps the file.
    #[must_use]
    pub fn for_file(file: &TableFileToBeSigned) -> Self {
        let stats_values = match file.file_stats() {
            Ok(Some(stats)) => stats.column_bounds(),
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                tracing::debug!(file_id = %file.id, error = %err, "ignoring unreadable file stats");
                BTreeMap::new()
            }
        };
        Self::new(file.partition_values.clone(), stats_values)
    }

    /// Returns the partition value of `column`, if it is a partition column.
    #[must_use]
    pub fn partition_value(&self, column: &str) -> Option<&str> {
        self.partition_values.get(column).map(String::as_str)
    }

    /// Returns the `(min, max)` statistics of `column`, if known.
    #[must_use]
    pub fn stats(&self, column: &str) -> Option<(&str, &str)> {
        self.stats_values
            .get(column)
            .map(|(min, max)| (min.as_str(), max.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(stats: Option<&str>) -> TableFileToBeSigned {
        TableFileToBeSigned {
            id: "f1".to_string(),
            url: "s3://bucket/f1".to_string(),
            size: 1,
            partition_values: BTreeMap::from([("date".to_string(), "2024-01-01".to_string())]),
            stats: stats.map(str::to_string),
            version: None,
            timestamp: None,
        }
    }

    #[test]
    fn for_file_reads_partitions_and_stats() {
        let ctx = EvalContext::for_file(&file(Some(
            r#"{"numRecords":2,"minValues":{"id":1},"maxValues":{"id":5},"nullCount":{}}"#,
        )));
        assert_eq!(ctx.partition_value("date"), Some("2024-01-01"));
        assert_eq!(ctx.stats("id"), Some(("1", "5")));
        assert_eq!(ctx.stats("date"), None);
    }

    #[test]
    fn unreadable_stats_are_treated_as_absent() {
        let ctx = EvalContext::for_file(&file(Some("{broken")));
        assert_eq!(ctx.stats("id"), None);
        assert_eq!(ctx.partition_value("date"), Some("2024-01-01"));
    }
}
