//! Per-query table snapshot records: protocol, metadata, and data files.
//!
//! These values are produced by table loaders and the file signer for a single
//! request and are never persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Reader version assumed when a table does not declare one.
pub const DEFAULT_MIN_READER_VERSION: i32 = 1;

/// Wire-protocol capability descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    /// Minimum reader version, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_reader_version: Option<i32>,
}

impl Protocol {
    /// Creates a protocol declaring `min_reader_version`.
    #[must_use]
    pub const fn new(min_reader_version: i32) -> Self {
        Self {
            min_reader_version: Some(min_reader_version),
        }
    }

    /// Returns the declared reader version, or the default of 1.
    #[must_use]
    pub fn effective_min_reader_version(&self) -> i32 {
        self.min_reader_version
            .unwrap_or(DEFAULT_MIN_READER_VERSION)
    }
}

/// Data file format descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    /// File format provider (e.g. `parquet`).
    pub provider: String,
    /// Format options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            provider: "parquet".to_string(),
            options: BTreeMap::new(),
        }
    }
}

/// Table schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Table id assigned by the table format.
    pub id: String,
    /// Optional table name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Data file format.
    #[serde(default)]
    pub format: Format,
    /// Schema rendered by the table-format reader.
    pub schema_string: String,
    /// Partition column names, in partition order.
    #[serde(default)]
    pub partition_columns: Vec<String>,
    /// Table configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, String>,
    /// Version this metadata was read at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Total table size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Number of live data files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_files: Option<i64>,
}

/// A data file as produced by a table loader, before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFileToBeSigned {
    /// Stable file id.
    pub id: String,
    /// Internal storage location (e.g. `s3://bucket/key`).
    pub url: String,
    /// File size in bytes.
    pub size: i64,
    /// Partition column values.
    #[serde(default)]
    pub partition_values: BTreeMap<String, String>,
    /// Raw JSON statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
    /// Version that added the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Commit timestamp (epoch millis) of that version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl TableFileToBeSigned {
    /// Parses the attached statistics, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] when the stats are not valid JSON.
    pub fn file_stats(&self) -> Result<Option<FileStats>> {
        self.stats.as_deref().map(FileStats::parse).transpose()
    }
}

/// A data file of a query result, carrying a signed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFile {
    /// Stable file id.
    pub id: String,
    /// Signed, time-limited URL.
    pub url: String,
    /// Partition column values.
    #[serde(default)]
    pub partition_values: BTreeMap<String, String>,
    /// File size in bytes.
    pub size: i64,
    /// Raw JSON statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<String>,
    /// Version that added the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Commit timestamp (epoch millis) of that version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// When the signed URL stops working (epoch millis).
    pub expiration_timestamp: i64,
}

impl TableFile {
    /// Builds the signed form of `file`, replacing its location.
    #[must_use]
    pub fn signed(file: TableFileToBeSigned, url: String, expiration_timestamp: i64) -> Self {
        Self {
            id: file.id,
            url,
            partition_values: file.partition_values,
            size: file.size,
            stats: file.stats,
            version: file.version,
            timestamp: file.timestamp,
            expiration_timestamp,
        }
    }
}

/// Parsed per-file column statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    /// Row count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_records: Option<i64>,
    /// Per-column minimums.
    #[serde(default)]
    pub min_values: Map<String, Value>,
    /// Per-column maximums.
    #[serde(default)]
    pub max_values: Map<String, Value>,
    /// Per-column null counts.
    #[serde(default)]
    pub null_count: Map<String, Value>,
}

impl FileStats {
    /// Parses a stats JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] when `raw` is not a stats object.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Returns `(min, max)` text bounds per column.
    ///
    /// Nested struct columns are flattened to dotted paths. Columns missing
    /// either bound, or whose bounds are not scalars, are omitted.
    #[must_use]
    pub fn column_bounds(&self) -> BTreeMap<String, (String, String)> {
        let mut mins = BTreeMap::new();
        flatten_scalars("", &self.min_values, &mut mins);
        let mut maxs = BTreeMap::new();
        flatten_scalars("", &self.max_values, &mut maxs);

        mins.into_iter()
            .filter_map(|(column, min)| maxs.remove(&column).map(|max| (column, (min, max))))
            .collect()
    }
}

fn flatten_scalars(prefix: &str, values: &Map<String, Value>, out: &mut BTreeMap<String, String>) {
    for (key, value) in values {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::String(s) => {
                out.insert(path, s.clone());
            }
            Value::Number(n) => {
                out.insert(path, n.to_string());
            }
            Value::Bool(b) => {
                out.insert(path, b.to_string());
            }
            Value::Object(nested) => flatten_scalars(&path, nested, out),
            Value::Null | Value::Array(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_defaults_reader_version_to_one() {
        assert_eq!(Protocol::default().effective_min_reader_version(), 1);
        assert_eq!(Protocol::new(3).effective_min_reader_version(), 3);
    }

    #[test]
    fn column_bounds_flatten_nested_and_skip_partial_columns() {
        let stats = FileStats::parse(
            r#"{"numRecords":10,
                "minValues":{"id":1,"name":"a","nested":{"x":2.5},"only_min":3},
                "maxValues":{"id":9,"name":"m","nested":{"x":7.5}},
                "nullCount":{"id":0}}"#,
        )
        .unwrap();

        let bounds = stats.column_bounds();
        assert_eq!(stats.num_records, Some(10));
        assert_eq!(bounds.get("id"), Some(&("1".to_string(), "9".to_string())));
        assert_eq!(
            bounds.get("name"),
            Some(&("a".to_string(), "m".to_string()))
        );
        assert_eq!(
            bounds.get("nested.x"),
            Some(&("2.5".to_string(), "7.5".to_string()))
        );
        assert!(!bounds.contains_key("only_min"));
    }

    #[test]
    fn signing_keeps_every_field_but_url() {
        let file = TableFileToBeSigned {
            id: "f1".to_string(),
            url: "s3://bucket/f1.parquet".to_string(),
            size: 42,
            partition_values: BTreeMap::from([("date".to_string(), "2024-01-01".to_string())]),
            stats: Some("{}".to_string()),
            version: Some(3),
            timestamp: Some(1_000),
        };
        let signed = TableFile::signed(file.clone(), "https://signed".to_string(), 5_000);
        assert_eq!(signed.id, file.id);
        assert_eq!(signed.size, file.size);
        assert_eq!(signed.partition_values, file.partition_values);
        assert_eq!(signed.stats, file.stats);
        assert_eq!(signed.version, file.version);
        assert_eq!(signed.timestamp, file.timestamp);
        assert_eq!(signed.url, "https://signed");
        assert_eq!(signed.expiration_timestamp, 5_000);
    }

    #[test]
    fn malformed_stats_are_a_serialization_error() {
        let file = TableFileToBeSigned {
            id: "f".to_string(),
            url: "s3://b/f".to_string(),
            size: 1,
            partition_values: BTreeMap::new(),
            stats: Some("not json".to_string()),
            version: None,
            timestamp: None,
        };
        assert!(matches!(
            file.file_stats(),
            Err(crate::Error::Serialization { .. })
        ));
    }
}
