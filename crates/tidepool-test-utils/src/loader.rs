//! In-memory table loader with scripted versions and call recording.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tidepool_core::model::{
    Metadata, Protocol, TableFileToBeSigned, TableFormat, TableReference,
};
use tidepool_sharing::{
    ResolvedTable, SharingError, SharingResult, SnapshotRead, TableCommit, TableLoader,
    TableSnapshot,
};

/// Record of a loader call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderOp {
    /// History was requested.
    History {
        /// Backing table that was read.
        table: TableReference,
    },
    /// A snapshot was requested.
    Snapshot {
        /// Backing table that was read.
        table: TableReference,
        /// Requested version.
        version: i64,
        /// Requested row-count hint.
        limit_hint: Option<u64>,
    },
}

#[derive(Debug, Clone)]
struct ScriptedVersion {
    commit: TableCommit,
    snapshot: TableSnapshot,
}

#[derive(Debug, Default)]
struct LoaderState {
    tables: HashMap<TableReference, Vec<ScriptedVersion>>,
    failure: Option<String>,
    ops: Vec<LoaderOp>,
}

/// Table loader serving versions scripted by the test.
///
/// Every call is recorded so tests can assert that validation failures never
/// reach the loader.
#[derive(Debug, Clone)]
pub struct MemoryTableLoader {
    format: TableFormat,
    state: Arc<Mutex<LoaderState>>,
}

impl MemoryTableLoader {
    /// Creates an empty loader for `format`.
    #[must_use]
    pub fn new(format: TableFormat) -> Self {
        Self {
            format,
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    /// Creates an empty Delta loader.
    #[must_use]
    pub fn delta() -> Self {
        Self::new(TableFormat::Delta)
    }

    /// Appends the next version of `table`, committed at `timestamp`.
    ///
    /// Versions are numbered from 0 in the order they are added.
    pub fn push_version(
        &self,
        table: &TableReference,
        timestamp: DateTime<Utc>,
        protocol: Protocol,
        metadata: Metadata,
        files: Vec<TableFileToBeSigned>,
    ) -> i64 {
        let mut state = self.state.lock().unwrap();
        let versions = state.tables.entry(table.clone()).or_default();
        let version = i64::try_from(versions.len()).unwrap();
        versions.push(ScriptedVersion {
            commit: TableCommit::new(version, timestamp),
            snapshot: TableSnapshot {
                protocol,
                metadata: Metadata {
                    version: Some(version),
                    ..metadata
                },
                files,
            },
        });
        version
    }

    /// Makes every subsequent call fail with an upstream error.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().unwrap().failure = Some(message.into());
    }

    /// Returns all recorded calls.
    pub fn ops(&self) -> Vec<LoaderOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Clears recorded calls.
    pub fn clear_ops(&self) {
        self.state.lock().unwrap().ops.clear();
    }

    fn record(&self, op: LoaderOp) -> SharingResult<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(op);
        match &state.failure {
            Some(message) => Err(SharingError::upstream(message.clone())),
            None => Ok(()),
        }
    }
}

fn reference(table: &ResolvedTable) -> TableReference {
    TableReference::new(&table.provider.name, &table.table.name)
}

#[async_trait]
impl TableLoader for MemoryTableLoader {
    fn format(&self) -> TableFormat {
        self.format
    }

    async fn history(&self, table: &ResolvedTable) -> SharingResult<Vec<TableCommit>> {
        let key = reference(table);
        self.record(LoaderOp::History { table: key.clone() })?;
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .get(&key)
            .map(|versions| versions.iter().map(|v| v.commit).collect())
            .unwrap_or_default())
    }

    async fn snapshot(
        &self,
        table: &ResolvedTable,
        read: &SnapshotRead,
    ) -> SharingResult<TableSnapshot> {
        let key = reference(table);
        self.record(LoaderOp::Snapshot {
            table: key.clone(),
            version: read.version,
            limit_hint: read.limit_hint,
        })?;
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(&key)
            .and_then(|versions| versions.iter().find(|v| v.commit.version == read.version))
            .map(|v| v.snapshot.clone())
            .ok_or_else(|| {
                SharingError::upstream(format!("table {key} has no version {}", read.version))
            })
    }
}
