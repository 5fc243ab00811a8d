//! Table-format loading capability.
//!
//! The sharing layer never reads table files itself. A [`TableLoader`] per
//! [`TableFormat`] reports a table's commit history and returns the protocol,
//! metadata, and data files at one version.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tidepool_core::model::{
    InternalTable, Metadata, Metastore, Protocol, Provider, SharedTable, Storage,
    TableFileToBeSigned, TableFormat,
};

use crate::error::{SharingError, SharingResult};
use crate::version::TableCommit;

/// A shared table with every catalog entity needed to read it.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    /// The name recipients asked for.
    pub shared: SharedTable,
    /// The backing table.
    pub table: InternalTable,
    /// The provider owning the backing table.
    pub provider: Provider,
    /// The provider's storage.
    pub storage: Storage,
    /// The provider's metastore, if any.
    pub metastore: Option<Metastore>,
}

/// Point-in-time read handed to a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotRead {
    /// Resolved version.
    pub version: i64,
    /// Row-count hint from the client.
    pub limit_hint: Option<u64>,
}

/// A table's state at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    /// Reader protocol.
    pub protocol: Protocol,
    /// Table metadata.
    pub metadata: Metadata,
    /// Live data files, in loader order.
    pub files: Vec<TableFileToBeSigned>,
}

/// Reads one table format.
///
/// Failures should be reported as [`SharingError::Upstream`].
#[async_trait]
pub trait TableLoader: Send + Sync + 'static {
    /// The format this loader reads.
    fn format(&self) -> TableFormat;

    /// Returns every commit, ascending by version.
    async fn history(&self, table: &ResolvedTable) -> SharingResult<Vec<TableCommit>>;

    /// Returns the table's state at `read.version`.
    async fn snapshot(&self, table: &ResolvedTable, read: &SnapshotRead)
    -> SharingResult<TableSnapshot>;

    /// Returns protocol and metadata at `version`.
    ///
    /// The default reads a full snapshot and drops its files.
    async fn metadata(
        &self,
        table: &ResolvedTable,
        version: i64,
    ) -> SharingResult<(Protocol, Metadata)> {
        let snapshot = self
            .snapshot(
                table,
                &SnapshotRead {
                    version,
                    limit_hint: None,
                },
            )
            .await?;
        Ok((snapshot.protocol, snapshot.metadata))
    }
}

/// Loaders keyed by the format they read.
#[derive(Clone, Default)]
pub struct TableLoaders {
    loaders: HashMap<TableFormat, Arc<dyn TableLoader>>,
}

impl TableLoaders {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `loader` for its format, replacing any previous one.
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn TableLoader>) -> Self {
        self.loaders.insert(loader.format(), loader);
        self
    }

    /// Returns the loader for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::UnsupportedTableFormat`] when none is registered.
    pub fn get(&self, format: TableFormat) -> SharingResult<Arc<dyn TableLoader>> {
        self.loaders
            .get(&format)
            .cloned()
            .ok_or(SharingError::UnsupportedTableFormat { format })
    }
}

impl fmt::Debug for TableLoaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.loaders.keys().map(|f| f.as_str()).collect();
        formats.sort_unstable();
        f.debug_struct("TableLoaders").field("formats", &formats).finish()
    }
}
