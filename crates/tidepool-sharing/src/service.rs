//! Query orchestration for Delta Sharing reads.

use std::fmt;
use std::sync::Arc;

use tidepool_catalog::CatalogServices;
use tidepool_core::model::{
    Metadata, Protocol, Schema, Share, SharedTable, TableFile, TableFileToBeSigned,
};
use tidepool_core::pagination::{ContentAndToken, PageLimits, paginate};
use tidepool_predicate::prune_files;

use crate::error::{SharingError, SharingResult};
use crate::loader::{ResolvedTable, SnapshotRead, TableLoaders};
use crate::request::QueryRequest;
use crate::signer::{FileSigner, FileSignerFactory};
use crate::version::{ReadMode, parse_timestamp, resolve_version};

/// Protocol and metadata of a table at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Resolved version.
    pub version: i64,
    /// Reader protocol.
    pub protocol: Protocol,
    /// Table metadata.
    pub metadata: Metadata,
}

/// Result of a table query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTableResult {
    /// Resolved version.
    pub version: i64,
    /// Reader protocol.
    pub protocol: Protocol,
    /// Table metadata.
    pub metadata: Metadata,
    /// Surviving files with signed URLs, in loader order.
    pub files: Vec<TableFile>,
}

/// Answers recipient reads against the share catalog.
///
/// `None` results mean the share, schema, table, or version does not exist.
#[derive(Clone)]
pub struct DeltaSharesService {
    catalog: CatalogServices,
    loaders: Arc<TableLoaders>,
    signers: Arc<dyn FileSignerFactory>,
    limits: PageLimits,
}

impl fmt::Debug for DeltaSharesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaSharesService")
            .field("loaders", &self.loaders)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl DeltaSharesService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        catalog: CatalogServices,
        loaders: TableLoaders,
        signers: Arc<dyn FileSignerFactory>,
        limits: PageLimits,
    ) -> Self {
        Self {
            catalog,
            loaders: Arc::new(loaders),
            signers,
            limits,
        }
    }

    /// Returns the page limits in effect.
    #[must_use]
    pub const fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Looks up a share by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog store fails.
    pub async fn get_share(&self, name: &str) -> SharingResult<Option<Share>> {
        Ok(self.catalog.shares.get_share(name).await?)
    }

    /// Lists shares one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`tidepool_core::Error::InvalidPageToken`] for an undecodable token.
    #[tracing::instrument(skip(self))]
    pub async fn list_shares(
        &self,
        token: Option<&str>,
        max_results: Option<usize>,
    ) -> SharingResult<ContentAndToken<Share>> {
        let request = self.limits.request(token, max_results)?;
        let shares = self.catalog.shares.list_shares().await?;
        tracing::debug!(total = shares.len(), offset = request.offset, "listing shares");
        Ok(paginate(shares, request))
    }

    /// Lists the schemas of a share.
    ///
    /// # Errors
    ///
    /// Returns [`tidepool_core::Error::InvalidPageToken`] for an undecodable token.
    #[tracing::instrument(skip(self))]
    pub async fn list_schemas(
        &self,
        share: &str,
        token: Option<&str>,
        max_results: Option<usize>,
    ) -> SharingResult<Option<ContentAndToken<Schema>>> {
        let request = self.limits.request(token, max_results)?;
        let schemas = self.catalog.shares.list_schemas(share).await?;
        Ok(schemas.map(|schemas| paginate(schemas, request)))
    }

    /// Lists the tables of one schema.
    ///
    /// # Errors
    ///
    /// Returns [`tidepool_core::Error::InvalidPageToken`] for an undecodable token.
    #[tracing::instrument(skip(self))]
    pub async fn list_tables(
        &self,
        share: &str,
        schema: &str,
        token: Option<&str>,
        max_results: Option<usize>,
    ) -> SharingResult<Option<ContentAndToken<SharedTable>>> {
        let request = self.limits.request(token, max_results)?;
        let tables = self.catalog.shares.list_tables(share, schema).await?;
        Ok(tables.map(|tables| paginate(tables, request)))
    }

    /// Lists the tables of every schema in a share.
    ///
    /// # Errors
    ///
    /// Returns [`tidepool_core::Error::InvalidPageToken`] for an undecodable token.
    #[tracing::instrument(skip(self))]
    pub async fn list_tables_of_share(
        &self,
        share: &str,
        token: Option<&str>,
        max_results: Option<usize>,
    ) -> SharingResult<Option<ContentAndToken<SharedTable>>> {
        let request = self.limits.request(token, max_results)?;
        let tables = self.catalog.shares.list_tables_of_share(share).await?;
        Ok(tables.map(|tables| paginate(tables, request)))
    }

    /// Returns the table version current at `timestamp`, or the latest one.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::MalformedTimestamp`] when `timestamp` does not
    /// parse, and [`SharingError::Upstream`] when the loader fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_table_version(
        &self,
        share: &str,
        schema: &str,
        table: &str,
        timestamp: Option<&str>,
    ) -> SharingResult<Option<i64>> {
        let mode = read_mode(timestamp)?;
        let Some(resolved) = self.resolve_table(share, schema, table).await? else {
            return Ok(None);
        };
        let loader = self.loaders.get(resolved.table.format())?;
        let history = loader
            .history(&resolved)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to load table history"))?;
        Ok(resolve_version(&history, mode))
    }

    /// Returns protocol and metadata at `timestamp`, or at the latest version.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::MalformedTimestamp`] when `timestamp` does not
    /// parse, and [`SharingError::Upstream`] when the loader fails.
    #[tracing::instrument(skip(self))]
    pub async fn get_table_metadata(
        &self,
        share: &str,
        schema: &str,
        table: &str,
        timestamp: Option<&str>,
    ) -> SharingResult<Option<TableMetadata>> {
        let mode = read_mode(timestamp)?;
        let Some(resolved) = self.resolve_table(share, schema, table).await? else {
            return Ok(None);
        };
        let loader = self.loaders.get(resolved.table.format())?;
        let history = loader
            .history(&resolved)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to load table history"))?;
        let Some(version) = resolve_version(&history, mode) else {
            tracing::debug!("no version matches the requested read");
            return Ok(None);
        };
        let (protocol, metadata) = loader
            .metadata(&resolved, version)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, version, "failed to load metadata"))?;
        Ok(Some(TableMetadata {
            version,
            protocol,
            metadata,
        }))
    }

    /// Answers a table query: resolves the version, prunes files with the
    /// predicate hint, and signs every surviving file.
    ///
    /// The request is validated before any catalog or loader access.
    ///
    /// # Errors
    ///
    /// Returns the request's validation errors, [`SharingError::UnsupportedStorage`]
    /// or [`SharingError::UnsupportedTableFormat`] when the table cannot be
    /// served, and [`SharingError::Upstream`] when loading or signing fails.
    #[tracing::instrument(skip(self, request))]
    pub async fn query_table(
        &self,
        share: &str,
        schema: &str,
        table: &str,
        request: &QueryRequest,
    ) -> SharingResult<Option<ReadTableResult>> {
        let read = request.resolve()?;
        let Some(resolved) = self.resolve_table(share, schema, table).await? else {
            return Ok(None);
        };
        let signer = self.signers.new_file_signer(&resolved.storage)?;
        let loader = self.loaders.get(resolved.table.format())?;

        let history = loader
            .history(&resolved)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "failed to load table history"))?;
        let Some(version) = resolve_version(&history, read.mode) else {
            tracing::debug!(mode = ?read.mode, "no version matches the requested read");
            return Ok(None);
        };

        let snapshot = loader
            .snapshot(
                &resolved,
                &SnapshotRead {
                    version,
                    limit_hint: read.limit_hint,
                },
            )
            .await
            .inspect_err(|e| tracing::warn!(error = %e, version, "failed to load snapshot"))?;

        let files = match &read.predicate {
            Some(predicate) => prune_files(predicate, snapshot.files),
            None => snapshot.files,
        };
        let files = sign_all(signer.as_ref(), files)?;
        tracing::debug!(version, files = files.len(), "answered table query");

        Ok(Some(ReadTableResult {
            version,
            protocol: snapshot.protocol,
            metadata: snapshot.metadata,
            files,
        }))
    }

    /// Follows a shared table to its backing table, provider, and storage.
    ///
    /// A reference the catalog cannot follow is an internal inconsistency.
    async fn resolve_table(
        &self,
        share: &str,
        schema: &str,
        table: &str,
    ) -> SharingResult<Option<ResolvedTable>> {
        let Some(shared) = self
            .catalog
            .shares
            .get_shared_table(share, schema, table)
            .await?
        else {
            return Ok(None);
        };
        let reference = &shared.table;
        let provider = self
            .catalog
            .providers
            .get_provider(&reference.provider_name)
            .await?
            .ok_or_else(|| dangling("provider", &reference.provider_name))?;
        let internal = self
            .catalog
            .tables
            .get_internal_table(&provider.name, &reference.table_name)
            .await?
            .ok_or_else(|| dangling("table", &reference.to_string()))?;
        let storage = self
            .catalog
            .storages
            .get_storage(&provider.storage_name)
            .await?
            .ok_or_else(|| dangling("storage", &provider.storage_name))?;
        let metastore = match provider.metastore_name.as_deref() {
            Some(name) => Some(
                self.catalog
                    .metastores
                    .get_metastore(name)
                    .await?
                    .ok_or_else(|| dangling("metastore", name))?,
            ),
            None => None,
        };
        tracing::debug!(
            table = %reference,
            format = %internal.format(),
            storage = %storage.name,
            "resolved shared table"
        );
        Ok(Some(ResolvedTable {
            shared,
            table: internal,
            provider,
            storage,
            metastore,
        }))
    }
}

fn read_mode(timestamp: Option<&str>) -> SharingResult<ReadMode> {
    Ok(match timestamp {
        Some(raw) => ReadMode::AsOfTimestamp(parse_timestamp(raw)?),
        None => ReadMode::CurrentVersion,
    })
}

fn sign_all(
    signer: &dyn FileSigner,
    files: Vec<TableFileToBeSigned>,
) -> SharingResult<Vec<TableFile>> {
    files
        .into_iter()
        .map(|file| {
            let id = file.id.clone();
            signer
                .sign(file)
                .inspect_err(|e| tracing::warn!(error = %e, file = %id, "failed to sign file"))
        })
        .collect()
}

fn dangling(resource: &str, name: &str) -> SharingError {
    SharingError::Internal {
        message: format!("shared table references missing {resource} {name}"),
    }
}
