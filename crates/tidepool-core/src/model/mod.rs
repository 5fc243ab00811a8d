//! Catalog entities and per-query snapshot records.

pub mod metastore;
pub mod principal;
pub mod provider;
pub mod share;
pub mod snapshot;
pub mod storage;
pub mod table;

pub use metastore::{Metastore, MetastoreProperties, MetastoreType};
pub use principal::{Audit, Principal};
pub use provider::Provider;
pub use share::{Schema, Share, SharedTable};
pub use snapshot::{
    DEFAULT_MIN_READER_VERSION, FileStats, Format, Metadata, Protocol, TableFile,
    TableFileToBeSigned,
};
pub use storage::{
    AbfsProperties, AwsCredentials, GcsProperties, S3Properties, SimpleAwsCredentials, Storage,
    StorageProperties, StorageType,
};
pub use table::{InternalTable, InternalTableProperties, TableFormat, TableReference};
