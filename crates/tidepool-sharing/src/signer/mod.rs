//! File signing: internal storage locations to time-limited URLs.

mod s3;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tidepool_core::SharedClock;
use tidepool_core::model::{Storage, StorageProperties, TableFile, TableFileToBeSigned};

use crate::error::{SharingError, SharingResult};

pub use s3::S3FileSigner;

/// Signed URL lifetime used when none is configured.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Longest lifetime a presigned S3 URL may have.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Signs data files of one storage.
pub trait FileSigner: Send + Sync + Debug {
    /// Replaces the file's location with a signed URL and sets its expiration.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::Upstream`] when the location cannot be signed.
    fn sign(&self, file: TableFileToBeSigned) -> SharingResult<TableFile>;
}

/// Builds the signer for a storage.
pub trait FileSignerFactory: Send + Sync + 'static {
    /// Creates a signer using `storage`'s credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::UnsupportedStorage`] when the storage type has
    /// no signer.
    fn new_file_signer(&self, storage: &Storage) -> SharingResult<Box<dyn FileSigner>>;
}

/// Chooses a signer by storage type.
#[derive(Debug, Clone)]
pub struct StorageFileSignerFactory {
    clock: SharedClock,
    ttl: Duration,
}

impl StorageFileSignerFactory {
    /// Creates a factory issuing URLs valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`SharingError::BadRequest`] when `ttl` is shorter than one
    /// second or longer than seven days.
    pub fn new(clock: SharedClock, ttl: Duration) -> SharingResult<Self> {
        if ttl < Duration::from_secs(1) || ttl > MAX_SIGNED_URL_TTL {
            return Err(SharingError::bad_request(format!(
                "signed url ttl must be between 1 and {} seconds, got {}",
                MAX_SIGNED_URL_TTL.as_secs(),
                ttl.as_secs()
            )));
        }
        Ok(Self { clock, ttl })
    }

    /// Creates a factory with the default one-hour lifetime.
    #[must_use]
    pub fn with_default_ttl(clock: SharedClock) -> Self {
        Self {
            clock,
            ttl: DEFAULT_SIGNED_URL_TTL,
        }
    }

    /// Returns the configured URL lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl FileSignerFactory for StorageFileSignerFactory {
    fn new_file_signer(&self, storage: &Storage) -> SharingResult<Box<dyn FileSigner>> {
        match &storage.properties {
            StorageProperties::S3(properties) => Ok(Box::new(S3FileSigner::new(
                properties,
                Arc::clone(&self.clock),
                self.ttl,
            ))),
            StorageProperties::Gcs(_) | StorageProperties::Abfs(_) => {
                Err(SharingError::UnsupportedStorage {
                    storage_type: storage.storage_type,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_core::FixedClock;
    use tidepool_core::model::{
        AbfsProperties, Audit, AwsCredentials, GcsProperties, Principal, S3Properties,
        SimpleAwsCredentials, StorageType,
    };

    fn storage(properties: StorageProperties) -> Storage {
        let owner = Principal::new("owner").unwrap();
        Storage {
            name: "store".to_string(),
            comment: None,
            owner: owner.clone(),
            storage_type: properties.storage_type(),
            uri: "s3://bucket".to_string(),
            properties,
            validated_at: None,
            audit: Audit::created(&owner, chrono::DateTime::UNIX_EPOCH),
        }
    }

    fn clock() -> SharedClock {
        Arc::new(FixedClock::from_millis(0))
    }

    #[test]
    fn ttl_bounds_are_enforced_at_construction() {
        assert!(StorageFileSignerFactory::new(clock(), Duration::from_secs(0)).is_err());
        assert!(StorageFileSignerFactory::new(clock(), Duration::from_secs(1)).is_ok());
        assert!(StorageFileSignerFactory::new(clock(), MAX_SIGNED_URL_TTL).is_ok());
        assert!(
            StorageFileSignerFactory::new(clock(), MAX_SIGNED_URL_TTL + Duration::from_secs(1))
                .is_err()
        );
        assert_eq!(
            StorageFileSignerFactory::with_default_ttl(clock()).ttl(),
            DEFAULT_SIGNED_URL_TTL
        );
    }

    #[test]
    fn unsupported_storage_fails_at_construction() {
        let factory = StorageFileSignerFactory::with_default_ttl(clock());
        let gcs = storage(StorageProperties::Gcs(GcsProperties {
            service_account_key: "{}".to_string(),
        }));
        assert!(matches!(
            factory.new_file_signer(&gcs),
            Err(SharingError::UnsupportedStorage {
                storage_type: StorageType::Gcs
            })
        ));
        let abfs = storage(StorageProperties::Abfs(AbfsProperties {
            account_name: "acct".to_string(),
            account_key: "key".to_string(),
        }));
        assert!(factory.new_file_signer(&abfs).is_err());

        let s3 = storage(StorageProperties::S3(S3Properties {
            credentials: AwsCredentials::Simple(SimpleAwsCredentials::new("a", "b", "us-east-1")),
            endpoint: None,
        }));
        assert!(factory.new_file_signer(&s3).is_ok());
    }
}
