//! AWS Signature Version 4 presigned GET URLs for S3 objects.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use tidepool_core::SharedClock;
use tidepool_core::model::{AwsCredentials, S3Properties, TableFile, TableFileToBeSigned};

use super::FileSigner;
use crate::error::{SharingError, SharingResult};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
const DEFAULT_REGION: &str = "us-east-1";

/// RFC 3986 unreserved characters stay literal.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PATH_ENCODE: &AsciiSet = &QUERY_ENCODE.remove(b'/');

/// Presigns `s3://`, `s3a://`, and `s3n://` locations.
pub struct S3FileSigner {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    endpoint: Option<String>,
    clock: SharedClock,
    ttl: Duration,
}

impl fmt::Debug for S3FileSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3FileSigner")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .finish()
    }
}

struct ObjectLocation<'a> {
    bucket: &'a str,
    key: &'a str,
}

impl<'a> ObjectLocation<'a> {
    fn parse(location: &'a str) -> SharingResult<Self> {
        let (scheme, rest) = location.split_once("://").ok_or_else(|| {
            SharingError::upstream(format!("file location {location:?} has no scheme"))
        })?;
        if !matches!(scheme, "s3" | "s3a" | "s3n") {
            return Err(SharingError::upstream(format!(
                "file location {location:?} is not an s3 location"
            )));
        }
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() || key.is_empty() {
            return Err(SharingError::upstream(format!(
                "file location {location:?} must name a bucket and a key"
            )));
        }
        Ok(Self { bucket, key })
    }
}

/// Where the request goes: scheme, host header, and canonical path.
struct Target {
    scheme: String,
    host: String,
    path: String,
}

impl S3FileSigner {
    /// Creates a signer from S3 storage properties.
    #[must_use]
    pub fn new(properties: &S3Properties, clock: SharedClock, ttl: Duration) -> Self {
        let AwsCredentials::Simple(credentials) = &properties.credentials;
        let region = if credentials.region.trim().is_empty() {
            DEFAULT_REGION.to_string()
        } else {
            credentials.region.clone()
        };
        Self {
            access_key_id: credentials.aws_access_key_id.clone(),
            secret_access_key: credentials.aws_secret_access_key.clone(),
            region,
            endpoint: properties.endpoint.clone(),
            clock,
            ttl,
        }
    }

    fn target(&self, location: &ObjectLocation<'_>) -> SharingResult<Target> {
        let key = utf8_percent_encode(location.key, PATH_ENCODE).to_string();
        match self.endpoint.as_deref() {
            Some(endpoint) => {
                let parsed = url::Url::parse(endpoint).map_err(|e| {
                    SharingError::upstream_with_source(
                        format!("invalid s3 endpoint {endpoint:?}"),
                        e,
                    )
                })?;
                let host = parsed.host_str().ok_or_else(|| {
                    SharingError::upstream(format!("s3 endpoint {endpoint:?} has no host"))
                })?;
                let host = match parsed.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                // Keep the endpoint's mount path; `Url::path` is already encoded.
                let prefix = parsed.path().trim_end_matches('/');
                let bucket = utf8_percent_encode(location.bucket, QUERY_ENCODE);
                Ok(Target {
                    scheme: parsed.scheme().to_string(),
                    host,
                    path: format!("{prefix}/{bucket}/{key}"),
                })
            }
            None => {
                let host = if self.region == DEFAULT_REGION {
                    format!("{}.s3.amazonaws.com", location.bucket)
                } else {
                    format!("{}.s3.{}.amazonaws.com", location.bucket, self.region)
                };
                Ok(Target {
                    scheme: "https".to_string(),
                    host,
                    path: format!("/{key}"),
                })
            }
        }
    }

    /// Builds a presigned GET URL for `location` valid from `now` for the
    /// configured lifetime.
    fn presign(&self, location: &str, now: DateTime<Utc>) -> SharingResult<String> {
        let object = ObjectLocation::parse(location)?;
        let target = self.target(&object)?;

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let credential = format!("{}/{scope}", self.access_key_id);

        // Already in canonical (sorted) order.
        let query = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", self.ttl.as_secs().to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_ENCODE)))
        .collect::<Vec<_>>()
        .join("&");

        let canonical_request = format!(
            "GET\n{}\n{query}\nhost:{}\n\nhost\n{UNSIGNED_PAYLOAD}",
            target.path, target.host
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{}://{}{}?{query}&X-Amz-Signature={signature}",
            target.scheme, target.host, target.path
        ))
    }

    fn signing_key(&self, date: &str) -> SharingResult<Vec<u8>> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let date_key = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let region_key = hmac_sha256(&date_key, self.region.as_bytes())?;
        let service_key = hmac_sha256(&region_key, SERVICE.as_bytes())?;
        hmac_sha256(&service_key, b"aws4_request")
    }
}

impl FileSigner for S3FileSigner {
    fn sign(&self, file: TableFileToBeSigned) -> SharingResult<TableFile> {
        let now = self.clock.now();
        let url = self.presign(&file.url, now)?;
        let ttl_millis = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let expiration = now.timestamp_millis().saturating_add(ttl_millis);
        Ok(TableFile::signed(file, url, expiration))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> SharingResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SharingError::Internal {
        message: "failed to initialize hmac".to_string(),
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
