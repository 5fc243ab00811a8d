//! Shared request validation rules.

use tidepool_core::model::StorageType;
use url::Url;

use crate::error::{CatalogError, CatalogResult};

/// Rejects blank entity names.
pub(crate) fn require_name(kind: &str, name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::validation(format!("{kind} name cannot be empty")));
    }
    Ok(())
}

/// Parses `uri` and returns its lowercase scheme.
pub(crate) fn uri_scheme(field: &str, uri: &str) -> CatalogResult<String> {
    if uri.trim().is_empty() {
        return Err(CatalogError::validation(format!("{field} cannot be empty")));
    }
    Url::parse(uri.trim())
        .map(|parsed| parsed.scheme().to_ascii_lowercase())
        .map_err(|e| CatalogError::validation(format!("{field} {uri:?} is not a valid URI: {e}")))
}

/// Checks that `uri` uses a scheme served by `storage_type`.
pub(crate) fn require_storage_scheme(
    field: &str,
    storage_type: StorageType,
    uri: &str,
) -> CatalogResult<()> {
    let scheme = uri_scheme(field, uri)?;
    if storage_type.uri_schemes().contains(&scheme.as_str()) {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "{field} scheme {scheme:?} does not match storage type {storage_type} (expected one of {:?})",
            storage_type.uri_schemes()
        )))
    }
}
