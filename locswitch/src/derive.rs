//! Derived configuration.
//!
//! ADLS SAS tokens are frequently configured against the bare account name
//! (`adls.sas-token.<account>`) while the delegate looks them up by endpoint
//! (`adls.sas-token.<account>.blob.core.windows.net`). `ConfigDeriver` fills in
//! the canonical blob-endpoint key. Explicit configuration always wins: a key
//! that is already present is never overwritten.

use tracing::info;

use crate::properties::Properties;

/// Prefix of SAS token credential keys.
pub const SAS_TOKEN_PREFIX: &str = "adls.sas-token";

/// Blob endpoint suffix; derived keys use this form.
pub const BLOB_ENDPOINT_SUFFIX: &str = ".blob.core.windows.net";

/// Data Lake endpoint suffix.
pub const DFS_ENDPOINT_SUFFIX: &str = ".dfs.core.windows.net";

/// Synthesizes configuration entries implied by existing ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigDeriver;

impl ConfigDeriver {
    /// Return `properties` plus every derived entry.
    ///
    /// The input is left untouched. Running `derive` on its own output adds
    /// nothing.
    pub fn derive(properties: &Properties) -> Properties {
        let mut derived = properties.clone();

        for (key, value) in properties.iter() {
            let Some(new_key) = Self::canonical_key(key) else {
                continue;
            };
            if derived.contains_key(&new_key) {
                continue;
            }
            info!("Added derived property: {}", new_key);
            derived.insert(new_key, value);
        }

        derived
    }

    /// Canonical endpoint key for a SAS token key that lacks an endpoint suffix.
    fn canonical_key(key: &str) -> Option<String> {
        if !key.starts_with(SAS_TOKEN_PREFIX)
            || key.ends_with(BLOB_ENDPOINT_SUFFIX)
            || key.ends_with(DFS_ENDPOINT_SUFFIX)
        {
            return None;
        }
        Some(format!("{}{}", key, BLOB_ENDPOINT_SUFFIX))
    }
}
