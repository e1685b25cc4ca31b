//! Store endpoints and access signatures, read from the environment.

use manualhub_core::Visibility;

use crate::error::StoreError;

pub const PUBLIC_BLOB_URL: &str = "MANUALHUB_PUBLIC_BLOB_URL";
pub const PUBLIC_BLOB_SAS: &str = "MANUALHUB_PUBLIC_BLOB_SAS";
pub const RESTRICTED_BLOB_URL: &str = "MANUALHUB_RESTRICTED_BLOB_URL";
pub const RESTRICTED_BLOB_SAS: &str = "MANUALHUB_RESTRICTED_BLOB_SAS";
pub const TABLE_URL: &str = "MANUALHUB_TABLE_URL";
pub const TABLE_SAS: &str = "MANUALHUB_TABLE_SAS";

pub const PUBLIC_CONTAINER: &str = "instructionmanuals";
pub const RESTRICTED_CONTAINER: &str = "servicemanuals";

/// Container name reported for files of the given visibility.
pub fn container_for(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => PUBLIC_CONTAINER,
        Visibility::Restricted => RESTRICTED_CONTAINER,
    }
}

/// A base URL plus the shared access signature appended to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    /// Query string without the leading `?`.
    pub sas: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, sas: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let sas = sas.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            sas: sas.trim().trim_start_matches('?').to_string(),
        }
    }

    fn from_parts(url: Option<String>, sas: Option<String>) -> Option<Self> {
        let url = url.filter(|u| !u.trim().is_empty())?;
        let sas = sas.filter(|s| !s.trim().is_empty())?;
        Some(Self::new(url.trim(), sas))
    }
}

// The signature is a credential; keep it out of logs.
impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("sas", &"<redacted>")
            .finish()
    }
}

/// All endpoints the store may use. Any of them may be absent; operations
/// needing a missing one fail with `StoreError::Configuration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub public_blob: Option<Endpoint>,
    pub restricted_blob: Option<Endpoint>,
    pub table: Option<Endpoint>,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            public_blob: Endpoint::from_parts(lookup(PUBLIC_BLOB_URL), lookup(PUBLIC_BLOB_SAS)),
            restricted_blob: Endpoint::from_parts(
                lookup(RESTRICTED_BLOB_URL),
                lookup(RESTRICTED_BLOB_SAS),
            ),
            table: Endpoint::from_parts(lookup(TABLE_URL), lookup(TABLE_SAS)),
        }
    }

    pub fn blob(&self, visibility: Visibility) -> Result<&Endpoint, StoreError> {
        let (endpoint, url_var, sas_var) = match visibility {
            Visibility::Public => (&self.public_blob, PUBLIC_BLOB_URL, PUBLIC_BLOB_SAS),
            Visibility::Restricted => {
                (&self.restricted_blob, RESTRICTED_BLOB_URL, RESTRICTED_BLOB_SAS)
            }
        };
        endpoint.as_ref().ok_or_else(|| {
            StoreError::configuration(format!(
                "{} blob storage is not configured ({url_var} / {sas_var})",
                visibility.as_str()
            ))
        })
    }

    pub fn table(&self) -> Result<&Endpoint, StoreError> {
        self.table.as_ref().ok_or_else(|| {
            StoreError::configuration(format!(
                "table storage is not configured ({TABLE_URL} / {TABLE_SAS})"
            ))
        })
    }
}
