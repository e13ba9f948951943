// Catalog data model
//
// Mirrors the subset of the ReportService2010 contract the installer needs:
// item listings, name/value properties, data source definitions, and the
// warning diagnostics returned alongside item creation.

use serde::{Deserialize, Serialize};

/// Name of the shared data source every published report binds to.
pub const DATA_SOURCE_NAME: &str = "ReportDataSource";

/// A name/value property attached to a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An entry in the catalog namespace, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub path: String,
    /// Server-side type name ("Folder", "Report", "Resource", "DataSource", ...)
    pub type_name: String,
}

/// Handle to an item the server just created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedItem {
    pub name: String,
    pub path: String,
    pub type_name: String,
}

/// Non-fatal diagnostic returned alongside a successful item creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    pub code: String,
    pub severity: String,
    pub message: String,
}

/// How the report server obtains credentials when a report runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialRetrieval {
    /// Forward the caller's ambient identity; no stored username/password.
    Integrated,
    Prompt,
    Store,
    None,
}

impl CredentialRetrieval {
    /// Wire value used in the SOAP definition element.
    pub fn as_wire(&self) -> &'static str {
        match self {
            CredentialRetrieval::Integrated => "Integrated",
            CredentialRetrieval::Prompt => "Prompt",
            CredentialRetrieval::Store => "Store",
            CredentialRetrieval::None => "None",
        }
    }
}

/// Data source definition pushed to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceDefinition {
    pub connect_string: String,
    pub credential_retrieval: CredentialRetrieval,
    pub enabled: bool,
    /// Data processing extension ("SQL" for SQL Server).
    pub extension: String,
    pub windows_credentials: bool,
    /// Prompt string shown to the user; `None` means no prompt.
    pub prompt: Option<String>,
    /// Impersonation left unset unless explicitly requested.
    pub impersonate_user: Option<bool>,
}

impl DataSourceDefinition {
    /// The fixed shape the installer provisions: integrated authentication
    /// against the given connect string, enabled, SQL extension, no prompt.
    pub fn integrated(connect_string: impl Into<String>) -> Self {
        Self {
            connect_string: connect_string.into(),
            credential_retrieval: CredentialRetrieval::Integrated,
            enabled: true,
            extension: "SQL".to_string(),
            windows_credentials: false,
            prompt: None,
            impersonate_user: None,
        }
    }
}

/// Credentials presented to the report server itself.
///
/// Explicit by design: the session constructor takes this value instead of
/// relying on process-wide ambient identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCredentials {
    /// Use the transport's default identity (no Authorization header).
    Ambient,
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl Default for ServiceCredentials {
    fn default() -> Self {
        ServiceCredentials::Ambient
    }
}
