// Report server catalog client (ReportService2010 SOAP endpoint)
//
// This module contains the wire-level client: data model, SOAP codec, the
// `CatalogService` seam, and the per-run `CatalogSession`. Provisioning logic
// lives in `crate::publish` and only depends on the seam.

pub mod error;
pub mod service;
pub mod session;
pub mod soap;
pub mod types;

pub use error::CatalogError;
pub use service::CatalogService;
pub use session::{service_endpoint_url, CatalogSession, SERVICE_PAGE};
pub use types::{
    CatalogItem, CreatedItem, CredentialRetrieval, DataSourceDefinition, Property,
    ServiceCredentials, Warning, DATA_SOURCE_NAME,
};
