// Catalog session
//
// One session per publish run: a reqwest client pinned to the service
// endpoint with an explicit credential value. Dropping the session releases
// the connection on every exit path.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};

use super::error::CatalogError;
use super::service::CatalogService;
use super::soap;
use super::types::{
    CatalogItem, CreatedItem, DataSourceDefinition, Property, ServiceCredentials, Warning,
};
use crate::utils::validation::validate_server_url;

/// Service page appended to the report server base URL.
pub const SERVICE_PAGE: &str = "ReportService2010.asmx";

/// Build the SOAP service endpoint URL from a base URL that may or may not
/// carry a trailing separator.
pub fn service_endpoint_url(report_server_url: &str) -> String {
    if report_server_url.ends_with('/') {
        format!("{}{}", report_server_url, SERVICE_PAGE)
    } else {
        format!("{}/{}", report_server_url, SERVICE_PAGE)
    }
}

/// An open connection to the report server's catalog service.
pub struct CatalogSession {
    client: reqwest::Client,
    endpoint: String,
    credentials: ServiceCredentials,
}

impl CatalogSession {
    /// Open a session against `report_server_url` with explicit credentials.
    ///
    /// Validates the URL up front; no network traffic happens until the first
    /// operation is issued.
    pub fn connect(report_server_url: &str, credentials: ServiceCredentials) -> Result<Self> {
        validate_server_url(report_server_url)
            .context("report server URL rejected for catalog session")?;

        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client for catalog session")?;

        Ok(Self {
            client,
            endpoint: service_endpoint_url(report_server_url),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one SOAP call and return the raw response body.
    ///
    /// Faults are detected on both success and error statuses; the server
    /// reports operation faults as HTTP 500 with a fault envelope.
    async fn call(&self, operation: &str, body: String) -> Result<String, CatalogError> {
        debug!(
            "[PHASE: publish] [STEP: soap] {} -> {} ({} bytes)",
            operation,
            self.endpoint,
            body.len()
        );

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", soap::soap_action(operation))
            .body(body);

        if let ServiceCredentials::Basic { username, password } = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if let Some((fault_string, detail)) = soap::parse_fault(&text) {
            warn!(
                "[PHASE: publish] [STEP: soap] {} fault: {}",
                operation, fault_string
            );
            return Err(CatalogError::SoapFault {
                fault_string,
                detail,
            });
        }

        if !status.is_success() {
            return Err(CatalogError::Http {
                status: status.as_u16(),
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl CatalogService for CatalogSession {
    async fn list_children(
        &self,
        item_path: &str,
        recursive: bool,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let body = soap::list_children_request(item_path, recursive);
        let response = self.call("ListChildren", body).await?;
        soap::parse_list_children(&response)
    }

    async fn create_folder(
        &self,
        folder: &str,
        parent: &str,
        properties: &[Property],
    ) -> Result<(), CatalogError> {
        let body = soap::create_folder_request(folder, parent, properties);
        self.call("CreateFolder", body).await?;
        Ok(())
    }

    async fn create_data_source(
        &self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), CatalogError> {
        let body = soap::create_data_source_request(name, parent, overwrite, definition);
        self.call("CreateDataSource", body).await?;
        Ok(())
    }

    async fn create_catalog_item(
        &self,
        item_type: &str,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &[u8],
        properties: &[Property],
    ) -> Result<(Option<CreatedItem>, Vec<Warning>), CatalogError> {
        let body = soap::create_catalog_item_request(
            item_type, name, parent, overwrite, definition, properties,
        );
        let response = self.call("CreateCatalogItem", body).await?;
        soap::parse_create_item_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_without_trailing_separator() {
        assert_eq!(
            service_endpoint_url("http://reports01/ReportServer"),
            "http://reports01/ReportServer/ReportService2010.asmx"
        );
    }

    #[test]
    fn endpoint_with_trailing_separator() {
        assert_eq!(
            service_endpoint_url("http://reports01/ReportServer/"),
            "http://reports01/ReportServer/ReportService2010.asmx"
        );
    }

    #[test]
    fn connect_rejects_invalid_url() {
        assert!(CatalogSession::connect("not a url", ServiceCredentials::Ambient).is_err());
        assert!(CatalogSession::connect("ftp://reports01", ServiceCredentials::Ambient).is_err());
    }

    #[test]
    fn connect_pins_endpoint() {
        let session = CatalogSession::connect(
            "http://reports01/ReportServer",
            ServiceCredentials::Ambient,
        )
        .unwrap();
        assert_eq!(
            session.endpoint(),
            "http://reports01/ReportServer/ReportService2010.asmx"
        );
    }
}
