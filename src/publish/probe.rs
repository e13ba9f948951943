// Connectivity prober
//
// Pre-flight check run by the installer before provisioning: GET the SOAP
// service endpoint, then the portal URL, and fold any failure into a fixed
// per-endpoint message. Nothing here ever propagates an error to the caller;
// the outcome is the whole contract.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::session::service_endpoint_url;
use crate::catalog::types::ServiceCredentials;

/// Result of a connectivity probe, returned to the installer host.
///
/// `error_message` is empty exactly when `success` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub success: bool,
    pub error_message: String,
}

impl ProbeOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: message.into(),
        }
    }
}

/// Fixed message for an unreachable service endpoint.
pub fn report_server_error_message(url: &str) -> String {
    format!("Report server URL invalid: {}", url)
}

/// Fixed message for an unreachable portal.
pub fn report_portal_error_message(url: &str) -> String {
    format!("Report portal URL invalid: {}", url)
}

/// Seam for issuing the reachability GET, so probe ordering and messaging can
/// be tested without a live server.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// GET `url` and return the HTTP status code.
    async fn get_status(&self, url: &str) -> Result<u16>;
}

/// Production probe backed by reqwest.
pub struct HttpEndpointProbe {
    client: reqwest::Client,
    credentials: ServiceCredentials,
}

impl HttpEndpointProbe {
    pub fn new(credentials: ServiceCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client for connectivity probe")?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

#[async_trait]
impl EndpointProbe for HttpEndpointProbe {
    async fn get_status(&self, url: &str) -> Result<u16> {
        let mut request = self.client.get(url);
        if let ServiceCredentials::Basic { username, password } = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        Ok(response.status().as_u16())
    }
}

/// Probe the report server service endpoint, then the portal URL.
///
/// The service endpoint is derived from `report_server_url` by appending
/// `ReportService2010.asmx` (separator inserted only when missing); the
/// portal URL is used as-is. The portal is never probed if the service
/// endpoint check fails.
pub async fn ping_report_server(
    probe: &dyn EndpointProbe,
    report_server_url: &str,
    report_portal_url: &str,
) -> ProbeOutcome {
    let service_url = service_endpoint_url(report_server_url);

    if let Some(outcome) =
        probe_endpoint(probe, &service_url, report_server_error_message(&service_url)).await
    {
        return outcome;
    }

    if let Some(outcome) = probe_endpoint(
        probe,
        report_portal_url,
        report_portal_error_message(report_portal_url),
    )
    .await
    {
        return outcome;
    }

    info!("[PHASE: probe] Report server and portal are reachable");
    ProbeOutcome::ok()
}

/// `None` means the endpoint answered 200; `Some` carries the failure outcome.
async fn probe_endpoint(
    probe: &dyn EndpointProbe,
    url: &str,
    error_message: String,
) -> Option<ProbeOutcome> {
    match probe.get_status(url).await {
        Ok(200) => {
            info!("[PHASE: probe] {} answered 200", url);
            None
        }
        Ok(status) => {
            warn!("[PHASE: probe] {} answered HTTP {}", url, status);
            Some(ProbeOutcome::fail(error_message))
        }
        Err(e) => {
            // Full error chain goes to the log; the caller only sees the
            // fixed per-endpoint message.
            warn!("[PHASE: probe] {} unreachable: {:#}", url, e);
            Some(ProbeOutcome::fail(error_message))
        }
    }
}
