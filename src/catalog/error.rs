// Catalog service errors
//
// Structured SOAP faults carry the server's detail payload (e.g. an invalid
// data source configuration) and must stay distinguishable from plain
// transport failures so callers can surface the detail before aborting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The server returned a SOAP fault envelope.
    #[error("report server fault: {fault_string}")]
    SoapFault {
        fault_string: String,
        /// Inner XML of the fault's <detail> element, verbatim.
        detail: String,
    },

    /// Non-success HTTP status without a parseable fault body.
    #[error("report server returned HTTP {status}")]
    Http { status: u16 },

    /// Transport-level failure (DNS, TLS, refused connection, timeout).
    #[error("report server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the XML shape we expected.
    #[error("unexpected report server response: {0}")]
    UnexpectedResponse(String),
}

impl CatalogError {
    /// Fault detail payload, if this error carries one.
    pub fn fault_detail(&self) -> Option<&str> {
        match self {
            CatalogError::SoapFault { detail, .. } => Some(detail),
            _ => None,
        }
    }
}
