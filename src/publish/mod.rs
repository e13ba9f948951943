// Provisioning sequence
//
// The prober is a separate entry point the installer runs first; the
// orchestrator assumes connectivity has already been verified (caller
// contract, not enforced here).

pub mod datasource;
pub mod folder;
pub mod orchestrator;
pub mod probe;
pub mod upload;

pub use orchestrator::{publish, PublishRequest, DEFAULT_FOLDER_NAME};
pub use probe::{ping_report_server, EndpointProbe, HttpEndpointProbe, ProbeOutcome};
pub use upload::UploadPolicy;
