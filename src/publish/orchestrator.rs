// Publish orchestrator
//
// One session, three steps, fixed order: folder, data source, artifacts. A
// failing step aborts the rest; the session is released on every exit path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::catalog::service::CatalogService;
use crate::catalog::session::CatalogSession;
use crate::catalog::types::ServiceCredentials;
use crate::utils::logging::mask_connection_string;
use crate::utils::validation::{validate_connection_string, validate_folder_name};

use super::datasource::ensure_data_source;
use super::folder::ensure_folder;
use super::upload::{upload_all, UploadPolicy};

/// Catalog folder provisioned when the caller does not override it.
pub const DEFAULT_FOLDER_NAME: &str = "DecisionSmartV4";

/// Everything one publish run needs; immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Directory holding the .rdl/.jpg artifacts to publish.
    pub source_path: PathBuf,
    /// Report server base URL (the SOAP endpoint is derived from it).
    pub report_server_url: String,
    /// Connect string stored in the provisioned data source.
    pub connection_string: String,
    pub folder_name: String,
    pub credentials: ServiceCredentials,
    pub upload_policy: UploadPolicy,
}

impl PublishRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        report_server_url: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            report_server_url: report_server_url.into(),
            connection_string: connection_string.into(),
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            credentials: ServiceCredentials::Ambient,
            upload_policy: UploadPolicy::default(),
        }
    }

    pub fn with_folder_name(mut self, folder_name: impl Into<String>) -> Self {
        self.folder_name = folder_name.into();
        self
    }

    pub fn with_credentials(mut self, credentials: ServiceCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.upload_policy = policy;
        self
    }
}

/// Provision the report server: ensure folder, upsert data source, upload
/// artifacts, in that order, over one catalog session.
pub async fn publish(request: &PublishRequest) -> Result<()> {
    validate_folder_name(&request.folder_name).context("publish request rejected")?;
    validate_connection_string(&request.connection_string).context("publish request rejected")?;

    info!(
        "[PHASE: publish] Starting publish to {} (folder='{}', source={:?}, connect={})",
        request.report_server_url,
        request.folder_name,
        request.source_path,
        mask_connection_string(&request.connection_string)
    );

    let session = CatalogSession::connect(&request.report_server_url, request.credentials.clone())
        .context("failed to open catalog session")?;

    // Session is dropped on every path out of this call.
    let result = run_provisioning(&session, request).await;

    match &result {
        Ok(()) => info!(
            "[PHASE: publish] Publish to folder '{}' complete",
            request.folder_name
        ),
        Err(e) => info!(
            "[PHASE: publish] Publish aborted: {:#}",
            e
        ),
    }

    result
}

/// The three provisioning steps over an already-open service.
pub(crate) async fn run_provisioning(
    service: &dyn CatalogService,
    request: &PublishRequest,
) -> Result<()> {
    ensure_folder(service, &request.folder_name).await?;
    ensure_data_source(service, &request.connection_string, &request.folder_name).await?;
    upload_all(
        service,
        &request.source_path,
        &request.folder_name,
        request.upload_policy,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::service::testing::{CatalogCall, RecordingCatalog};
    use std::fs;
    use tempfile::TempDir;

    fn request_for(dir: &TempDir) -> PublishRequest {
        PublishRequest::new(
            dir.path(),
            "http://reports01/ReportServer",
            "Server=db01;Database=DecisionSmart;",
        )
    }

    fn seed_artifacts(dir: &TempDir) {
        fs::write(dir.path().join("report.rdl"), b"<Report/>").unwrap();
        fs::write(dir.path().join("logo.jpg"), b"jpeg").unwrap();
    }

    fn call_kind(call: &CatalogCall) -> &'static str {
        match call {
            CatalogCall::ListChildren { .. } => "list",
            CatalogCall::CreateFolder { .. } => "folder",
            CatalogCall::CreateDataSource { .. } => "datasource",
            CatalogCall::CreateCatalogItem { .. } => "item",
        }
    }

    #[tokio::test]
    async fn steps_run_in_fixed_order() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(&dir);
        let catalog = RecordingCatalog::new();

        run_provisioning(&catalog, &request_for(&dir)).await.unwrap();

        let kinds: Vec<&str> = catalog.calls().iter().map(call_kind).collect();
        assert_eq!(kinds, vec!["list", "folder", "datasource", "item", "item"]);
    }

    #[tokio::test]
    async fn existing_folder_skips_create_but_not_later_steps() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(&dir);
        let catalog = RecordingCatalog::with_root_folder(DEFAULT_FOLDER_NAME);

        run_provisioning(&catalog, &request_for(&dir)).await.unwrap();

        let kinds: Vec<&str> = catalog.calls().iter().map(call_kind).collect();
        assert_eq!(kinds, vec!["list", "datasource", "item", "item"]);
    }

    #[tokio::test]
    async fn data_source_failure_aborts_uploads() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(&dir);
        let catalog = RecordingCatalog::new();
        *catalog.data_source_fault.lock().unwrap() =
            Some("<ErrorCode>rsInvalidDataSourceCredentialSetting</ErrorCode>".to_string());

        let err = run_provisioning(&catalog, &request_for(&dir))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("data source"));
        assert!(catalog.item_creates().is_empty(), "no upload after abort");
    }

    #[tokio::test]
    async fn republish_accumulates_no_duplicates() {
        let dir = TempDir::new().unwrap();
        seed_artifacts(&dir);
        let catalog = RecordingCatalog::new();
        let request = request_for(&dir);

        run_provisioning(&catalog, &request).await.unwrap();
        run_provisioning(&catalog, &request).await.unwrap();

        // Folder created exactly once across both runs; data source and
        // artifacts re-created with overwrite=true each run.
        assert_eq!(catalog.folder_creates(), 1);
        let overwrites = catalog
            .calls()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    CatalogCall::CreateDataSource { overwrite: true, .. }
                        | CatalogCall::CreateCatalogItem { overwrite: true, .. }
                )
            })
            .count();
        assert_eq!(overwrites, 6); // 2 runs x (1 data source + 2 artifacts)
    }

    #[tokio::test]
    async fn publish_rejects_invalid_folder_name() {
        let dir = TempDir::new().unwrap();
        let request = request_for(&dir).with_folder_name("bad/name");
        let err = publish(&request).await.unwrap_err();
        assert!(format!("{:#}", err).contains("publish request rejected"));
    }

    #[tokio::test]
    async fn publish_rejects_empty_connection_string() {
        let dir = TempDir::new().unwrap();
        let mut request = request_for(&dir);
        request.connection_string = String::new();
        assert!(publish(&request).await.is_err());
    }

    #[tokio::test]
    async fn publish_rejects_invalid_server_url() {
        let dir = TempDir::new().unwrap();
        let mut request = request_for(&dir);
        request.report_server_url = "not a url".to_string();
        let err = publish(&request).await.unwrap_err();
        assert!(format!("{:#}", err).contains("catalog session"));
    }

    #[test]
    fn request_defaults() {
        let request = PublishRequest::new("/tmp/reports", "http://r/ReportServer", "Server=x;");
        assert_eq!(request.folder_name, "DecisionSmartV4");
        assert_eq!(request.credentials, ServiceCredentials::Ambient);
        assert!(!request.upload_policy.continue_on_error);
    }
}
