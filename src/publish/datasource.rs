// Data source ensurer
//
// Unconditional upsert: one create call with overwrite=true, every run. No
// existence check is needed because the server replaces any prior definition.
// Structured faults get their detail payload logged before re-raising.

use anyhow::{Context, Result};
use log::{error, info};

use crate::catalog::error::CatalogError;
use crate::catalog::service::CatalogService;
use crate::catalog::types::{DataSourceDefinition, DATA_SOURCE_NAME};
use crate::utils::logging::mask_connection_string;

/// Create or overwrite `ReportDataSource` under `/{folder_name}`.
pub async fn ensure_data_source(
    service: &dyn CatalogService,
    connection_string: &str,
    folder_name: &str,
) -> Result<()> {
    let parent = format!("/{}", folder_name);
    let definition = DataSourceDefinition::integrated(connection_string);

    info!(
        "[PHASE: publish] [STEP: datasource] Upserting '{}' under {} (connect={})",
        DATA_SOURCE_NAME,
        parent,
        mask_connection_string(connection_string)
    );

    match service
        .create_data_source(DATA_SOURCE_NAME, &parent, true, &definition)
        .await
    {
        Ok(()) => Ok(()),
        Err(e @ CatalogError::SoapFault { .. }) => {
            // Surface the server's diagnostic before aborting the run.
            error!(
                "[PHASE: publish] [STEP: datasource] Server rejected data source: {} (detail: {})",
                e,
                e.fault_detail().unwrap_or("<none>")
            );
            Err(e).context("data source creation rejected by report server")
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to create data source '{}' under {}",
                DATA_SOURCE_NAME, parent
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::service::testing::{CatalogCall, RecordingCatalog};
    use crate::catalog::types::CredentialRetrieval;

    #[tokio::test]
    async fn always_issues_exactly_one_overwrite_create() {
        let catalog = RecordingCatalog::new();

        ensure_data_source(&catalog, "Server=db01;Database=DecisionSmart;", "DecisionSmartV4")
            .await
            .unwrap();

        let calls = catalog.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            CatalogCall::CreateDataSource {
                name,
                parent,
                overwrite,
                definition,
            } => {
                assert_eq!(name, "ReportDataSource");
                assert_eq!(parent, "/DecisionSmartV4");
                assert!(*overwrite, "create must always overwrite");
                assert_eq!(
                    definition.credential_retrieval,
                    CredentialRetrieval::Integrated
                );
                assert_eq!(definition.connect_string, "Server=db01;Database=DecisionSmart;");
                assert!(definition.enabled);
                assert_eq!(definition.extension, "SQL");
                assert!(!definition.windows_credentials);
                assert!(definition.prompt.is_none());
                assert!(definition.impersonate_user.is_none());
            }
            other => panic!("expected CreateDataSource, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rerun_issues_another_overwrite_create() {
        let catalog = RecordingCatalog::new();

        ensure_data_source(&catalog, "Server=db01;", "F").await.unwrap();
        ensure_data_source(&catalog, "Server=db01;", "F").await.unwrap();

        // Upsert is unconditional, unlike the folder ensurer
        assert_eq!(catalog.calls().len(), 2);
    }

    #[tokio::test]
    async fn soap_fault_propagates_with_detail() {
        let catalog = RecordingCatalog::new();
        *catalog.data_source_fault.lock().unwrap() =
            Some("<ErrorCode>rsInvalidDataSourceCredentialSetting</ErrorCode>".to_string());

        let err = ensure_data_source(&catalog, "Server=db01;", "F")
            .await
            .unwrap_err();

        let chain = format!("{:#}", err);
        assert!(
            chain.contains("rejected"),
            "context should mention rejection: {}",
            chain
        );
    }
}
