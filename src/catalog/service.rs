// Catalog service seam
//
// Production code talks to the report server through `CatalogSession`; tests
// use the recording stub below so provisioning behavior can be verified
// deterministically without a live server.

use async_trait::async_trait;

use super::error::CatalogError;
use super::types::{CatalogItem, CreatedItem, DataSourceDefinition, Property, Warning};

/// Operations the provisioning sequence needs from the report server catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List catalog items under `item_path`, optionally recursing.
    async fn list_children(
        &self,
        item_path: &str,
        recursive: bool,
    ) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Create a folder under `parent` with the given properties.
    async fn create_folder(
        &self,
        folder: &str,
        parent: &str,
        properties: &[Property],
    ) -> Result<(), CatalogError>;

    /// Create or overwrite a data source definition under `parent`.
    async fn create_data_source(
        &self,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &DataSourceDefinition,
    ) -> Result<(), CatalogError>;

    /// Create or overwrite a catalog item (report or resource) from binary
    /// content, returning the created-item handle and any server warnings.
    async fn create_catalog_item(
        &self,
        item_type: &str,
        name: &str,
        parent: &str,
        overwrite: bool,
        definition: &[u8],
        properties: &[Property],
    ) -> Result<(Option<CreatedItem>, Vec<Warning>), CatalogError>;
}

// =============================================================================
// Recording stub for deterministic tests
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// One recorded remote call, with the arguments that matter to the
    /// provisioning contract.
    #[derive(Debug, Clone, PartialEq)]
    pub enum CatalogCall {
        ListChildren {
            item_path: String,
            recursive: bool,
        },
        CreateFolder {
            folder: String,
            parent: String,
            properties: Vec<Property>,
        },
        CreateDataSource {
            name: String,
            parent: String,
            overwrite: bool,
            definition: DataSourceDefinition,
        },
        CreateCatalogItem {
            item_type: String,
            name: String,
            parent: String,
            overwrite: bool,
            definition_len: usize,
            properties: Vec<Property>,
        },
    }

    /// Stub catalog that records every call and answers from canned state.
    #[derive(Default)]
    pub struct RecordingCatalog {
        pub calls: Mutex<Vec<CatalogCall>>,
        /// Items returned by `list_children`.
        pub root_items: Mutex<Vec<CatalogItem>>,
        /// Warnings attached to every `create_catalog_item` response.
        pub item_warnings: Mutex<Vec<Warning>>,
        /// File names whose upload should fail with a fault.
        pub failing_items: Mutex<Vec<String>>,
        /// When set, `create_data_source` fails with this fault detail.
        pub data_source_fault: Mutex<Option<String>>,
    }

    impl RecordingCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_root_folder(name: &str) -> Self {
            let stub = Self::default();
            stub.root_items.lock().unwrap().push(CatalogItem {
                name: name.to_string(),
                path: format!("/{}", name),
                type_name: "Folder".to_string(),
            });
            stub
        }

        pub fn calls(&self) -> Vec<CatalogCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn record(&self, call: CatalogCall) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn folder_creates(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, CatalogCall::CreateFolder { .. }))
                .count()
        }

        pub fn item_creates(&self) -> Vec<CatalogCall> {
            self.calls()
                .into_iter()
                .filter(|c| matches!(c, CatalogCall::CreateCatalogItem { .. }))
                .collect()
        }
    }

    #[async_trait]
    impl CatalogService for RecordingCatalog {
        async fn list_children(
            &self,
            item_path: &str,
            recursive: bool,
        ) -> Result<Vec<CatalogItem>, CatalogError> {
            self.record(CatalogCall::ListChildren {
                item_path: item_path.to_string(),
                recursive,
            });
            Ok(self.root_items.lock().unwrap().clone())
        }

        async fn create_folder(
            &self,
            folder: &str,
            parent: &str,
            properties: &[Property],
        ) -> Result<(), CatalogError> {
            self.record(CatalogCall::CreateFolder {
                folder: folder.to_string(),
                parent: parent.to_string(),
                properties: properties.to_vec(),
            });
            // Subsequent listings see the new folder.
            self.root_items.lock().unwrap().push(CatalogItem {
                name: folder.to_string(),
                path: format!("{}{}", if parent == "/" { "/" } else { parent }, folder),
                type_name: "Folder".to_string(),
            });
            Ok(())
        }

        async fn create_data_source(
            &self,
            name: &str,
            parent: &str,
            overwrite: bool,
            definition: &DataSourceDefinition,
        ) -> Result<(), CatalogError> {
            self.record(CatalogCall::CreateDataSource {
                name: name.to_string(),
                parent: parent.to_string(),
                overwrite,
                definition: definition.clone(),
            });
            if let Some(detail) = self.data_source_fault.lock().unwrap().clone() {
                return Err(CatalogError::SoapFault {
                    fault_string: "The data source definition is not valid.".to_string(),
                    detail,
                });
            }
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
            self.record(CatalogCall::CreateCatalogItem {
                item_type: item_type.to_string(),
                name: name.to_string(),
                parent: parent.to_string(),
                overwrite,
                definition_len: definition.len(),
                properties: properties.to_vec(),
            });
            if self
                .failing_items
                .lock()
                .unwrap()
                .iter()
                .any(|n| n == name)
            {
                return Err(CatalogError::SoapFault {
                    fault_string: format!("The item '{}' could not be created.", name),
                    detail: "<ErrorCode>rsInvalidReportDefinition</ErrorCode>".to_string(),
                });
            }
            Ok((
                Some(CreatedItem {
                    name: name.to_string(),
                    path: format!("{}/{}", parent, name),
                    type_name: item_type.to_string(),
                }),
                self.item_warnings.lock().unwrap().clone(),
            ))
        }
    }
}
