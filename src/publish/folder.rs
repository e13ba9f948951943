// Catalog folder ensurer
//
// Idempotent: the catalog root is listed first and the folder is only created
// when no root item carries that exact name. Remote failures propagate to the
// orchestrator unmodified.

use anyhow::{Context, Result};
use log::info;

use crate::catalog::service::CatalogService;
use crate::catalog::types::Property;

/// Ensure `/{folder_name}` exists at the catalog root.
pub async fn ensure_folder(service: &dyn CatalogService, folder_name: &str) -> Result<()> {
    let items = service
        .list_children("/", true)
        .await
        .context("failed to list catalog root")?;

    if items.iter().any(|item| item.name == folder_name) {
        info!(
            "[PHASE: publish] [STEP: folder] Folder '{}' already exists, nothing to create",
            folder_name
        );
        return Ok(());
    }

    // The folder's own name is mirrored as its single property, matching the
    // shape the reporting host expects.
    let properties = vec![Property::new(folder_name, folder_name)];
    service
        .create_folder(folder_name, "/", &properties)
        .await
        .with_context(|| format!("failed to create catalog folder '{}'", folder_name))?;

    info!(
        "[PHASE: publish] [STEP: folder] Created folder '{}' at catalog root",
        folder_name
    );
    Ok(())
}
