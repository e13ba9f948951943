// Artifact uploader
//
// Flat enumeration of the source directory; every file is read and
// classified, but only .rdl and .jpg are actually pushed to the catalog.
// Classification deliberately assumes any non-rdl file is an image resource,
// matching the installer's report payload layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::catalog::service::CatalogService;
use crate::catalog::types::Property;

/// Catalog item kind plus the properties to attach on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactClass {
    pub item_type: &'static str,
    pub properties: Vec<Property>,
}

/// Failure policy for the upload batch.
///
/// The default aborts on the first failing file; `continue_on_error` finishes
/// the batch and reports a summary error instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadPolicy {
    pub continue_on_error: bool,
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Classify a file by extension: `.rdl` is a report definition, anything else
/// is treated as a hidden jpeg resource.
pub fn classify_artifact(path: &Path) -> ArtifactClass {
    if extension(path) == Some("rdl") {
        ArtifactClass {
            item_type: "Report",
            properties: Vec::new(),
        }
    } else {
        ArtifactClass {
            item_type: "Resource",
            properties: vec![
                Property::new("MIMEType", "image/jpeg"),
                Property::new("Hidden", "true"),
            ],
        }
    }
}

/// Only rdl and jpg files are ever uploaded; everything else is skipped.
pub fn is_publishable(path: &Path) -> bool {
    matches!(extension(path), Some("rdl") | Some("jpg"))
}

/// Upload every publishable file in `source_dir` to `/{folder_name}`.
pub async fn upload_all(
    service: &dyn CatalogService,
    source_dir: &Path,
    folder_name: &str,
    policy: UploadPolicy,
) -> Result<()> {
    let parent = format!("/{}", folder_name);
    let files = list_files(source_dir).await?;
    info!(
        "[PHASE: publish] [STEP: upload] {} file(s) found in {:?}",
        files.len(),
        source_dir
    );

    let mut failed: Vec<String> = Vec::new();

    for path in &files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        match upload_one(service, path, &name, &parent).await {
            Ok(()) => {}
            Err(e) => {
                error!(
                    "[PHASE: publish] [STEP: upload] {} failed: {:#}",
                    name, e
                );
                if !policy.continue_on_error {
                    return Err(e).with_context(|| format!("upload aborted at '{}'", name));
                }
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} artifact(s) failed to publish: {}",
            failed.len(),
            files.len(),
            failed.join(", ")
        );
    }

    Ok(())
}

async fn upload_one(
    service: &dyn CatalogService,
    path: &Path,
    name: &str,
    parent: &str,
) -> Result<()> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {:?}", path))?;

    let class = classify_artifact(path);

    if !is_publishable(path) {
        debug!(
            "[PHASE: publish] [STEP: upload] Skipping '{}' (unrecognized extension)",
            name
        );
        return Ok(());
    }

    let (created, warnings) = service
        .create_catalog_item(
            class.item_type,
            name,
            parent,
            true,
            &content,
            &class.properties,
        )
        .await
        .with_context(|| format!("failed to publish '{}' as {}", name, class.item_type))?;

    if created.is_some() {
        info!(
            "[PHASE: publish] [STEP: upload] {} published successfully",
            name
        );
    }

    if warnings.is_empty() {
        info!(
            "[PHASE: publish] [STEP: upload] {} created successfully with no warnings",
            name
        );
    } else {
        for warning in &warnings {
            warn!(
                "[PHASE: publish] [STEP: upload] {}: {}",
                name, warning.message
            );
        }
    }

    Ok(())
}

/// Flat listing of regular files in `dir`, sorted by name for a stable
/// publish order.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut rd = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("read_dir failed: {:?}", dir))?;

    let mut out: Vec<PathBuf> = Vec::new();
    while let Some(ent) = rd.next_entry().await? {
        let meta = ent.metadata().await?;
        if meta.is_file() {
            out.push(ent.path());
        }
    }
    out.sort();
    Ok(out)
}
