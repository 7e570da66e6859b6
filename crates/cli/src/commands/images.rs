//! Product image commands.

use std::path::PathBuf;

use marys_fashion_storefront::services::{ImageUploads, UploadResult};

use super::{CliError, Context, ensure, print_json};

/// Upload files and print one result per file.
///
/// A file that cannot be read is reported as a failed result rather than
/// aborting the batch.
pub async fn upload(ctx: &Context, files: &[PathBuf], bucket: Option<&str>) -> Result<(), CliError> {
    let uploads = ImageUploads::new(ctx.gateways.storage.clone());

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let result = match std::fs::read(path) {
            Ok(bytes) => uploads.upload(&name, bytes, bucket).await,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", path.display(), e);
                UploadResult {
                    success: false,
                    url: None,
                    path: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    print_json(&results)?;
    ensure(failed == 0, "image upload")
}

pub async fn remove(ctx: &Context, path: &str, bucket: Option<&str>) -> Result<(), CliError> {
    let removed = ImageUploads::new(ctx.gateways.storage.clone())
        .remove(path, bucket)
        .await;
    ensure(removed, "image remove")?;
    tracing::info!("Removed {}", path);
    Ok(())
}
