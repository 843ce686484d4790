use std::path::{Path, PathBuf};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::{
    domain::UploadedImage,
    error::{AppError, Result},
};

/// Allowed image extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Public URL prefix the uploads directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    pub name: String,
    pub error: String,
}

/// Outcome of a multi-file upload. Files succeed or fail independently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<UploadedImage>,
    pub failed: Vec<FailedUpload>,
    pub count: usize,
}

/// Reference images, stored per user under `<root>/<user_id>/<uuid>.<ext>`.
pub struct UploadStore {
    root: PathBuf,
    max_file_size: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_size_mb: usize) -> Self {
        Self {
            root: root.into(),
            max_file_size: max_file_size_mb * 1024 * 1024,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, user_id: Uuid, filename: &str, data: &[u8]) -> Result<UploadedImage> {
        if data.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if data.len() > self.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large (max {} MB)",
                self.max_file_size / (1024 * 1024)
            )));
        }

        let extension = extension_of(filename)?;

        let user_dir = self.root.join(user_id.to_string());
        fs::create_dir_all(&user_dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create uploads directory: {}", e))
        })?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        let mut file = fs::File::create(user_dir.join(&stored_name)).await.map_err(|e| {
            AppError::Internal(format!("Failed to create file: {}", e))
        })?;

        file.write_all(data).await.map_err(|e| {
            AppError::Internal(format!("Failed to write file: {}", e))
        })?;

        Ok(UploadedImage {
            name: filename.to_string(),
            url: format!("{}/{}/{}", UPLOADS_URL_PREFIX, user_id, stored_name),
        })
    }

    /// Store each file on its own; one bad file doesn't sink the rest.
    pub async fn save_all(&self, user_id: Uuid, files: Vec<(String, Vec<u8>)>) -> UploadReport {
        let mut report = UploadReport::default();

        for (name, data) in files {
            match self.save(user_id, &name, &data).await {
                Ok(image) => report.uploaded.push(image),
                Err(e) => {
                    tracing::warn!("Upload of {} failed: {}", name, e);
                    report.failed.push(FailedUpload {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.count = report.uploaded.len();
        report
    }

    /// Remove one of `user_id`'s files. Missing files are not an error.
    pub async fn delete(&self, user_id: Uuid, stored_name: &str) -> Result<()> {
        // Only bare file names we generated; no separators, no parent hops.
        let valid = !stored_name.is_empty()
            && !stored_name.contains(['/', '\\'])
            && !stored_name.starts_with('.');
        if !valid {
            return Err(AppError::BadRequest("Invalid file name".to_string()));
        }

        let path = self.root.join(user_id.to_string()).join(stored_name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {}", e))),
        }
    }
}

fn extension_of(filename: &str) -> Result<String> {
    let (_, extension) = filename
        .rsplit_once('.')
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;
    let extension = extension.to_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(extension)
}
