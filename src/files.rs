//! Image uploads stored on local disk and served under `/static`.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use crate::errors::FolioError;
use crate::settings::Uploads;

/// URL prefix the upload root is mounted at.
pub const STATIC_PREFIX: &str = "/static";

/// A file received in a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    max_size_mb: u64,
    allowed_types: Vec<String>,
}

impl FileStore {
    pub fn new(cfg: &Uploads) -> Self {
        Self {
            root: cfg.root.clone(),
            max_size_mb: cfg.max_size_mb,
            allowed_types: cfg.allowed_types.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn validate(&self, upload: &Upload) -> Result<(), FolioError> {
        if upload.bytes.len() as u64 > self.max_size_mb * 1024 * 1024 {
            return Err(FolioError::Validation(format!(
                "Image too large. only allow file lower than {} mb",
                self.max_size_mb
            )));
        }
        if !self.allowed_types.iter().any(|t| t == &upload.content_type) {
            let names: Vec<&str> = self
                .allowed_types
                .iter()
                .map(|t| t.rsplit('/').next().unwrap_or(t))
                .collect();
            return Err(FolioError::Validation(format!(
                "Invalid file type. only allow file with type {}",
                names.join(", ")
            )));
        }
        Ok(())
    }

    /// Validate and write `upload` into `folder`, returning its public URL.
    ///
    /// The file is named `{name}.{ext}` when a name is given, otherwise
    /// `{date}-{uuid}.{ext}`.
    pub async fn store(
        &self,
        folder: &str,
        upload: &Upload,
        name: Option<&str>,
    ) -> Result<String, FolioError> {
        self.validate(upload)?;
        let ext = extension(upload);
        let file_name = match name {
            Some(name) => format!("{name}.{ext}"),
            None => format!(
                "{}-{}.{ext}",
                Utc::now().format("%Y%m%d"),
                uuid::Uuid::new_v4()
            ),
        };
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;
        tracing::debug!(folder, file = %file_name, size = upload.bytes.len(), "Stored upload");
        Ok(format!("{STATIC_PREFIX}/{folder}/{file_name}"))
    }

    /// Delete a previously stored file by its public URL.
    ///
    /// Never fails: problems are logged and swallowed.
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.resolve(url) else {
            tracing::warn!(url, "Refusing to remove file outside the upload root");
            return;
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }

    /// Map `/static/a/b.png` to `{root}/a/b.png`, rejecting anything that escapes the root.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let rel = url.strip_prefix(STATIC_PREFIX)?.trim_start_matches('/');
        let rel = Path::new(rel);
        if rel.as_os_str().is_empty()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(rel))
    }
}

fn extension(upload: &Upload) -> String {
    match upload.content_type.as_str() {
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        other => upload
            .file_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| other.rsplit('/').next().unwrap_or("bin").to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileStore {
        FileStore::new(&Uploads {
            root: dir.path().to_path_buf(),
            ..Uploads::default()
        })
    }

    fn png(len: usize) -> Upload {
        Upload {
            file_name: Some("logo.png".to_string()),
            content_type: "image/png".to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_oversized_upload_rejected() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).validate(&png(6 * 1024 * 1024)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Image too large. only allow file lower than 5 mb"
        );
    }

    #[test]
    fn test_disallowed_type_rejected() {
        let dir = TempDir::new().unwrap();
        let gif = Upload {
            file_name: Some("a.gif".to_string()),
            content_type: "image/gif".to_string(),
            bytes: vec![1, 2, 3],
        };
        let err = store(&dir).validate(&gif).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. only allow file with type jpeg, png"
        );
    }

    #[tokio::test]
    async fn test_store_and_remove() {
        let dir = TempDir::new().unwrap();
        let files = store(&dir);
        let url = files
            .store("company", &png(16), Some("acme"))
            .await
            .unwrap();
        assert_eq!(url, "/static/company/acme.png");
        assert!(dir.path().join("company/acme.png").exists());

        files.remove(&url).await;
        assert!(!dir.path().join("company/acme.png").exists());

        // second removal only logs
        files.remove(&url).await;
    }

    #[tokio::test]
    async fn test_generated_name_when_none_given() {
        let dir = TempDir::new().unwrap();
        let url = store(&dir).store("user", &png(4), None).await.unwrap();
        assert!(url.starts_with("/static/user/"));
        assert!(url.ends_with(".png"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let files = store(&dir);
        assert!(files.resolve("/static/../etc/passwd").is_none());
        assert!(files.resolve("/elsewhere/a.png").is_none());
        assert!(files.resolve("/static/user/a.png").is_some());
    }
}
