//! Filesystem persistence port and its `tokio::fs`-backed implementation.

use crate::collaborators::normalizer::NormalizedMarkdown;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct WriteResult {
    pub url: String,
    pub path: PathBuf,
    pub bytes_written: u64,
}

pub trait Storage {
    fn write(
        &self,
        url: &ImUrl,
        normalized: &NormalizedMarkdown,
    ) -> impl std::future::Future<Output = Result<WriteResult, ClassifiedError>> + Send;
}

/// Writes normalized Markdown under `storage_dir/<host>/<url-path>/index.md`,
/// sanitizing each path segment so a hostile page title or query string
/// cannot escape the storage root or collide with reserved filenames.
pub struct FsStorage {
    storage_dir: PathBuf,
}

impl FsStorage {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Builds `storage_dir/<host>/<sanitized-path-segments>/index.md`.
    fn mirror_path(&self, url: &ImUrl) -> PathBuf {
        let host = url.host().unwrap_or("unknown-host");
        let sanitized_host = sanitize_filename::sanitize(host);

        let mut dir = self.storage_dir.join(sanitized_host);
        for segment in url.path().split('/').filter(|s| !s.is_empty()) {
            dir = dir.join(sanitize_filename::sanitize(segment));
        }

        dir.join("index.md")
    }
}

impl Storage for FsStorage {
    async fn write(
        &self,
        url: &ImUrl,
        normalized: &NormalizedMarkdown,
    ) -> Result<WriteResult, ClassifiedError> {
        let path = self.mirror_path(url);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClassifiedError::recoverable(Cause::StorageFailure(e.to_string())))?;
        }

        tokio::fs::write(&path, normalized.markdown.as_bytes())
            .await
            .map_err(|e| ClassifiedError::recoverable(Cause::StorageFailure(e.to_string())))?;

        Ok(WriteResult {
            url: url.as_str().to_string(),
            path,
            bytes_written: normalized.markdown.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_writes_under_host_and_path() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let url = ImUrl::parse("https://example.com/docs/page").unwrap();
        let normalized = NormalizedMarkdown { markdown: "# hi\n".to_string() };

        let result = storage.write(&url, &normalized).await.unwrap();

        assert!(result.path.ends_with("example.com/docs/page/index.md"));
        let contents = tokio::fs::read_to_string(&result.path).await.unwrap();
        assert_eq!(contents, "# hi\n");
        assert_eq!(result.bytes_written, 5);
    }

    #[tokio::test]
    async fn test_sanitizes_path_segments() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let url = ImUrl::parse("https://example.com/a%20b/c?x=1").unwrap();
        let normalized = NormalizedMarkdown { markdown: "x\n".to_string() };

        let result = storage.write(&url, &normalized).await.unwrap();
        assert!(result.path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_root_path_writes_index() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let url = ImUrl::parse("https://example.com/").unwrap();
        let normalized = NormalizedMarkdown { markdown: "root\n".to_string() };

        let result = storage.write(&url, &normalized).await.unwrap();
        assert!(result.path.ends_with("example.com/index.md"));
    }
}
