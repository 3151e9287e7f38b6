//! Rendered artifact lifecycle: locate, read, hand over, purge.
//!
//! Artifacts never outlive the request that produced them. `collect` reads
//! the file into memory and removes it before returning, whether the read
//! succeeded or not.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    Missing(PathBuf),

    #[error("Artifact name is not a plain file name: {0}")]
    InvalidName(String),

    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An artifact read into memory and already removed from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Filesystem directory the render page saves artifacts into.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the directory if needed.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|f| f == std::ffi::OsStr::new(name));
        if name.is_empty() || !plain {
            return Err(ArtifactError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Read the artifact and purge it.
    pub async fn collect(&self, name: &str) -> Result<RenderedArtifact, ArtifactError> {
        let path = self.path_for(name)?;
        let read = tokio::fs::read(&path).await;
        self.purge(name).await;

        match read {
            Ok(bytes) => {
                tracing::debug!(artifact = %name, size = bytes.len(), "Collected artifact");
                Ok(RenderedArtifact {
                    file_name: name.to_string(),
                    bytes,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ArtifactError::Missing(path)),
            Err(source) => Err(ArtifactError::Read { path, source }),
        }
    }

    /// Remove the artifact if it exists. Returns whether a file was removed.
    pub async fn purge(&self, name: &str) -> bool {
        let Ok(path) = self.path_for(name) else {
            return false;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(artifact = %name, "Purged artifact");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(artifact = %name, error = %e, "Failed to purge artifact");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collect_reads_then_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        tokio::fs::write(dir.path().join("thorns0a1b.gif"), b"GIF89a")
            .await
            .unwrap();

        let artifact = store.collect("thorns0a1b.gif").await.unwrap();

        assert_eq!(artifact.file_name, "thorns0a1b.gif");
        assert_eq!(artifact.bytes, b"GIF89a");
        assert!(!dir.path().join("thorns0a1b.gif").exists());
    }

    #[tokio::test]
    async fn collect_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let result = store.collect("absent.gif").await;
        assert!(matches!(result, Err(ArtifactError::Missing(_))));
    }

    #[tokio::test]
    async fn purge_tolerates_absent_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        tokio::fs::write(dir.path().join("partial.gif"), b"GIF")
            .await
            .unwrap();

        assert!(store.purge("partial.gif").await);
        assert!(!store.purge("partial.gif").await);
    }

    #[tokio::test]
    async fn rejects_names_outside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert!(matches!(
            store.collect("../escape.gif").await,
            Err(ArtifactError::InvalidName(_))
        ));
        assert!(!store.purge("nested/x.gif").await);
    }

    #[tokio::test]
    async fn ensure_dir_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"));
        store.ensure_dir().await.unwrap();
        assert!(store.dir().is_dir());
    }
}
