//! Skeleton loading: read a bundle from disk and enumerate its clips.

mod binary;
mod json;

use std::path::{Path, PathBuf};

use hellabot_domain::SkeletonBundle;

pub use binary::{decode as decode_binary, BinarySkeleton};

#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    #[error("Failed to read skeleton {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported skeleton file: {0}")]
    UnsupportedFile(PathBuf),

    #[error("Unsupported skeleton version: {0}")]
    UnsupportedVersion(String),

    #[error("Skeleton data truncated in {section} at byte {offset}")]
    Truncated {
        section: &'static str,
        offset: usize,
    },

    #[error("Invalid UTF-8 string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("{what} index {index} out of range (count {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Unknown {what} type {value}")]
    UnknownType { what: &'static str, value: u8 },

    #[error("Invalid JSON skeleton: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads skeleton bundles. Nothing is cached; every call reads the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkeletonLoader;

impl SkeletonLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode by extension: `.skel` binary, `.json` text.
    pub async fn load(&self, path: &Path) -> Result<SkeletonBundle, SkeletonError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| SkeletonError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let clips = Self::clips(path, &data)?;
        Ok(SkeletonBundle::from_clips(path, clips))
    }

    /// Raw clip names in file order, rest pose included.
    pub fn clips(path: &Path, data: &[u8]) -> Result<Vec<String>, SkeletonError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("skel") => Ok(binary::decode(data)?.animations),
            Some("json") => json::animation_names(data),
            _ => Err(SkeletonError::UnsupportedFile(path.to_path_buf())),
        }
    }
}
