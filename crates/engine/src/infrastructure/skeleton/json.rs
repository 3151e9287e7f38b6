//! Spine JSON skeletons.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::SkeletonError;

#[derive(Debug, Deserialize)]
struct JsonSkeleton {
    #[serde(default)]
    skeleton: Option<JsonHeader>,
    #[serde(default)]
    animations: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct JsonHeader {
    #[serde(default)]
    spine: Option<String>,
}

/// Animation names in document order.
///
/// Relies on `serde_json`'s `preserve_order` feature for the ordering.
pub fn animation_names(data: &[u8]) -> Result<Vec<String>, SkeletonError> {
    let parsed: JsonSkeleton = serde_json::from_slice(data)?;
    if let Some(version) = parsed.skeleton.and_then(|s| s.spine) {
        tracing::trace!(version = %version, "Parsed JSON skeleton");
    }
    Ok(parsed.animations.keys().cloned().collect())
}
