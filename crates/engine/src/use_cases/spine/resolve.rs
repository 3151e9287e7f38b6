//! Asset resolution: subject → skeleton bundle on disk.

use std::path::PathBuf;
use std::sync::Arc;

use hellabot_domain::{Direction, Subject, SubjectKind};

use super::SpineError;
use crate::infrastructure::overrides::IdOverrides;
use crate::infrastructure::skeleton::SkeletonError;

/// Bundle file extensions, in preference order.
const BUNDLE_EXTENSIONS: [&str; 2] = ["skel", "json"];

/// Finds skeleton bundles under the asset root.
///
/// Operators live at `operator/<id>/<front|back>/<id>.skel`, enemies at
/// `enemy/<id>/<id>.skel`. A `.json` skeleton with the same stem is used
/// when no binary one exists.
pub struct AssetResolver {
    root: PathBuf,
    overrides: Arc<IdOverrides>,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>, overrides: Arc<IdOverrides>) -> Self {
        Self {
            root: root.into(),
            overrides,
        }
    }

    pub async fn resolve_subject(&self, subject: &Subject) -> Result<PathBuf, SpineError> {
        self.resolve(subject.kind(), subject.id(), subject.direction())
            .await
    }

    pub async fn resolve(
        &self,
        kind: SubjectKind,
        id: &str,
        direction: Option<Direction>,
    ) -> Result<PathBuf, SpineError> {
        let storage_id = self.overrides.storage_id(kind, id);
        if !is_plain_id(storage_id) {
            tracing::warn!(subject_id = %id, "Rejected asset id with path components");
            return Err(SpineError::not_found(kind.as_str(), id));
        }

        let dir = match kind {
            SubjectKind::Operator => self
                .root
                .join("operator")
                .join(storage_id)
                .join(direction.unwrap_or_default().as_str()),
            SubjectKind::Enemy => self.root.join("enemy").join(storage_id),
        };

        for ext in BUNDLE_EXTENSIONS {
            let candidate = dir.join(format!("{storage_id}.{ext}"));
            match tokio::fs::try_exists(&candidate).await {
                Ok(true) => return Ok(candidate),
                Ok(false) => {}
                Err(source) => {
                    tracing::warn!(
                        subject_id = %id,
                        path = %candidate.display(),
                        error = %source,
                        "Asset tree unreadable"
                    );
                    return Err(SkeletonError::Io {
                        path: candidate,
                        source,
                    }
                    .into());
                }
            }
        }

        tracing::debug!(subject_id = %id, dir = %dir.display(), "No skeleton bundle found");
        Err(SpineError::not_found(kind.as_str(), id))
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && !id.contains("..")
        && !id.contains(['/', '\\', '\0'])
}
