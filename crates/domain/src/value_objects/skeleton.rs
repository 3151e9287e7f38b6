//! Skeleton bundles and render outcomes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Rest-pose clip present in most skeletons; never offered for playback.
pub const REST_POSE_CLIP: &str = "Default";

/// The playable animation clips of one skeletal-animation bundle.
///
/// Clip names keep file order, are unique (first occurrence wins), and never
/// contain [`REST_POSE_CLIP`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonBundle {
    source_path: PathBuf,
    clip_names: Vec<String>,
    had_rest_pose: bool,
}

impl SkeletonBundle {
    /// Build a bundle from clip names in file order.
    pub fn from_clips<I, T>(source_path: impl Into<PathBuf>, clips: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut had_rest_pose = false;
        let mut clip_names = Vec::new();

        for clip in clips {
            let clip = clip.into();
            if clip == REST_POSE_CLIP {
                had_rest_pose = true;
                continue;
            }
            if seen.insert(clip.clone()) {
                clip_names.push(clip);
            }
        }

        Self {
            source_path: source_path.into(),
            clip_names,
            had_rest_pose,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn clip_names(&self) -> &[String] {
        &self.clip_names
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.clip_names.iter().any(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.clip_names.is_empty()
    }

    pub fn had_rest_pose(&self) -> bool {
        self.had_rest_pose
    }
}

/// Terminal result of one render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The artifact was written to this path.
    Success(PathBuf),
    /// The session failed; the reason is operator-facing only.
    Failure(String),
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_pose_is_filtered_out() {
        let bundle = SkeletonBundle::from_clips("thorns.skel", ["Default", "Attack", "Skill"]);
        assert_eq!(bundle.clip_names(), ["Attack", "Skill"]);
        assert!(bundle.had_rest_pose());
    }

    #[test]
    fn duplicate_clips_keep_first_occurrence() {
        let bundle = SkeletonBundle::from_clips("x.skel", ["Idle", "Move", "Idle", "Die"]);
        assert_eq!(bundle.clip_names(), ["Idle", "Move", "Die"]);
        assert!(!bundle.had_rest_pose());
    }

    #[test]
    fn bundle_with_only_rest_pose_is_empty() {
        let bundle = SkeletonBundle::from_clips("x.skel", ["Default"]);
        assert!(bundle.is_empty());
        assert!(!bundle.has_clip("Default"));
    }
}
