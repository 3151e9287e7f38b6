//! Spine animation use cases.
//!
//! A render request walks a fixed pipeline: look the subject up, resolve its
//! skeleton bundle on disk, load the clip list, launch a fresh render
//! session, wait for the page to finish, then hand the artifact over and
//! purge it. Every clip switch runs the whole pipeline again.

mod render;
mod resolve;
mod session;
mod subject;
mod watcher;

use std::sync::Arc;

use crate::infrastructure::artifacts::ArtifactError;
use crate::infrastructure::ports::GameDataError;
use crate::infrastructure::skeleton::SkeletonError;

pub use render::{PrepareSpine, PreparedSpine, RenderSpine, RenderedSpine};
pub use resolve::AssetResolver;
pub use session::{artifact_name, LiveSession, SessionLauncher};
pub use subject::SubjectLookup;
pub use watcher::{CompletionWatcher, WatchEvent, WatchState, DONE_SIGNAL};

/// Errors from the spine pipeline.
///
/// Only [`SpineError::user_message`] text is ever shown to users; the
/// `Display` form carries operator detail and goes to the logs.
#[derive(Debug, thiserror::Error)]
pub enum SpineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Failed to load skeleton: {0}")]
    Load(#[from] SkeletonError),

    #[error("{0} has no playable animations")]
    NoAnimations(String),

    #[error("Unknown animation clip: {0}")]
    UnknownClip(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Artifact unavailable: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Game data lookup failed: {0}")]
    Upstream(#[from] GameDataError),
}

impl SpineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn render(reason: impl ToString) -> Self {
        Self::Render(reason.to_string())
    }

    /// Short text safe to show in chat.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("That {entity} doesn't exist!"),
            Self::Load(_) => "There was an error while loading the spine data!".to_string(),
            Self::NoAnimations(kind) => format!("That {kind} has no animations!"),
            Self::UnknownClip(_) => "That animation doesn't exist!".to_string(),
            Self::Render(_) | Self::Artifact(_) => {
                "There was an error while generating the animation!".to_string()
            }
            Self::Upstream(_) => {
                "The game data service is unavailable, try again later!".to_string()
            }
        }
    }
}

/// Container for spine use cases.
pub struct SpineUseCases {
    pub prepare: Arc<PrepareSpine>,
    pub render: Arc<RenderSpine>,
}

impl SpineUseCases {
    pub fn new(prepare: Arc<PrepareSpine>, render: Arc<RenderSpine>) -> Self {
        Self { prepare, render }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_hide_detail() {
        let err = SpineError::render("TypeError: atlas is undefined at spine.js:12");
        assert_eq!(
            err.user_message(),
            "There was an error while generating the animation!"
        );
        assert!(err.to_string().contains("atlas is undefined"));

        let err = SpineError::Load(SkeletonError::UnsupportedVersion("4.2.0".into()));
        assert_eq!(
            err.user_message(),
            "There was an error while loading the spine data!"
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(
            SpineError::not_found("operator", "thornz").user_message(),
            "That operator doesn't exist!"
        );
        assert_eq!(
            SpineError::not_found("skin", "summer").user_message(),
            "That skin doesn't exist!"
        );
    }
}
