//! External service port traits (game data, rendering runtime).

use std::path::PathBuf;

use async_trait::async_trait;
use hellabot_domain::{
    Definition, Enemy, Item, Operator, OutputToken, Skill, Stage, StageDifficulty, Subject,
};
use uuid::Uuid;

use super::error::{GameDataError, RenderError};

// =============================================================================
// Game Data
// =============================================================================

/// Record families that can be listed for autocomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Operator,
    Enemy,
    Skill,
    Item,
    Definition,
    Stage,
    ToughStage,
}

/// Tag on operator entries that have promotion or skill upgrade costs.
pub const TAG_UPGRADABLE: &str = "upgradable";

/// One listable record reduced to what autocomplete needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Text shown in the suggestion list.
    pub label: String,
    /// Value submitted when the suggestion is picked.
    pub value: String,
    /// Strings the query is matched against.
    pub keywords: Vec<String>,
    /// Filter tags; never matched against the query.
    pub tags: Vec<&'static str>,
}

impl CatalogEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            keywords: vec![label.clone()],
            label,
            value: value.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| *t == tag)
    }
}

/// Lookup functions over the upstream game-data service.
///
/// `Ok(None)` (or an empty list) means the record does not exist; callers
/// treat it as NotFound, never as a failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameDataPort: Send + Sync {
    async fn operator(&self, query: &str) -> Result<Option<Operator>, GameDataError>;
    async fn enemy(&self, query: &str) -> Result<Option<Enemy>, GameDataError>;
    async fn skill(&self, query: &str) -> Result<Option<Skill>, GameDataError>;
    async fn item(&self, query: &str) -> Result<Option<Item>, GameDataError>;
    async fn definition(&self, query: &str) -> Result<Option<Definition>, GameDataError>;
    async fn definitions(&self) -> Result<Vec<Definition>, GameDataError>;
    async fn stages(
        &self,
        code: &str,
        difficulty: StageDifficulty,
    ) -> Result<Vec<Stage>, GameDataError>;
    async fn catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, GameDataError>;
}

// =============================================================================
// Rendering Runtime
// =============================================================================

/// Everything a runtime needs to start one isolated render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub request_id: Uuid,
    pub subject: Subject,
    pub clip: String,
    pub bundle_path: PathBuf,
    pub token: OutputToken,
    /// File name the render page must save the animation under.
    pub artifact_name: String,
}

/// Raw output observed from a live render page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSignal {
    /// A console message, arguments joined by spaces.
    Console(String),
    /// An uncaught page error or a crashed target.
    PageError(String),
}

/// A live, isolated rendering context.
///
/// Holds a browser process open until [`RenderSession::close`] is called.
/// Closing more than once is harmless.
#[async_trait]
pub trait RenderSession: Send {
    /// Next signal, or `None` once the page connection is gone.
    async fn next_signal(&mut self) -> Option<RenderSignal>;

    async fn close(&mut self);
}

/// Launches render sessions.
#[async_trait]
pub trait RenderRuntime: Send + Sync {
    /// Start a session and begin playing the requested clip.
    ///
    /// Returns as soon as the page is navigating; frames are produced
    /// out-of-band and reported through the session's signals.
    async fn launch(&self, request: &RenderRequest) -> Result<Box<dyn RenderSession>, RenderError>;
}
