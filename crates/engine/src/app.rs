//! Application state and composition.

use std::sync::Arc;

use anyhow::Context as _;

use crate::infrastructure::{
    artifacts::ArtifactStore,
    chromium::ChromiumRuntime,
    config::BotConfig,
    gamedata::GameDataClient,
    overrides::IdOverrides,
    ports::{GameDataPort, RandomPort, RenderRuntime},
    random::SystemRandom,
    skeleton::SkeletonLoader,
};
use crate::use_cases::{
    self,
    spine::{
        AssetResolver, CompletionWatcher, PrepareSpine, RenderSpine, SessionLauncher,
        SubjectLookup,
    },
};

/// Main application state.
///
/// Shared by every command handler through the framework data.
pub struct App {
    pub config: BotConfig,
    /// Record lookups with no logic of their own go straight to the port.
    pub game_data: Arc<dyn GameDataPort>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub spine: use_cases::SpineUseCases,
    pub autocomplete: Arc<use_cases::Autocomplete>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        config: BotConfig,
        game_data: Arc<dyn GameDataPort>,
        runtime: Arc<dyn RenderRuntime>,
        random: Arc<dyn RandomPort>,
        overrides: Arc<IdOverrides>,
        artifacts: ArtifactStore,
    ) -> Self {
        let resolver = Arc::new(AssetResolver::new(
            config.spine_asset_dir.clone(),
            overrides.clone(),
        ));

        let prepare = Arc::new(PrepareSpine::new(
            SubjectLookup::new(game_data.clone()),
            resolver.clone(),
            SkeletonLoader::new(),
        ));
        let render = Arc::new(RenderSpine::new(
            resolver,
            SkeletonLoader::new(),
            SessionLauncher::new(runtime, random, overrides),
            CompletionWatcher::new(config.settle_delay, config.render_timeout),
            artifacts,
        ));

        let use_cases = UseCases {
            spine: use_cases::SpineUseCases::new(prepare, render),
            autocomplete: Arc::new(use_cases::Autocomplete::new(game_data.clone())),
        };

        Self {
            config,
            game_data,
            use_cases,
        }
    }

    /// Build the production adapters described by `config`.
    pub async fn from_config(config: BotConfig) -> anyhow::Result<Self> {
        let game_data: Arc<dyn GameDataPort> =
            Arc::new(GameDataClient::new(&config.gamedata_api_url));

        let overrides = match &config.id_overrides_path {
            Some(path) => IdOverrides::load(path)?,
            None => IdOverrides::empty(),
        };

        let artifacts = ArtifactStore::new(config.spine_output_dir.clone());
        artifacts.ensure_dir().await.with_context(|| {
            format!(
                "Failed to create spine output directory {}",
                config.spine_output_dir.display()
            )
        })?;

        let runtime: Arc<dyn RenderRuntime> = Arc::new(ChromiumRuntime::new(
            config.chrome_path.clone(),
            &config.spine_render_url,
            config.spine_output_dir.clone(),
        )?);
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());

        tracing::info!(
            gamedata_api_url = %config.gamedata_api_url,
            spine_asset_dir = %config.spine_asset_dir.display(),
            spine_output_dir = %config.spine_output_dir.display(),
            "Application wired"
        );

        Ok(Self::new(
            config,
            game_data,
            runtime,
            random,
            Arc::new(overrides),
            artifacts,
        ))
    }
}
