//! Spine preparation and rendering.

use std::sync::Arc;

use hellabot_domain::{Direction, RenderOutcome, SkeletonBundle, Subject};

use super::resolve::AssetResolver;
use super::session::SessionLauncher;
use super::subject::SubjectLookup;
use super::watcher::CompletionWatcher;
use super::SpineError;
use crate::infrastructure::artifacts::{ArtifactStore, RenderedArtifact};
use crate::infrastructure::skeleton::SkeletonLoader;

/// Resolve and load a subject's bundle; a bundle with nothing playable is
/// an error.
async fn load_bundle(
    resolver: &AssetResolver,
    loader: &SkeletonLoader,
    subject: &Subject,
) -> Result<SkeletonBundle, SpineError> {
    let path = resolver.resolve_subject(subject).await?;
    let bundle = loader.load(&path).await.map_err(|e| {
        tracing::error!(
            subject_id = %subject.id(),
            path = %path.display(),
            error = %e,
            "Failed to load skeleton"
        );
        SpineError::Load(e)
    })?;

    if bundle.is_empty() {
        return Err(SpineError::NoAnimations(subject.kind().as_str().to_string()));
    }
    Ok(bundle)
}

/// A resolved subject and its playable clips.
#[derive(Debug, Clone)]
pub struct PreparedSpine {
    pub subject: Subject,
    pub clips: Vec<String>,
}

/// Look a subject up and list its clips, without rendering anything.
pub struct PrepareSpine {
    lookup: SubjectLookup,
    resolver: Arc<AssetResolver>,
    loader: SkeletonLoader,
}

impl PrepareSpine {
    pub fn new(lookup: SubjectLookup, resolver: Arc<AssetResolver>, loader: SkeletonLoader) -> Self {
        Self {
            lookup,
            resolver,
            loader,
        }
    }

    pub async fn operator(
        &self,
        name: &str,
        skin: Option<&str>,
        direction: Direction,
    ) -> Result<PreparedSpine, SpineError> {
        let subject = self.lookup.operator(name, skin, direction).await?;
        self.execute(subject).await
    }

    pub async fn enemy(&self, name: &str) -> Result<PreparedSpine, SpineError> {
        let subject = self.lookup.enemy(name).await?;
        self.execute(subject).await
    }

    pub async fn execute(&self, subject: Subject) -> Result<PreparedSpine, SpineError> {
        let bundle = load_bundle(&self.resolver, &self.loader, &subject).await?;
        Ok(PreparedSpine {
            clips: bundle.clip_names().to_vec(),
            subject,
        })
    }
}

/// One finished render, already removed from disk.
#[derive(Debug, Clone)]
pub struct RenderedSpine {
    pub subject: Subject,
    pub clip: String,
    pub clips: Vec<String>,
    pub artifact: RenderedArtifact,
}

/// Render one clip of a subject in a fresh session.
pub struct RenderSpine {
    resolver: Arc<AssetResolver>,
    loader: SkeletonLoader,
    launcher: SessionLauncher,
    watcher: CompletionWatcher,
    artifacts: ArtifactStore,
}

impl RenderSpine {
    pub fn new(
        resolver: Arc<AssetResolver>,
        loader: SkeletonLoader,
        launcher: SessionLauncher,
        watcher: CompletionWatcher,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            resolver,
            loader,
            launcher,
            watcher,
            artifacts,
        }
    }

    /// Render `clip`. The bundle is resolved and loaded again on every call.
    pub async fn execute(&self, subject: &Subject, clip: &str) -> Result<RenderedSpine, SpineError> {
        let bundle = load_bundle(&self.resolver, &self.loader, subject).await?;
        if !bundle.has_clip(clip) {
            return Err(SpineError::UnknownClip(clip.to_string()));
        }

        let mut session = self.launcher.launch(subject, clip, &bundle).await?;
        let name = session.request.artifact_name.clone();
        let artifact_path = match self.artifacts.path_for(&name) {
            Ok(path) => path,
            Err(e) => {
                session.handle.close().await;
                return Err(e.into());
            }
        };

        match self.watcher.watch(&mut session, artifact_path).await {
            RenderOutcome::Success(_) => {
                let artifact = self.artifacts.collect(&name).await?;
                Ok(RenderedSpine {
                    subject: subject.clone(),
                    clip: clip.to_string(),
                    clips: bundle.clip_names().to_vec(),
                    artifact,
                })
            }
            RenderOutcome::Failure(reason) => {
                if self.artifacts.purge(&name).await {
                    tracing::debug!(artifact = %name, "Removed partial artifact");
                }
                Err(SpineError::Render(reason))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use hellabot_domain::{OutputToken, Operator};
    use uuid::Uuid;

    use crate::infrastructure::overrides::IdOverrides;
    use crate::infrastructure::ports::{
        MockGameDataPort, RenderError, RenderRequest, RenderRuntime, RenderSession, RenderSignal,
    };
    use crate::infrastructure::random::{FixedRandom, SystemRandom};
    use crate::infrastructure::skeleton::tests::sample_skeleton;
    use crate::use_cases::spine::session::LiveSession;

    /// Session that replays a fixed list of signals.
    pub(crate) struct ScriptedSession {
        signals: VecDeque<RenderSignal>,
        hang: bool,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedSession {
        /// Ends the signal stream after the script.
        pub(crate) fn new(signals: Vec<RenderSignal>) -> (Self, Arc<AtomicUsize>) {
            Self::build(signals, false)
        }

        /// Goes silent after the script without closing the stream.
        pub(crate) fn hanging(signals: Vec<RenderSignal>) -> (Self, Arc<AtomicUsize>) {
            Self::build(signals, true)
        }

        fn build(signals: Vec<RenderSignal>, hang: bool) -> (Self, Arc<AtomicUsize>) {
            let closes = Arc::new(AtomicUsize::new(0));
            let session = Self {
                signals: signals.into(),
                hang,
                closes: closes.clone(),
            };
            (session, closes)
        }
    }

    #[async_trait]
    impl RenderSession for ScriptedSession {
        async fn next_signal(&mut self) -> Option<RenderSignal> {
            match self.signals.pop_front() {
                Some(signal) => Some(signal),
                None if self.hang => std::future::pending().await,
                None => None,
            }
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Runtime that hands out scripted sessions and records every launch.
    ///
    /// With an output directory set, each launch writes the artifact the way
    /// the render page would.
    pub(crate) struct ScriptedRuntime {
        script: Vec<RenderSignal>,
        output_dir: Option<PathBuf>,
        failure: Option<String>,
        launched: Mutex<Vec<RenderRequest>>,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptedRuntime {
        pub(crate) fn new(script: Vec<RenderSignal>) -> Self {
            Self {
                script,
                output_dir: None,
                failure: None,
                launched: Mutex::new(Vec::new()),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::new(Vec::new())
            }
        }

        pub(crate) fn writing_into(mut self, dir: &Path) -> Self {
            self.output_dir = Some(dir.to_path_buf());
            self
        }

        pub(crate) fn launched(&self) -> Vec<RenderRequest> {
            self.launched.lock().unwrap().clone()
        }

        pub(crate) fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenderRuntime for ScriptedRuntime {
        async fn launch(
            &self,
            request: &RenderRequest,
        ) -> Result<Box<dyn RenderSession>, RenderError> {
            if let Some(message) = &self.failure {
                return Err(RenderError::launch(message.clone()));
            }
            self.launched.lock().unwrap().push(request.clone());
            if let Some(dir) = &self.output_dir {
                std::fs::write(dir.join(&request.artifact_name), b"GIF89a").unwrap();
            }
            Ok(Box::new(ScriptedSession {
                signals: self.script.clone().into(),
                hang: false,
                closes: self.closes.clone(),
            }))
        }
    }

    pub(crate) fn live_session(session: ScriptedSession) -> LiveSession {
        LiveSession {
            request: RenderRequest {
                request_id: Uuid::nil(),
                subject: Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap(),
                clip: "Move".to_string(),
                bundle_path: PathBuf::from("enemy_1007_slime.skel"),
                token: OutputToken::new("abc").unwrap(),
                artifact_name: "enemy_1007_slimeabc.gif".to_string(),
            },
            handle: Box::new(session),
        }
    }

    struct Fixture {
        assets: tempfile::TempDir,
        output: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                assets: tempfile::tempdir().unwrap(),
                output: tempfile::tempdir().unwrap(),
            }
        }

        fn write_asset(&self, rel: &str, bytes: &[u8]) {
            let path = self.assets.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, bytes).unwrap();
        }

        fn resolver(&self) -> Arc<AssetResolver> {
            Arc::new(AssetResolver::new(
                self.assets.path(),
                Arc::new(IdOverrides::empty()),
            ))
        }

        fn render_spine(
            &self,
            runtime: Arc<ScriptedRuntime>,
            random: Arc<dyn crate::infrastructure::ports::RandomPort>,
        ) -> RenderSpine {
            RenderSpine::new(
                self.resolver(),
                SkeletonLoader::new(),
                SessionLauncher::new(runtime, random, Arc::new(IdOverrides::empty())),
                CompletionWatcher::new(Duration::ZERO, Duration::from_secs(120)),
                ArtifactStore::new(self.output.path()),
            )
        }

        fn output_is_empty(&self) -> bool {
            std::fs::read_dir(self.output.path()).unwrap().next().is_none()
        }
    }

    fn thorns() -> Operator {
        serde_json::from_value(serde_json::json!({
            "id": "thorns",
            "data": { "name": "Thorns", "rarity": "TIER_6" }
        }))
        .unwrap()
    }

    fn done() -> Vec<RenderSignal> {
        vec![
            RenderSignal::Console("loading".into()),
            RenderSignal::Console("done".into()),
        ]
    }

    #[tokio::test]
    async fn thorns_renders_and_artifact_is_removed() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "operator/thorns/front/thorns.skel",
            &sample_skeleton(false, &["Default", "Attack", "Skill"]),
        );

        let mut game_data = MockGameDataPort::new();
        game_data.expect_operator().returning(|_| Ok(Some(thorns())));
        let prepare = PrepareSpine::new(
            SubjectLookup::new(Arc::new(game_data)),
            fixture.resolver(),
            SkeletonLoader::new(),
        );

        let prepared = prepare
            .operator("thorns", None, Direction::Front)
            .await
            .unwrap();
        assert_eq!(prepared.clips, vec!["Attack", "Skill"]);

        let runtime = Arc::new(ScriptedRuntime::new(done()).writing_into(fixture.output.path()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(FixedRandom("k7")));

        let rendered = render
            .execute(&prepared.subject, &prepared.clips[0])
            .await
            .unwrap();

        assert_eq!(rendered.artifact.file_name, "thornsk7k7k7k7k7k7k7k7.gif");
        assert_eq!(rendered.artifact.bytes, b"GIF89a");
        assert_eq!(rendered.clips, vec!["Attack", "Skill"]);
        assert!(!rendered.clips.iter().any(|c| c == "Default"));
        assert_eq!(runtime.launched().len(), 1);
        assert_eq!(runtime.closes(), 1);
        assert!(fixture.output_is_empty());
    }

    #[tokio::test]
    async fn missing_bundle_launches_nothing() {
        let fixture = Fixture::new();
        let runtime = Arc::new(ScriptedRuntime::new(done()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_9999_ghost", "Ghost").unwrap();

        let result = render.execute(&subject, "Move").await;

        assert!(matches!(result, Err(SpineError::NotFound { entity: "enemy", .. })));
        assert!(runtime.launched().is_empty());
    }

    #[tokio::test]
    async fn malformed_bundle_is_a_load_error() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            b"\x00\x00not a skeleton",
        );
        let mut game_data = MockGameDataPort::new();
        game_data.expect_enemy().returning(|_| {
            Ok(Some(
                serde_json::from_value(serde_json::json!({
                    "excel": { "enemyId": "enemy_1007_slime", "enemyIndex": "B1", "name": "Originium Slug" }
                }))
                .unwrap(),
            ))
        });
        let prepare = PrepareSpine::new(
            SubjectLookup::new(Arc::new(game_data)),
            fixture.resolver(),
            SkeletonLoader::new(),
        );

        let result = prepare.enemy("originium slug").await;
        assert!(matches!(result, Err(SpineError::Load(_))));

        let runtime = Arc::new(ScriptedRuntime::new(done()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();
        assert!(matches!(
            render.execute(&subject, "Move").await,
            Err(SpineError::Load(_))
        ));
        assert!(runtime.launched().is_empty());
    }

    #[tokio::test]
    async fn rest_pose_only_has_no_animations() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            &sample_skeleton(false, &["Default"]),
        );
        let prepare = PrepareSpine::new(
            SubjectLookup::new(Arc::new(MockGameDataPort::new())),
            fixture.resolver(),
            SkeletonLoader::new(),
        );
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let result = prepare.execute(subject).await;
        assert!(matches!(result, Err(SpineError::NoAnimations(kind)) if kind == "enemy"));
    }

    #[tokio::test]
    async fn unknown_clip_launches_nothing() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            &sample_skeleton(false, &["Move", "Die"]),
        );
        let runtime = Arc::new(ScriptedRuntime::new(done()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let result = render.execute(&subject, "Default").await;
        assert!(matches!(result, Err(SpineError::UnknownClip(_))));
        assert!(runtime.launched().is_empty());
    }

    #[tokio::test]
    async fn page_error_purges_partial_artifact() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            &sample_skeleton(false, &["Move"]),
        );
        let runtime = Arc::new(
            ScriptedRuntime::new(vec![RenderSignal::PageError(
                "RangeError: invalid array length".into(),
            )])
            .writing_into(fixture.output.path()),
        );
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let result = render.execute(&subject, "Move").await;

        assert!(matches!(result, Err(SpineError::Render(reason)) if reason.contains("RangeError")));
        assert_eq!(runtime.closes(), 1);
        assert!(fixture.output_is_empty());
    }

    #[tokio::test]
    async fn missing_artifact_after_done_is_an_artifact_error() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            &sample_skeleton(false, &["Move"]),
        );
        let runtime = Arc::new(ScriptedRuntime::new(done()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let result = render.execute(&subject, "Move").await;
        assert!(matches!(result, Err(SpineError::Artifact(_))));
        assert_eq!(runtime.closes(), 1);
    }

    #[tokio::test]
    async fn concurrent_renders_use_distinct_artifacts() {
        let fixture = Fixture::new();
        fixture.write_asset(
            "enemy/enemy_1007_slime/enemy_1007_slime.skel",
            &sample_skeleton(false, &["Move", "Die"]),
        );
        let runtime = Arc::new(ScriptedRuntime::new(done()).writing_into(fixture.output.path()));
        let render = fixture.render_spine(runtime.clone(), Arc::new(SystemRandom::new()));
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let (a, b) = tokio::join!(
            render.execute(&subject, "Move"),
            render.execute(&subject, "Move")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.artifact.file_name, b.artifact.file_name);
        assert!(a.artifact.file_name.starts_with("enemy_1007_slime"));
        assert_eq!(runtime.launched().len(), 2);
        assert_eq!(runtime.closes(), 2);
        assert!(fixture.output_is_empty());
    }
}
