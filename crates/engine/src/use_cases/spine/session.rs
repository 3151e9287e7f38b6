//! Render session launch.

use std::sync::Arc;

use hellabot_domain::{OutputToken, SkeletonBundle, Subject, SubjectKind, OUTPUT_TOKEN_LEN};

use super::SpineError;
use crate::infrastructure::overrides::IdOverrides;
use crate::infrastructure::ports::{RandomPort, RenderRequest, RenderRuntime, RenderSession};

/// File name the render page writes for `id` under `token`.
pub fn artifact_name(
    overrides: &IdOverrides,
    kind: SubjectKind,
    id: &str,
    token: &OutputToken,
) -> String {
    format!(
        "{}{}.gif",
        urlencoding::encode(overrides.storage_id(kind, id)),
        token
    )
}

/// A launched render: the request that started it and the live page.
///
/// The handle must be closed before the session is dropped; the completion
/// watcher does this on every exit path.
pub struct LiveSession {
    pub request: RenderRequest,
    pub handle: Box<dyn RenderSession>,
}

/// Starts one fresh render session per request.
pub struct SessionLauncher {
    runtime: Arc<dyn RenderRuntime>,
    random: Arc<dyn RandomPort>,
    overrides: Arc<IdOverrides>,
}

impl SessionLauncher {
    pub fn new(
        runtime: Arc<dyn RenderRuntime>,
        random: Arc<dyn RandomPort>,
        overrides: Arc<IdOverrides>,
    ) -> Self {
        Self {
            runtime,
            random,
            overrides,
        }
    }

    pub async fn launch(
        &self,
        subject: &Subject,
        clip: &str,
        bundle: &SkeletonBundle,
    ) -> Result<LiveSession, SpineError> {
        let token = OutputToken::new(self.random.alphanumeric(OUTPUT_TOKEN_LEN))
            .map_err(|e| SpineError::render(format!("output token: {e}")))?;

        let request = RenderRequest {
            request_id: self.random.gen_uuid(),
            subject: subject.clone(),
            clip: clip.to_string(),
            bundle_path: bundle.source_path().to_path_buf(),
            artifact_name: artifact_name(&self.overrides, subject.kind(), subject.id(), &token),
            token,
        };

        tracing::info!(
            request_id = %request.request_id,
            subject_id = %subject.id(),
            clip = %clip,
            artifact = %request.artifact_name,
            "Launching render session"
        );

        let handle = self.runtime.launch(&request).await.map_err(|e| {
            tracing::error!(
                request_id = %request.request_id,
                subject_id = %subject.id(),
                error = %e,
                "Render session failed to launch"
            );
            SpineError::render(e)
        })?;

        Ok(LiveSession { request, handle })
    }
}
