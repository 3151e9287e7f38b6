//! Headless Chromium render runtime.
//!
//! Each launch starts its own browser process with a throw-away profile,
//! drives it over the DevTools protocol, and points one page at the render
//! target. The page plays the requested clip, saves the animation into the
//! artifact directory, and logs `done`.

mod connection;
mod protocol;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::infrastructure::ports::{
    RenderError, RenderRequest, RenderRuntime, RenderSession, RenderSignal,
};
use connection::CdpConnection;

/// How long the browser gets to print its DevTools endpoint.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-command response timeout.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period for `Browser.close` before the process is killed.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ChromiumRuntime {
    chrome_path: PathBuf,
    page_url: Url,
    artifact_dir: PathBuf,
    startup_timeout: Duration,
}

impl ChromiumRuntime {
    pub fn new(
        chrome_path: impl Into<PathBuf>,
        page_url: &str,
        artifact_dir: impl Into<PathBuf>,
    ) -> Result<Self, RenderError> {
        let page_url = Url::parse(page_url)
            .map_err(|e| RenderError::launch(format!("invalid render page url {page_url}: {e}")))?;
        // DevTools resolves download paths against the browser, not us.
        let artifact_dir = artifact_dir.into();
        let artifact_dir = std::path::absolute(&artifact_dir).unwrap_or(artifact_dir);
        Ok(Self {
            chrome_path: chrome_path.into(),
            page_url,
            artifact_dir,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        })
    }

    /// Render page URL for one request.
    pub fn render_url(&self, request: &RenderRequest) -> Url {
        let subject = &request.subject;
        let skel = request
            .bundle_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut url = self.page_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("type", subject.kind().as_str())
                .append_pair("id", subject.id());
            if let Some(direction) = subject.direction() {
                query.append_pair("direction", direction.as_str());
            }
            query
                .append_pair("anim", &request.clip)
                .append_pair("skel", &skel)
                .append_pair("output", &request.artifact_name);
        }
        url
    }

    fn spawn_browser(&self, profile: &tempfile::TempDir) -> Result<Child, RenderError> {
        Command::new(&self.chrome_path)
            .arg("--headless=new")
            .arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .arg("--allow-file-access-from-files")
            .arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::launch(format!("{}: {e}", self.chrome_path.display()))
            })
    }

    /// Read stderr until the DevTools endpoint appears, then keep draining it.
    async fn await_endpoint(
        &self,
        stderr: ChildStderr,
    ) -> Result<(String, JoinHandle<()>), RenderError> {
        let mut lines = BufReader::new(stderr).lines();

        let find = async {
            while let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| RenderError::launch(format!("reading browser output: {e}")))?
            {
                if let Some(url) = protocol::devtools_url(&line) {
                    return Ok(url.to_string());
                }
                tracing::trace!(line = %line, "chromium");
            }
            Err(RenderError::launch("browser exited before opening DevTools"))
        };

        let ws_url = tokio::time::timeout(self.startup_timeout, find)
            .await
            .map_err(|_| RenderError::StartupTimeout(self.startup_timeout))??;

        let drain = tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::trace!(line = %line, "chromium");
            }
        });
        Ok((ws_url, drain))
    }

    async fn open_page(
        &self,
        connection: &CdpConnection,
        request: &RenderRequest,
    ) -> Result<(), RenderError> {
        let target = connection
            .call("Target.createTarget", json!({ "url": "about:blank" }), None)
            .await?;
        let target_id = target["targetId"]
            .as_str()
            .ok_or_else(|| RenderError::protocol("createTarget returned no targetId"))?
            .to_string();

        let attached = connection
            .call(
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
                None,
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| RenderError::protocol("attachToTarget returned no sessionId"))?
            .to_string();
        connection.watch_session(&session_id).await;

        let session = Some(session_id.as_str());
        connection.call("Runtime.enable", json!({}), session).await?;
        connection.call("Inspector.enable", json!({}), session).await?;
        connection.call("Page.enable", json!({}), session).await?;
        connection
            .call(
                "Browser.setDownloadBehavior",
                json!({
                    "behavior": "allow",
                    "downloadPath": self.artifact_dir.display().to_string(),
                }),
                None,
            )
            .await?;

        let url = self.render_url(request);
        let navigated = connection
            .call("Page.navigate", json!({ "url": url.as_str() }), session)
            .await?;
        if let Some(error) = navigated["errorText"].as_str() {
            return Err(RenderError::protocol(format!("navigation failed: {error}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RenderRuntime for ChromiumRuntime {
    async fn launch(&self, request: &RenderRequest) -> Result<Box<dyn RenderSession>, RenderError> {
        let profile = tempfile::Builder::new()
            .prefix("hellabot-chromium-")
            .tempdir()
            .map_err(|e| RenderError::launch(format!("profile directory: {e}")))?;

        let mut child = self.spawn_browser(&profile)?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::launch("browser stderr unavailable"))?;

        let setup = async {
            let (ws_url, drain) = self.await_endpoint(stderr).await?;
            let (connection, signals) = CdpConnection::connect(&ws_url, COMMAND_TIMEOUT).await?;
            self.open_page(&connection, request).await?;
            Ok::<_, RenderError>((connection, signals, drain))
        };

        match setup.await {
            Ok((connection, signals, drain)) => {
                tracing::info!(
                    request_id = %request.request_id,
                    subject_id = %request.subject.id(),
                    clip = %request.clip,
                    "Render page navigating"
                );
                Ok(Box::new(ChromiumSession {
                    child: Some(child),
                    connection: Some(connection),
                    signals,
                    drain,
                    _profile: profile,
                }))
            }
            Err(e) => {
                // Roll back: nothing outlives a failed launch.
                let _ = child.kill().await;
                Err(e)
            }
        }
    }
}

/// A live page in its own browser process.
pub struct ChromiumSession {
    child: Option<Child>,
    connection: Option<CdpConnection>,
    signals: mpsc::Receiver<RenderSignal>,
    drain: JoinHandle<()>,
    _profile: tempfile::TempDir,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn next_signal(&mut self) -> Option<RenderSignal> {
        self.signals.recv().await
    }

    async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            if !connection.close_browser(CLOSE_TIMEOUT).await {
                tracing::debug!("Browser did not close gracefully, killing it");
            }
            connection.shutdown();
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
        self.drain.abort();
        self.signals.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hellabot_domain::{Direction, OutputToken, Subject};
    use uuid::Uuid;

    fn request(subject: Subject, clip: &str, bundle: &str) -> RenderRequest {
        RenderRequest {
            request_id: Uuid::nil(),
            subject,
            clip: clip.to_string(),
            bundle_path: PathBuf::from(bundle),
            token: OutputToken::new("ab12cd34ef56gh78").unwrap(),
            artifact_name: "char_293_thorns_sale%237ab12cd34ef56gh78.gif".to_string(),
        }
    }

    #[test]
    fn operator_url_carries_every_parameter() {
        let runtime =
            ChromiumRuntime::new("chromium", "file:///srv/spine/index.html", "/tmp/out").unwrap();
        let subject =
            Subject::operator("char_293_thorns_sale#7", Direction::Back, "Thorns").unwrap();
        let url = runtime.render_url(&request(
            subject,
            "Skill_1 Loop",
            "/srv/spine/operator/char_293_thorns_sale#7/back/char_293_thorns_sale#7.skel",
        ));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("type".into(), "operator".into()),
                ("id".into(), "char_293_thorns_sale#7".into()),
                ("direction".into(), "back".into()),
                ("anim".into(), "Skill_1 Loop".into()),
                ("skel".into(), "char_293_thorns_sale#7.skel".into()),
                (
                    "output".into(),
                    "char_293_thorns_sale%237ab12cd34ef56gh78.gif".into()
                ),
            ]
        );
        assert_eq!(url.path(), "/srv/spine/index.html");
    }

    #[test]
    fn enemy_url_has_no_direction() {
        let runtime =
            ChromiumRuntime::new("chromium", "http://localhost:8080/spine", "/tmp/out").unwrap();
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();
        let url = runtime.render_url(&request(subject, "Move", "enemy_1007_slime.json"));

        assert!(url.query_pairs().all(|(k, _)| k != "direction"));
        assert!(url.query_pairs().any(|(k, v)| k == "skel" && v == "enemy_1007_slime.json"));
    }

    #[test]
    fn relative_artifact_dir_is_made_absolute() {
        let runtime =
            ChromiumRuntime::new("chromium", "file:///srv/spine/index.html", "spine-output")
                .unwrap();
        assert!(runtime.artifact_dir.is_absolute());
        assert!(runtime.artifact_dir.ends_with("spine-output"));
    }

    #[test]
    fn rejects_invalid_page_url() {
        assert!(matches!(
            ChromiumRuntime::new("chromium", "not a url", "/tmp"),
            Err(RenderError::Launch(_))
        ));
    }

    #[tokio::test]
    async fn missing_browser_fails_launch() {
        let runtime = ChromiumRuntime::new(
            "/nonexistent/chromium-binary",
            "file:///srv/spine/index.html",
            "/tmp/out",
        )
        .unwrap();
        let subject = Subject::enemy("enemy_1007_slime", "Originium Slug").unwrap();

        let result = runtime
            .launch(&request(subject, "Move", "enemy_1007_slime.skel"))
            .await;
        assert!(matches!(result, Err(RenderError::Launch(_))));
    }
}
