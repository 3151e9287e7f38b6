//! Completion watching for a live render session.
//!
//! [`WatchState::apply`] is the pure transition; [`CompletionWatcher::watch`]
//! drives it from the session's signal stream, the settle delay, and the
//! max-duration guard.

use std::path::PathBuf;
use std::time::Duration;

use hellabot_domain::RenderOutcome;
use tokio::time::{sleep, sleep_until, Instant};

use super::session::LiveSession;
use crate::infrastructure::ports::RenderSignal;

/// Console text the render page logs once the artifact is written.
pub const DONE_SIGNAL: &str = "done";

/// Inputs to the watcher state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Signal(RenderSignal),
    StreamEnded,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Running,
    Succeeded,
    Failed(String),
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Next state after `event`. Terminal states absorb every event.
    pub fn apply(self, event: &WatchEvent) -> Self {
        if self.is_terminal() {
            return self;
        }
        match event {
            WatchEvent::Signal(RenderSignal::Console(text)) if text == DONE_SIGNAL => {
                Self::Succeeded
            }
            WatchEvent::Signal(RenderSignal::Console(_)) => Self::Running,
            WatchEvent::Signal(RenderSignal::PageError(message)) => Self::Failed(message.clone()),
            WatchEvent::StreamEnded => Self::Failed("render page closed unexpectedly".to_string()),
            WatchEvent::TimedOut => Self::Failed("timed out".to_string()),
        }
    }
}

/// Waits for one session to reach a terminal state, then closes it.
#[derive(Debug, Clone, Copy)]
pub struct CompletionWatcher {
    settle_delay: Duration,
    max_duration: Duration,
}

impl CompletionWatcher {
    pub fn new(settle_delay: Duration, max_duration: Duration) -> Self {
        Self {
            settle_delay,
            max_duration,
        }
    }

    /// Resolve the session exactly once.
    ///
    /// The session handle is closed before this returns, whatever the
    /// outcome.
    pub async fn watch(&self, session: &mut LiveSession, artifact_path: PathBuf) -> RenderOutcome {
        let deadline = Instant::now() + self.max_duration;
        let mut state = WatchState::Running;

        while !state.is_terminal() {
            let event = tokio::select! {
                signal = session.handle.next_signal() => match signal {
                    Some(signal) => WatchEvent::Signal(signal),
                    None => WatchEvent::StreamEnded,
                },
                _ = sleep_until(deadline) => WatchEvent::TimedOut,
            };

            if let WatchEvent::Signal(RenderSignal::Console(text)) = &event {
                if text != DONE_SIGNAL {
                    tracing::debug!(request_id = %session.request.request_id, console = %text, "Ignoring render console output");
                }
            }
            state = state.apply(&event);
        }

        if state == WatchState::Succeeded {
            // The page logs before the encoder has flushed the file.
            sleep(self.settle_delay).await;
        }
        session.handle.close().await;

        match state {
            WatchState::Succeeded => {
                tracing::info!(
                    request_id = %session.request.request_id,
                    subject_id = %session.request.subject.id(),
                    artifact = %session.request.artifact_name,
                    "Render finished"
                );
                RenderOutcome::Success(artifact_path)
            }
            WatchState::Failed(reason) => {
                tracing::error!(
                    request_id = %session.request.request_id,
                    subject_id = %session.request.subject.id(),
                    clip = %session.request.clip,
                    error = %reason,
                    "Spine error"
                );
                RenderOutcome::Failure(reason)
            }
            WatchState::Running => RenderOutcome::Failure("watcher stopped early".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::spine::render::tests::{live_session, ScriptedSession};

    fn console(text: &str) -> WatchEvent {
        WatchEvent::Signal(RenderSignal::Console(text.to_string()))
    }

    #[test]
    fn done_succeeds_and_other_console_output_is_ignored() {
        let state = WatchState::Running.apply(&console("loading atlas"));
        assert_eq!(state, WatchState::Running);
        assert_eq!(state.apply(&console("done")), WatchState::Succeeded);
    }

    #[test]
    fn done_must_match_exactly() {
        for text in [" done", "done\n", "Done", "done!"] {
            assert_eq!(WatchState::Running.apply(&console(text)), WatchState::Running, "{text:?}");
        }
    }

    #[test]
    fn page_error_fails() {
        let state = WatchState::Running.apply(&WatchEvent::Signal(RenderSignal::PageError(
            "TypeError: x is undefined".into(),
        )));
        assert_eq!(state, WatchState::Failed("TypeError: x is undefined".into()));
    }

    #[test]
    fn terminal_states_absorb_events() {
        assert_eq!(
            WatchState::Succeeded.apply(&WatchEvent::TimedOut),
            WatchState::Succeeded
        );
        let failed = WatchState::Failed("boom".into());
        assert_eq!(failed.clone().apply(&console("done")), failed);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_settle_delay_before_closing() {
        let (session, closes) = ScriptedSession::new(vec![
            RenderSignal::Console("frame 1".into()),
            RenderSignal::Console("done".into()),
        ]);
        let mut live = live_session(session);
        let watcher = CompletionWatcher::new(Duration::from_millis(1000), Duration::from_secs(120));

        let started = Instant::now();
        let outcome = watcher.watch(&mut live, PathBuf::from("/out/a.gif")).await;

        assert_eq!(outcome, RenderOutcome::Success(PathBuf::from("/out/a.gif")));
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_duration_guard_fails_the_session() {
        let (session, closes) = ScriptedSession::hanging(vec![RenderSignal::Console("frame 1".into())]);
        let mut live = live_session(session);
        let watcher = CompletionWatcher::new(Duration::from_millis(1000), Duration::from_secs(120));

        let outcome = watcher.watch(&mut live, PathBuf::from("/out/a.gif")).await;

        assert_eq!(outcome, RenderOutcome::Failure("timed out".into()));
        assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_end_fails_the_session() {
        let (session, closes) = ScriptedSession::new(vec![RenderSignal::Console("frame 1".into())]);
        let mut live = live_session(session);
        let watcher = CompletionWatcher::new(Duration::from_millis(1000), Duration::from_secs(120));

        let outcome = watcher.watch(&mut live, PathBuf::from("/out/a.gif")).await;

        assert!(matches!(outcome, RenderOutcome::Failure(_)));
        assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
