//! Interactive selection: one bounded loop shared by every command.
//!
//! A [`SelectionController`] shows a view built from a state, waits for the
//! user to pick a control, renders the chosen state, and repeats until the
//! interaction window lapses or something fails. The final view is always
//! re-shown with every control disabled, exactly once.

use std::time::Duration;

use async_trait::async_trait;
use hellabot_domain::{ChoiceTable, Control, ControlLayout};
use tokio::time::Instant;

use crate::infrastructure::ports::InteractionError;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// Rendering a state failed. The message is safe to show to users.
    #[error("{0}")]
    Render(String),

    #[error("Interaction failed: {0}")]
    Interaction(#[from] InteractionError),

    /// The window lapsed or the view was frozen.
    #[error("Selection is closed")]
    Closed,
}

impl SelectionError {
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}

/// Everything the channel needs to draw one view.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView<B> {
    pub body: B,
    /// Text shown alongside the body, e.g. an error after a failed render.
    pub notice: Option<String>,
    pub controls: Vec<Control>,
    pub layout: ControlLayout,
}

impl<B> SelectionView<B> {
    pub fn is_frozen(&self) -> bool {
        self.controls.iter().all(|c| c.disabled)
    }
}

/// Where the view lives and where choices come from.
#[async_trait]
pub trait InteractionChannel<B: Send + Sync + 'static>: Send {
    /// Send the first view.
    async fn present(&mut self, view: &SelectionView<B>) -> Result<(), InteractionError>;

    /// Next chosen token, or `None` once `window` has passed without one.
    async fn await_choice(&mut self, window: Duration)
        -> Result<Option<String>, InteractionError>;

    /// Acknowledge the last choice, optionally showing a pending notice.
    async fn acknowledge(&mut self, notice: Option<&str>) -> Result<(), InteractionError>;

    /// Replace the view after a choice.
    async fn show(&mut self, view: &SelectionView<B>) -> Result<(), InteractionError>;

    /// Replace the view one last time.
    async fn freeze(&mut self, view: &SelectionView<B>) -> Result<(), InteractionError>;
}

/// Turns a state into a view body.
#[async_trait]
pub trait StateRenderer<S: Send + Sync + 'static, B>: Send + Sync {
    async fn render(&self, state: &S) -> Result<B, SelectionError>;

    /// Shown while `state` renders. Slow renderers should say so.
    fn pending_notice(&self, _state: &S) -> Option<String> {
        None
    }
}

/// Mutable part of a running selection.
#[derive(Debug, Clone)]
pub struct InteractionState<S> {
    current: S,
    deadline: Instant,
    controls_enabled: bool,
}

impl<S> InteractionState<S> {
    pub fn new(current: S, window: Duration) -> Self {
        Self {
            current,
            deadline: Instant::now() + window,
            controls_enabled: true,
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Time left in the window.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_open_at(&self, at: Instant) -> bool {
        self.controls_enabled && at < self.deadline
    }

    /// Move to `next` for a choice made at `chosen_at`, restarting the window.
    pub fn accept(&mut self, next: S, chosen_at: Instant, window: Duration) -> Result<(), SelectionError> {
        if !self.is_open_at(chosen_at) {
            return Err(SelectionError::Closed);
        }
        self.current = next;
        self.deadline = Instant::now() + window;
        Ok(())
    }

    /// Disable every control. Returns `false` if already frozen.
    pub fn freeze(&mut self) -> bool {
        std::mem::replace(&mut self.controls_enabled, false)
    }
}

/// Why a selection stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    TimedOut,
    ChannelFailed(String),
    RenderFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary<S> {
    pub final_state: S,
    pub transitions: usize,
    pub reason: EndReason,
}

pub struct SelectionController<S> {
    table: ChoiceTable<S>,
    window: Duration,
    layout: ControlLayout,
}

impl<S> SelectionController<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(table: ChoiceTable<S>, window: Duration, layout: ControlLayout) -> Self {
        Self {
            table,
            window,
            layout,
        }
    }

    fn view<B>(&self, body: B, current: &S, enabled: bool, notice: Option<String>) -> SelectionView<B> {
        SelectionView {
            body,
            notice,
            controls: self.table.controls(current, enabled),
            layout: self.layout.clone(),
        }
    }

    /// Run the selection loop from `initial`.
    ///
    /// # Errors
    ///
    /// Fails only if the initial view cannot be rendered or presented.
    /// Anything that goes wrong later ends the loop and is reported in the
    /// summary.
    pub async fn run<B, C, R>(
        &self,
        channel: &mut C,
        renderer: &R,
        initial: S,
    ) -> Result<SelectionSummary<S>, SelectionError>
    where
        B: Clone + Send + Sync + 'static,
        C: InteractionChannel<B> + ?Sized,
        R: StateRenderer<S, B> + ?Sized,
    {
        let body = renderer.render(&initial).await?;
        channel
            .present(&self.view(body.clone(), &initial, true, None))
            .await?;

        let mut state = InteractionState::new(initial, self.window);
        let mut last_body = body;
        let mut transitions = 0;

        let reason = loop {
            let token = match channel.await_choice(state.remaining()).await {
                Ok(Some(token)) => token,
                Ok(None) => break EndReason::TimedOut,
                Err(e) => break EndReason::ChannelFailed(e.to_string()),
            };
            let chosen_at = Instant::now();

            let Some(next) = self.table.resolve(&token).cloned() else {
                tracing::debug!(token = %token, "Ignoring unknown selection token");
                if let Err(e) = channel.acknowledge(None).await {
                    break EndReason::ChannelFailed(e.to_string());
                }
                continue;
            };

            if !state.is_open_at(chosen_at) {
                break EndReason::TimedOut;
            }
            let notice = renderer.pending_notice(&next);
            if let Err(e) = channel.acknowledge(notice.as_deref()).await {
                break EndReason::ChannelFailed(e.to_string());
            }

            let body = match renderer.render(&next).await {
                Ok(body) => body,
                Err(e) => break EndReason::RenderFailed(e.to_string()),
            };
            if state.accept(next, chosen_at, self.window).is_err() {
                break EndReason::TimedOut;
            }
            transitions += 1;

            let view = self.view(body.clone(), state.current(), true, None);
            last_body = body;
            if let Err(e) = channel.show(&view).await {
                break EndReason::ChannelFailed(e.to_string());
            }
        };

        if state.freeze() {
            let notice = match &reason {
                EndReason::RenderFailed(message) => Some(message.clone()),
                _ => None,
            };
            let view = self.view(last_body, state.current(), false, notice);
            if let Err(e) = channel.freeze(&view).await {
                tracing::warn!(error = %e, "Failed to freeze selection view");
            }
        }

        match &reason {
            EndReason::TimedOut => tracing::debug!(transitions, "Selection window closed"),
            EndReason::ChannelFailed(e) => {
                tracing::warn!(error = %e, transitions, "Selection channel failed")
            }
            EndReason::RenderFailed(e) => {
                tracing::warn!(error = %e, transitions, "Selection render failed")
            }
        }

        Ok(SelectionSummary {
            final_state: state.current().clone(),
            transitions,
            reason,
        })
    }
}
