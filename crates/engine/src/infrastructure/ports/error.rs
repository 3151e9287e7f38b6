//! Error types for port operations.

/// Upstream game-data lookup errors.
///
/// A missing record is not an error: lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum GameDataError {
    /// Request could not be sent or the connection failed.
    #[error("Game data request to {resource} failed: {message}")]
    Request {
        resource: &'static str,
        message: String,
    },

    /// Upstream answered with an unexpected status.
    #[error("Game data service returned {status} for {resource}")]
    Status { resource: &'static str, status: u16 },

    /// Response body did not match the expected record shape.
    #[error("Invalid game data for {resource}: {message}")]
    InvalidResponse {
        resource: &'static str,
        message: String,
    },
}

impl GameDataError {
    pub fn request(resource: &'static str, message: impl ToString) -> Self {
        Self::Request {
            resource,
            message: message.to_string(),
        }
    }

    pub fn invalid(resource: &'static str, message: impl ToString) -> Self {
        Self::InvalidResponse {
            resource,
            message: message.to_string(),
        }
    }
}

/// Rendering runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The browser process could not be started.
    #[error("Failed to launch renderer: {0}")]
    Launch(String),

    /// DevTools protocol transport or command failure.
    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    /// Setup did not finish in time.
    #[error("Renderer did not become ready within {0:?}")]
    StartupTimeout(std::time::Duration),
}

impl RenderError {
    pub fn launch(message: impl ToString) -> Self {
        Self::Launch(message.to_string())
    }

    pub fn protocol(message: impl ToString) -> Self {
        Self::Protocol(message.to_string())
    }
}

/// Interactive channel errors (sending, editing, acknowledging).
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("Interaction transport failed: {0}")]
    Transport(String),

    /// The view was never presented, so there is nothing to wait on.
    #[error("No message has been presented yet")]
    NotPresented,
}

impl InteractionError {
    pub fn transport(message: impl ToString) -> Self {
        Self::Transport(message.to_string())
    }
}
