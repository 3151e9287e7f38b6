//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Game data lookups (could swap the HTTP API for a local dump)
//! - Rendering runtime (could swap headless Chromium for another renderer)
//! - Random (for testing)

mod error;
mod external;
mod testing;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{GameDataError, InteractionError, RenderError};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    CatalogEntry, CatalogKind, GameDataPort, RenderRequest, RenderRuntime, RenderSession,
    RenderSignal, TAG_UPGRADABLE,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::MockGameDataPort;

#[cfg(test)]
pub use testing::MockRandomPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::RandomPort;
