//! Testability ports for injecting randomness.

use uuid::Uuid;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// `len` random lowercase ASCII alphanumeric characters.
    fn alphanumeric(&self, len: usize) -> String;
    fn gen_uuid(&self) -> Uuid;
}
