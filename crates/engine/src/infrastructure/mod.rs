//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies, plus the
//! concrete filesystem and configuration helpers the use cases depend on.

pub mod artifacts;
pub mod chromium;
pub mod config;
pub mod gamedata;
pub mod overrides;
pub mod ports;
pub mod random;
pub mod skeleton;
