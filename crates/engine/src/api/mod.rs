//! API layer - Discord entry points.

pub mod discord;
