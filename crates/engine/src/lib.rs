//! Hellabot engine library.
//!
//! ## Structure
//!
//! - `use_cases/` - Spine rendering, interactive selections, autocomplete
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Discord commands, embeds, and component interactions
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
