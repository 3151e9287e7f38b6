//! Use cases - User story orchestration.
//!
//! Simple record lookups go straight through `GameDataPort`; the modules here
//! hold the flows with real logic of their own.

pub mod autocomplete;
pub mod selection;
pub mod spine;

pub use autocomplete::Autocomplete;
pub use selection::SelectionController;
pub use spine::SpineUseCases;
