//! Configuration models and layered config loading.
//!
//! This crate owns the Moneta config schema, validation, and the small
//! layer-merging loader used by the TUI binary.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config result type.
pub use loader::LayeredConfig;
/// Configuration schema models.
pub use model::*;
