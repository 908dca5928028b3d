//! Core traits, settings, and module registry for the bookshelf service.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{IndexSpec, InitCtx, Module};
pub use registry::ModuleRegistry;
pub use settings::Settings;
