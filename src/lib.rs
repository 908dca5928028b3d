//! Bookshelf application library
//!
//! Resource modules, their field rules, and the bootstrap that wires them to
//! a record store and the HTTP server.

pub mod app;
pub mod modules;
pub mod schema;

pub use app::{build_registry, connect_store, run, shutdown_signal};
