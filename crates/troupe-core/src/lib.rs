//! Troupe Core — transport-agnostic domain logic for the troupe platform.
//!
//! Troupe designs a team of specialist agents from a natural-language
//! use-case description, then runs supervisor-routed multi-turn
//! conversations with that team. This crate contains the core business
//! logic: models, stores, the workflow engine, and the architect. It has
//! **no HTTP framework dependency** by default, making it suitable for use
//! in:
//!
//! - HTTP servers (via `troupe-server`)
//! - CLI tools (via `troupe-cli`)
//!
//! # Feature Flags
//!
//! - `axum` — Enables `IntoResponse` impl on `ServerError` for use in axum
//!   handlers.

pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod workflow;

// Convenience re-exports
pub use db::Database;
pub use error::ServerError;
pub use state::{AppState, AppStateInner};
