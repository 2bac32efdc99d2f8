//! API Module
//!
//! Frontend-facing command surface. Upload/camera UI, history screen and the
//! CLI all go through these commands instead of touching `logic` directly.
//!
//! Structure:
//! - commands.rs: Command implementations + shared `AppState`
//! - engine_status.rs: Status DTOs

pub mod commands;
pub mod engine_status;

pub use commands::*;
