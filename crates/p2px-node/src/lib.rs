//! Trade and escrow coordination node.
//!
//! Wires the desk, deadline monitor and escrow retry sweep over in-memory
//! collaborators and an HTTP custody client.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
