//! CLI module for the `shopassist` binary
//!
//! - Command line argument parsing
//! - Command handlers (serve, ask, config)
//! - Output formatting

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::*;
pub use handlers::*;
pub use output::*;
