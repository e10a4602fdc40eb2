//! CLI command handlers
//!
//! - serve: HTTP server
//! - ask: one-shot recommendation
//! - info: configuration display

pub mod ask;
pub mod info;
pub mod serve;

pub use ask::*;
pub use info::*;
pub use serve::*;
