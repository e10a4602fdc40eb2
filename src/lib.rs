pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod secrets;


pub use config::AppConfig;
pub use errors::*;
