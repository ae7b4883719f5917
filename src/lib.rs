// Public modules
pub mod boundary;
pub mod chat;
pub mod client;
pub mod error;
pub mod export;
pub mod inference;
pub mod observability;
pub mod render;
pub mod sse;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use boundary::SessionBoundary;
pub use client::GroqClient;
pub use error::{Error, Result, Stage};
pub use export::{ExportFormat, Exporter};
pub use inference::{ChatBackend, InferenceClient, InferenceConfig, Reply, ReplyStream};
pub use observability::{init_logging, register_biometrics};
pub use render::{PlainTextRenderer, Renderer, describe_error};
pub use store::{MessageStore, SqliteStore};
pub use types::*;
