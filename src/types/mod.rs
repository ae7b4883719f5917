// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod chat_completion_params;
pub mod chat_message_param;
pub mod chat_summary;
pub mod message;
pub mod message_query;
pub mod role;
pub mod usage;

// Re-exports
pub use chat_completion::{ChatCompletion, CompletionChoice, CompletionMessage};
pub use chat_completion_chunk::{ChatCompletionChunk, ChunkChoice, ChunkDelta, GroqExtension};
pub use chat_completion_params::ChatCompletionParams;
pub use chat_message_param::{ChatMessageParam, ChatRole};
pub use chat_summary::ChatSummary;
pub use message::Message;
pub use message_query::{MessagePage, MessageQuery};
pub use role::Role;
pub use usage::Usage;
