//! Chat application module for conversations with Groq-hosted models.
//!
//! This module provides the pieces shared by the `groqchat` and
//! `groqchat-chat` binaries:
//!
//! - Streaming turns whose prompt and reply are saved together
//! - Conversation boundaries inside one persistent log
//! - Slash commands for session control
//! - Configurable model, system prompt, and parameters
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: turn orchestration over the store and the endpoint
//! - [`commands`]: Slash command parsing

pub mod commands;
pub mod config;
pub mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, SessionStats, TurnOutcome};
