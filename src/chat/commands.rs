//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use crate::chat::config::MIN_INTERACTIVE_TOKENS;
use crate::export::ExportFormat;
use crate::inference::DEFAULT_MAX_TOKENS;

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new conversation; earlier messages stay in the log.
    NewConversation,

    /// Delete every message in the log.
    Purge,

    /// Change the model.
    Model(String),

    /// Set or clear the system prompt.
    /// `None` clears the current system prompt.
    System(Option<String>),

    /// Set the maximum tokens per response.
    MaxTokens(u32),

    /// Set the sampling temperature.
    Temperature(f32),

    /// Show the most recent messages of the current conversation.
    History(Option<usize>),

    /// Export the current conversation.
    Export {
        /// Output format.
        format: ExportFormat,
        /// File name; a timestamped name is used when absent.
        name: Option<String>,
    },

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (turns, tokens, log totals).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use groqchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/temp 0.5").is_some());
/// assert!(parse_command("How do I write a decorator?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "clear" => ChatCommand::NewConversation,
        "purge" => ChatCommand::Purge,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "system" => ChatCommand::System(argument.map(|s| s.to_string())),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "info" | "config" => ChatCommand::ShowConfig,
        "tokens" | "max_tokens" => parse_tokens(argument),
        "temp" | "temperature" => match argument {
            Some(arg) => match parse_f32_in_range(arg, 0.0, 1.0) {
                Ok(value) => ChatCommand::Temperature(value),
                Err(err) => ChatCommand::Invalid(format!("/temp {err}")),
            },
            None => ChatCommand::Invalid("usage: /temp [0.0-1.0]".to_string()),
        },
        "history" => match argument {
            None => ChatCommand::History(None),
            Some(arg) => match arg.parse::<usize>() {
                Ok(count) if count > 0 => ChatCommand::History(Some(count)),
                _ => ChatCommand::Invalid("/history expects a positive count".to_string()),
            },
        },
        "export" => parse_export(argument),
        _ => ChatCommand::Invalid(format!(
            "Unknown command: /{command} (type /help for the list)"
        )),
    };

    Some(result)
}

fn parse_tokens(argument: Option<&str>) -> ChatCommand {
    let usage = format!("usage: /tokens [{MIN_INTERACTIVE_TOKENS}-{DEFAULT_MAX_TOKENS}]");
    let Some(arg) = argument else {
        return ChatCommand::Invalid(usage);
    };
    match arg.parse::<u32>() {
        Ok(value) if (MIN_INTERACTIVE_TOKENS..=DEFAULT_MAX_TOKENS).contains(&value) => {
            ChatCommand::MaxTokens(value)
        }
        Ok(_) => ChatCommand::Invalid(format!(
            "/tokens expects a value between {MIN_INTERACTIVE_TOKENS} and {DEFAULT_MAX_TOKENS}"
        )),
        Err(_) => ChatCommand::Invalid(usage),
    }
}

fn parse_export(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("usage: /export markdown|pdf [file]".to_string());
    };
    let mut parts = arg.splitn(2, ' ');
    let format = parts.next().unwrap_or_default();
    let name = parts
        .next()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    match format.parse::<ExportFormat>() {
        Ok(format) => ChatCommand::Export { format, name },
        Err(_) => ChatCommand::Invalid(format!(
            "Unsupported export format '{format}'; use markdown or pdf"
        )),
    }
}

fn parse_f32_in_range(value: &str, min: f32, max: f32) -> Result<f32, String> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| format!("expects a value between {min} and {max}"))?;
    if parsed.is_finite() && parsed >= min && parsed <= max {
        Ok(parsed)
    } else {
        Err(format!("expects a value between {min} and {max}"))
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new conversation (alias: /clear)
  /purge                 Delete every stored message
  /history [n]           Show the current conversation (last n messages)
  /export markdown|pdf [file]
                         Export the current conversation
  /model <name>          Change the model (e.g., /model llama-3.3-70b-versatile)
  /system [prompt]       Set system prompt (no argument removes it)
  /temp <v>              Set temperature 0.0-1.0
  /tokens <n>            Set maximum response tokens (100-8192)
  /stats                 Show session statistics
  /info                  Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl+C while a reply is streaming to stop it; the interrupted
exchange is not saved."#
}
