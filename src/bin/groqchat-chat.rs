//! Interactive chat with Groq-hosted models.
//!
//! This binary provides a streaming REPL. Every finished exchange is saved to
//! the conversation log; each launch starts a new conversation.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! groqchat-chat
//!
//! # Specify a model
//! groqchat-chat --model llama-3.3-70b-versatile
//!
//! # Use another conversation log
//! groqchat-chat --database ~/notes/chat.db
//!
//! # Disable colors (useful for piping output)
//! groqchat-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new conversation
//! - `/export markdown|pdf [file]` - Export the current conversation
//! - `/temp <v>`, `/tokens <n>` - Adjust generation parameters
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use groqchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, TurnOutcome,
    help_text, parse_command,
};
use groqchat::{GroqClient, SqliteStore, describe_error, init_logging};

type Session = ChatSession<GroqClient, SqliteStore>;

/// Main entry point for the groqchat-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("groqchat-chat [OPTIONS]");
    let config = match ChatConfig::resolve(args, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", describe_error(&err));
            std::process::exit(2);
        }
    };
    init_logging(config.verbose)?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut renderer =
        PlainTextRenderer::with_color_and_interrupt(config.use_color, interrupted.clone());

    let mut session = match open_session(&config).await {
        Ok(session) => session,
        Err(err) => {
            renderer.print_error(&describe_error(&err));
            std::process::exit(1);
        }
    };
    if let Err(err) = session.new_conversation().await {
        renderer.print_error(&describe_error(&err));
    }

    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut rl = DefaultEditor::new()?;

    println!("Groq Chat (model: {})", session.config().model);
    println!("New conversation started. Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if !run_command(cmd, &mut session, &mut renderer).await {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                match session.ask(line, &mut renderer).await {
                    Ok(TurnOutcome::Completed { usage, elapsed, .. }) => {
                        if config.show_usage {
                            renderer.print_usage(usage, elapsed);
                        }
                    }
                    Ok(TurnOutcome::Interrupted { .. }) => {}
                    Err(err) => renderer.print_error(&describe_error(&err)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn open_session(config: &ChatConfig) -> groqchat::Result<Session> {
    let client = config.client()?;
    let store = SqliteStore::connect(&config.database_url).await?;
    Ok(ChatSession::new(client, store, config))
}

/// Runs one slash command. Returns false when the loop should end.
async fn run_command(
    cmd: ChatCommand,
    session: &mut Session,
    renderer: &mut PlainTextRenderer,
) -> bool {
    match cmd {
        ChatCommand::Quit => return false,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {}", line);
            }
        }
        ChatCommand::NewConversation => match session.new_conversation().await {
            Ok(_) => renderer.print_info("New conversation started."),
            Err(err) => renderer.print_error(&describe_error(&err)),
        },
        ChatCommand::Purge => match session.purge().await {
            Ok(removed) => renderer.print_info(&format!("Deleted {removed} messages.")),
            Err(err) => renderer.print_error(&describe_error(&err)),
        },
        ChatCommand::Model(model) => {
            renderer.print_info(&format!("Model changed to: {}", model));
            session.set_model(model);
        }
        ChatCommand::System(prompt) => {
            match &prompt {
                Some(p) => renderer.print_info(&format!("System prompt set to: {}", p)),
                None => renderer.print_info("System prompt cleared."),
            }
            session.set_system_prompt(prompt);
        }
        ChatCommand::MaxTokens(value) => match session.set_max_tokens(value) {
            Ok(()) => renderer.print_info(&format!("max_tokens set to {value}")),
            Err(err) => renderer.print_error(&describe_error(&err)),
        },
        ChatCommand::Temperature(value) => match session.set_temperature(value) {
            Ok(()) => renderer.print_info(&format!("temperature set to {:.2}", value)),
            Err(err) => renderer.print_error(&describe_error(&err)),
        },
        ChatCommand::History(limit) => match session.history(limit).await {
            Ok(messages) if messages.is_empty() => {
                renderer.print_info("No messages in the current conversation.")
            }
            Ok(messages) => {
                for message in &messages {
                    renderer.print_message(message);
                }
            }
            Err(err) => renderer.print_error(&describe_error(&err)),
        },
        ChatCommand::Export { format, name } => {
            match session.export(format, name.as_deref(), false, None).await {
                Ok(report) => renderer.print_info(&format!(
                    "Exported {} messages to {}",
                    report.messages,
                    report.path.display()
                )),
                Err(err) => renderer.print_error(&describe_error(&err)),
            }
        }
        ChatCommand::Stats => print_stats(session).await,
        ChatCommand::ShowConfig => print_config(session),
        ChatCommand::Invalid(message) => {
            renderer.print_error(&message);
        }
    }
    true
}

async fn print_stats(session: &Session) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!(
        "      Turns: {} completed, {} interrupted, {} failed",
        stats.completed_turns, stats.interrupted_turns, stats.failed_turns
    );
    println!(
        "      Total tokens: {} prompt / {} completion",
        stats.total_usage.prompt_tokens, stats.total_usage.completion_tokens
    );
    if let Some(usage) = stats.last_turn_usage {
        println!(
            "      Last turn tokens: {} prompt / {} completion",
            usage.prompt_tokens, usage.completion_tokens
        );
    }
    match session.summary().await {
        Ok(summary) => {
            println!(
                "      Log: {} messages ({} user, {} assistant) in {} conversations",
                summary.total_messages,
                summary.user_messages,
                summary.assistant_messages,
                summary.conversations
            );
            println!("      Average message length: {:.0} chars", summary.average_length);
        }
        Err(err) => eprintln!("      Log: {}", describe_error(&err)),
    }
}

fn print_config(session: &Session) {
    let stats = session.stats();
    println!("    Current Configuration:");
    println!("      Model: {}", stats.model);
    println!("      Max tokens: {}", stats.max_tokens);
    println!("      Temperature: {:.2}", stats.temperature);
    println!("      History: {} messages", stats.history_limit);
    if let Some(prompt) = stats.system_prompt.as_deref() {
        println!("      System prompt: {}", prompt);
    } else {
        println!("      System prompt: (none)");
    }
    println!("      Export directory: {}", session.exporter().dir().display());
}
