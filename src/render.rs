//! Terminal output for chat turns.
//!
//! This module provides the renderer trait used while streaming a reply and a
//! plain-text implementation with optional ANSI styling.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::Error;
use crate::types::{Message, Role, Usage};
use crate::utils::time::display_utc;

/// ANSI escape code for dim text (timestamps, usage).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (headings).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for blue text (user label).
const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for green text (assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (interruptions).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (errors).
const ANSI_RED: &str = "\x1b[31m";

/// Formats an error with the stage that produced it.
pub fn describe_error(error: &Error) -> String {
    format!("[{}] {error}", error.stage())
}

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Called before the first chunk of a reply.
    fn start_response(&mut self) {}

    /// Print a chunk of response text.
    ///
    /// This is called incrementally as tokens are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print one stored message, e.g. when listing history.
    fn print_message(&mut self, message: &Message) {
        self.print_info(&format!(
            "{} - {}:\n{}\n",
            display_utc(message.created_at),
            message.role.label(),
            message.content
        ));
    }

    /// Print token usage and generation time of a finished reply.
    fn print_usage(&mut self, usage: Option<Usage>, elapsed: Duration) {
        let mut line = format!("Generated in {:.2}s", elapsed.as_secs_f64());
        if let Some(usage) = usage {
            line.push_str(&format!(
                " | tokens: {} prompt, {} completion, {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            ));
        }
        self.print_info(&line);
    }

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Replies go to stdout; errors go to stderr.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Creates a new PlainTextRenderer with specified color and interrupt flag.
    pub fn with_color_and_interrupt(use_color: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self::with_color(use_color).with_interrupt(interrupted)
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        print!("{text}");
        self.line_start = text.ends_with('\n');
        self.flush();
    }

    fn ensure_line_start(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self) {
        self.ensure_line_start();
        let label = self.styled(ANSI_GREEN, "Assistant:");
        self.write(&format!("{label} "));
    }

    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn print_error(&mut self, error: &str) {
        self.ensure_line_start();
        eprintln!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_info(&mut self, info: &str) {
        self.ensure_line_start();
        println!("{info}");
        self.line_start = true;
        self.flush();
    }

    fn print_message(&mut self, message: &Message) {
        self.ensure_line_start();
        let color = match message.role {
            Role::User => ANSI_BLUE,
            Role::Assistant => ANSI_GREEN,
            Role::Separator => ANSI_BOLD,
        };
        let header = format!(
            "{} - {}:",
            self.styled(ANSI_DIM, &display_utc(message.created_at)),
            self.styled(color, message.role.label())
        );
        println!("{header}\n{}\n", message.content);
        self.line_start = true;
        self.flush();
    }

    fn print_usage(&mut self, usage: Option<Usage>, elapsed: Duration) {
        let mut line = format!("Generated in {:.2}s", elapsed.as_secs_f64());
        if let Some(usage) = usage {
            line.push_str(&format!(
                " | tokens: {} prompt, {} completion, {} total",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            ));
        }
        let line = self.styled(ANSI_DIM, &line);
        self.print_info(&line);
    }

    fn finish_response(&mut self) {
        self.write("\n");
    }

    fn print_interrupted(&mut self) {
        self.ensure_line_start();
        let message = self.styled(ANSI_YELLOW, "[interrupted; reply not saved]");
        self.write(&format!("{message}\n"));
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
