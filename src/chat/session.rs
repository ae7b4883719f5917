//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which ties the conversation
//! log, the session boundary and the inference client together and runs one
//! streamed turn at a time.

use std::time::{Duration, Instant};

use futures::StreamExt;
use time::OffsetDateTime;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::boundary::SessionBoundary;
use crate::chat::config::{
    ChatConfig, MIN_INTERACTIVE_TOKENS, validate_max_tokens, validate_temperature,
};
use crate::error::{Error, Result};
use crate::export::{DocumentRenderer, ExportFormat, ExportReport, Exporter, PandocRenderer};
use crate::inference::{ChatBackend, InferenceClient, InferenceConfig};
use crate::observability::{TURNS_COMPLETED, TURNS_FAILED, TURNS_INTERRUPTED};
use crate::render::Renderer;
use crate::store::MessageStore;
use crate::types::{ChatSummary, Message, MessagePage, MessageQuery, Usage};

/// How often the interrupt flag is checked while waiting for the next chunk.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The reply finished and the exchange was saved.
    Completed {
        /// The full reply text.
        reply: String,
        /// Token usage reported for the turn.
        usage: Option<Usage>,
        /// Time from request to the end of the stream.
        elapsed: Duration,
    },
    /// The user stopped the reply. Nothing was saved.
    Interrupted {
        /// Text shown before the interrupt.
        partial: String,
    },
}

impl TurnOutcome {
    /// Returns true if the exchange was saved.
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: String,
    /// The sampling temperature.
    pub temperature: f32,
    /// The maximum tokens per response.
    pub max_tokens: u32,
    /// The system prompt, if any.
    pub system_prompt: Option<String>,
    /// Number of history messages sent per request.
    pub history_limit: usize,
    /// Turns that completed and were saved.
    pub completed_turns: u64,
    /// Turns stopped by the user.
    pub interrupted_turns: u64,
    /// Turns that failed.
    pub failed_turns: u64,
    /// Usage summed over completed turns.
    pub total_usage: Usage,
    /// Usage of the last completed turn, if reported.
    pub last_turn_usage: Option<Usage>,
}

/// A chat session over a conversation log and a chat endpoint.
///
/// A prompt and its reply are written to the log together, and only once the
/// reply has finished. Interrupted or failed turns leave the log untouched.
pub struct ChatSession<B, S, R = PandocRenderer> {
    boundary: SessionBoundary<S>,
    inference: InferenceClient<B>,
    exporter: Exporter<R>,
    completed_turns: u64,
    interrupted_turns: u64,
    failed_turns: u64,
    usage_totals: Usage,
    last_turn_usage: Option<Usage>,
}

impl<B: ChatBackend, S: MessageStore> ChatSession<B, S> {
    /// Creates a session from a resolved configuration.
    ///
    /// PDF exports are rendered with pandoc.
    pub fn new(backend: B, store: S, config: &ChatConfig) -> Self {
        Self::with_exporter(
            backend,
            store,
            config.inference_config(),
            Exporter::with_pandoc(config.export_dir.clone()),
        )
    }
}

impl<B: ChatBackend, S: MessageStore, R: DocumentRenderer> ChatSession<B, S, R> {
    /// Creates a session with explicit generation parameters and exporter.
    pub fn with_exporter(
        backend: B,
        store: S,
        inference: InferenceConfig,
        exporter: Exporter<R>,
    ) -> Self {
        Self {
            boundary: SessionBoundary::new(store),
            inference: InferenceClient::new(backend, inference),
            exporter,
            completed_turns: 0,
            interrupted_turns: 0,
            failed_turns: 0,
            usage_totals: Usage::default(),
            last_turn_usage: None,
        }
    }

    /// Sends `prompt` and streams the reply to `renderer`.
    ///
    /// The current conversation is sent as context. The renderer is polled
    /// for interrupts between chunks; an interrupted turn returns
    /// [`TurnOutcome::Interrupted`] and saves nothing. Errors that occur
    /// mid-stream carry the text received before them.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error for an empty prompt, and storage or
    /// inference errors from the turn itself.
    pub async fn ask(&mut self, prompt: &str, renderer: &mut dyn Renderer) -> Result<TurnOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::validation(
                "prompt must not be empty",
                Some("prompt".to_string()),
            ));
        }

        let result = self.run_turn(prompt, renderer).await;
        match &result {
            Ok(TurnOutcome::Completed { usage, elapsed, .. }) => {
                TURNS_COMPLETED.click();
                self.completed_turns += 1;
                self.last_turn_usage = *usage;
                if let Some(usage) = usage {
                    self.usage_totals = self.usage_totals + *usage;
                }
                info!(elapsed_ms = elapsed.as_millis() as u64, "turn completed");
            }
            Ok(TurnOutcome::Interrupted { partial }) => {
                TURNS_INTERRUPTED.click();
                self.interrupted_turns += 1;
                info!(partial_len = partial.len(), "turn interrupted; nothing saved");
            }
            Err(err) => {
                TURNS_FAILED.click();
                self.failed_turns += 1;
                warn!(stage = %err.stage(), error = %err, "turn failed");
            }
        }
        result
    }

    async fn run_turn(&mut self, prompt: &str, renderer: &mut dyn Renderer) -> Result<TurnOutcome> {
        let asked_at = OffsetDateTime::now_utc();
        let started = Instant::now();
        let history = self.boundary.current_session_messages().await?;
        debug!(history = history.len(), "loaded current conversation");

        let mut stream = self.inference.stream_reply(&history, prompt).await?;
        renderer.start_response();
        // A stalled stream must not hold off an interrupt until the next chunk.
        let mut poll = tokio::time::interval(INTERRUPT_POLL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            if renderer.should_interrupt() {
                renderer.print_interrupted();
                return Ok(TurnOutcome::Interrupted {
                    partial: stream.text().to_string(),
                });
            }
            tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(text)) => renderer.print_text(&text),
                    Some(Err(err)) => {
                        renderer.finish_response();
                        return Err(err);
                    }
                    None => break,
                },
                _ = poll.tick() => {}
            }
        }
        renderer.finish_response();
        let elapsed = started.elapsed();

        let reply = stream.into_reply();
        if reply.text.trim().is_empty() {
            return Err(Error::inference_transport(
                "the model returned an empty reply",
                None,
            ));
        }
        self.boundary
            .store()
            .append_exchange(prompt, &reply.text, asked_at)
            .await?;
        Ok(TurnOutcome::Completed {
            reply: reply.text,
            usage: reply.usage,
            elapsed,
        })
    }

    /// Starts a new conversation and returns the separator id.
    ///
    /// Earlier messages stay in the log but are no longer sent as context.
    pub async fn new_conversation(&mut self) -> Result<i64> {
        self.boundary.start_new_conversation().await
    }

    /// Deletes every message in the log and returns how many were removed.
    pub async fn purge(&mut self) -> Result<u64> {
        self.boundary.clear().await
    }

    /// Returns the current conversation, oldest first.
    ///
    /// With `limit`, only the most recent `limit` messages are returned.
    pub async fn history(&mut self, limit: Option<usize>) -> Result<Vec<Message>> {
        let mut messages = self.boundary.current_session_messages().await?;
        if let Some(limit) = limit {
            let skip = messages.len().saturating_sub(limit);
            messages.drain(..skip);
        }
        Ok(messages)
    }

    /// Lists messages of the log matching `query`.
    pub async fn query(&self, query: &MessageQuery) -> Result<MessagePage> {
        self.boundary.store().query(query).await
    }

    /// Computes statistics over the whole log.
    pub async fn summary(&self) -> Result<ChatSummary> {
        self.boundary.store().summary().await
    }

    /// Exports the current conversation, or the whole log with `all`.
    ///
    /// `limit` restricts the export to the most recent messages.
    pub async fn export(
        &self,
        format: ExportFormat,
        name: Option<&str>,
        all: bool,
        limit: Option<usize>,
    ) -> Result<ExportReport> {
        let query = if all {
            MessageQuery::everything()
        } else {
            MessageQuery::new()
        }
        .with_limit(limit);
        let page = self.boundary.store().query(&query).await?;
        self.exporter.export(&page.messages, format, name).await
    }

    /// Returns the generation parameters.
    pub fn config(&self) -> &InferenceConfig {
        self.inference.config()
    }

    /// Returns the exporter.
    pub fn exporter(&self) -> &Exporter<R> {
        &self.exporter
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        self.boundary.store()
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.inference.config_mut().model = model.into();
    }

    /// Sets the sampling temperature.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.inference.config_mut().temperature = validate_temperature(temperature)?;
        Ok(())
    }

    /// Sets the maximum tokens per response, within the interactive range.
    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<()> {
        self.inference.config_mut().max_tokens =
            validate_max_tokens(max_tokens, MIN_INTERACTIVE_TOKENS)?;
        Ok(())
    }

    /// Sets or clears the system prompt.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.inference.config_mut().system_prompt = prompt;
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let config = self.inference.config();
        SessionStats {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            history_limit: config.history_limit,
            completed_turns: self.completed_turns,
            interrupted_turns: self.interrupted_turns,
            failed_turns: self.failed_turns,
            total_usage: self.usage_totals,
            last_turn_usage: self.last_turn_usage,
        }
    }
}
