//! Inference client: request construction, context hygiene and streamed replies.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::observability::{STREAM_CHUNKS, STREAM_DURATION, STREAM_ERRORS, STREAM_TTFB};
use crate::types::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionParams, ChatMessageParam, Message, Usage,
};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Upper bound on generated tokens when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Number of most recent history messages sent with each prompt.
pub const DEFAULT_HISTORY_LIMIT: usize = 40;

/// Persona prepended to every request unless overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the CEO of a multinational company and an expert \
in Python. Your mission is to mentor a junior developer with professional guidance: software \
architecture, SOLID principles, good practices, Clean Architecture, CI/CD and testing. Answer \
clearly, professionally and honestly. If you do not know something, say explicitly \"I have no \
information about that\" and never make up an answer. Include real code examples, references to \
official documentation, and modern Python style (PEP 8, type hints, docstrings).";

/// A pinned stream of completion chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// A chat completions endpoint.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `params` and returns the streamed chunks of the reply.
    async fn stream_chat(&self, params: ChatCompletionParams) -> Result<ChunkStream>;

    /// Sends `params` and returns the whole reply at once.
    async fn complete_chat(&self, params: ChatCompletionParams) -> Result<ChatCompletion>;
}

#[async_trait::async_trait]
impl<B: ChatBackend + ?Sized> ChatBackend for Arc<B> {
    async fn stream_chat(&self, params: ChatCompletionParams) -> Result<ChunkStream> {
        (**self).stream_chat(params).await
    }

    async fn complete_chat(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
        (**self).complete_chat(params).await
    }
}

/// Generation parameters passed explicitly to the [`InferenceClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature between 0 and 1.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// System prompt prepended to every request.
    pub system_prompt: Option<String>,
    /// Number of most recent history messages to send.
    pub history_limit: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl InferenceConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set or remove the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// Set the history limit.
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }
}

/// A complete reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// The generated text.
    pub text: String,
    /// Token usage, when reported.
    pub usage: Option<Usage>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Sends conversation history plus a new prompt to a [`ChatBackend`].
#[derive(Debug)]
pub struct InferenceClient<B> {
    backend: B,
    config: InferenceConfig,
}

impl<B: ChatBackend> InferenceClient<B> {
    /// Creates a client over `backend` using `config`.
    pub fn new(backend: B, config: InferenceConfig) -> Self {
        Self { backend, config }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the generation parameters.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Returns the generation parameters for modification.
    pub fn config_mut(&mut self) -> &mut InferenceConfig {
        &mut self.config
    }

    /// Builds the request body for `prompt` following `history`.
    ///
    /// Separator rows never reach the endpoint. If one is present anyway,
    /// everything up to and including the latest separator is dropped, then
    /// the history is cut to the most recent `history_limit` messages.
    pub fn build_params(&self, history: &[Message], prompt: &str) -> ChatCompletionParams {
        let start = history
            .iter()
            .rposition(Message::is_separator)
            .map_or(0, |i| i + 1);
        let turns: Vec<ChatMessageParam> = history[start..]
            .iter()
            .filter_map(Message::to_param)
            .collect();
        let skip = turns.len().saturating_sub(self.config.history_limit);

        let mut messages = Vec::with_capacity(turns.len() - skip + 2);
        if let Some(system) = &self.config.system_prompt {
            messages.push(ChatMessageParam::system(system.clone()));
        }
        messages.extend(turns.into_iter().skip(skip));
        messages.push(ChatMessageParam::user(prompt));

        ChatCompletionParams::new(
            self.config.model.clone(),
            messages,
            self.config.temperature,
            self.config.max_tokens,
        )
        .with_top_p(1.0)
    }

    /// Streams the reply to `prompt`.
    pub async fn stream_reply(&self, history: &[Message], prompt: &str) -> Result<ReplyStream> {
        let params = self.build_params(history, prompt).with_stream(true);
        debug!(
            model = %params.model,
            messages = params.messages.len(),
            "requesting streamed reply"
        );
        let chunks = self.backend.stream_chat(params).await?;
        Ok(ReplyStream::new(chunks))
    }

    /// Requests the whole reply to `prompt` without streaming.
    pub async fn reply(&self, history: &[Message], prompt: &str) -> Result<Reply> {
        let params = self.build_params(history, prompt).with_stream(false);
        debug!(
            model = %params.model,
            messages = params.messages.len(),
            "requesting reply"
        );
        let completion = self.backend.complete_chat(params).await?;
        Ok(Reply {
            text: completion.text().to_string(),
            usage: completion.usage,
            finish_reason: completion
                .choices
                .first()
                .and_then(|choice| choice.finish_reason.clone()),
        })
    }
}

/// The text chunks of a reply, in arrival order.
///
/// Concatenating every yielded chunk gives [`ReplyStream::text`]. The stream
/// ends after the first error; the error carries the text delivered before
/// it. A stream that closes before the model reports a finish reason ends
/// with an error rather than passing for a complete reply.
pub struct ReplyStream {
    chunks: ChunkStream,
    text: String,
    usage: Option<Usage>,
    finish_reason: Option<String>,
    started: Instant,
    received_first: bool,
    done: bool,
}

impl ReplyStream {
    /// Wraps a stream of completion chunks.
    pub fn new(chunks: ChunkStream) -> Self {
        Self {
            chunks,
            text: String::new(),
            usage: None,
            finish_reason: None,
            started: Instant::now(),
            received_first: false,
            done: false,
        }
    }

    /// Returns the text received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the usage reported by the endpoint, if any.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// Returns the finish reason, once received.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    /// Returns true once the model reported that the reply is finished.
    pub fn is_complete(&self) -> bool {
        self.finish_reason.is_some()
    }

    /// Drains the stream into a [`Reply`].
    pub async fn collect_reply(mut self) -> Result<Reply> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }
        Ok(self.into_reply())
    }

    /// Converts what was received into a [`Reply`].
    pub fn into_reply(self) -> Reply {
        Reply {
            text: self.text,
            usage: self.usage,
            finish_reason: self.finish_reason,
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        self.done = true;
        STREAM_ERRORS.click();
        STREAM_DURATION.add(self.started.elapsed().as_secs_f64());
        err.with_partial(self.text.clone())
    }
}

impl std::fmt::Debug for ReplyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyStream")
            .field("text", &self.text)
            .field("usage", &self.usage)
            .field("finish_reason", &self.finish_reason)
            .field("done", &self.done)
            .finish()
    }
}

impl Stream for ReplyStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        loop {
            match this.chunks.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(chunk))) => {
                    STREAM_CHUNKS.click();
                    if !this.received_first {
                        this.received_first = true;
                        STREAM_TTFB.add(this.started.elapsed().as_secs_f64());
                    }
                    if let Some(usage) = chunk.usage() {
                        this.usage = Some(usage);
                    }
                    if let Some(reason) = chunk.finish_reason() {
                        this.finish_reason = Some(reason.to_string());
                    }
                    if let Some(text) = chunk.content() {
                        this.text.push_str(text);
                        return Poll::Ready(Some(Ok(text.to_string())));
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    return Poll::Ready(Some(Err(this.fail(err))));
                }
                Poll::Ready(None) if this.finish_reason.is_none() => {
                    let err = Error::inference_transport(
                        "stream ended before the model finished its reply",
                        None,
                    );
                    return Poll::Ready(Some(Err(this.fail(err))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    STREAM_DURATION.add(this.started.elapsed().as_secs_f64());
                    return Poll::Ready(None);
                }
            }
        }
    }
}
