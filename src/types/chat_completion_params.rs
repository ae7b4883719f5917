use serde::{Deserialize, Serialize};

use crate::types::ChatMessageParam;

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// Model identifier, e.g. `meta-llama/llama-4-scout-17b-16e-instruct`.
    pub model: String,

    /// Conversation so far, oldest first, ending with the new prompt.
    pub messages: Vec<ChatMessageParam>,

    /// Sampling temperature between 0 and 1.
    pub temperature: f32,

    /// Upper bound on generated tokens.
    pub max_completion_tokens: u32,

    /// Nucleus sampling value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Whether the reply is streamed as server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionParams {
    /// Create a new non-streaming request.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessageParam>,
        temperature: f32,
        max_completion_tokens: u32,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
            max_completion_tokens,
            top_p: None,
            stream: false,
        }
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets whether the reply is streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}
