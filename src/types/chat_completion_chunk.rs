use serde::{Deserialize, Serialize};

use crate::types::Usage;

/// The incremental part of a streamed choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkDelta {
    /// Present on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Newly generated text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streamed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Index of the choice; the client always requests a single choice.
    #[serde(default)]
    pub index: u32,

    /// The text delta.
    #[serde(default)]
    pub delta: ChunkDelta,

    /// Set on the last chunk of the choice (`stop`, `length`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Groq-specific metadata attached to the final chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqExtension {
    /// Request id assigned by Groq.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Token usage for the whole request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A `chat.completion.chunk` object carried in one SSE `data:` frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Completion id shared by every chunk of the reply.
    #[serde(default)]
    pub id: String,

    /// Model that produced the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Streamed choices.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Usage, when the endpoint reports it at the top level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Usage and request id, when reported the Groq way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqExtension>,
}

impl ChatCompletionChunk {
    /// Creates a chunk carrying `text` for the first choice.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(text.into()),
                },
                finish_reason: None,
            }],
            ..Self::default()
        }
    }

    /// Creates a final chunk with the given finish reason and no text.
    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some(reason.into()),
            }],
            ..Self::default()
        }
    }

    /// Attaches top-level usage.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Returns the text delta of the first choice, if non-empty.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// Returns the finish reason of the first choice, if this chunk ends it.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }

    /// Returns usage from either the top level or the Groq extension.
    pub fn usage(&self) -> Option<Usage> {
        self.usage
            .or_else(|| self.x_groq.as_ref().and_then(|groq| groq.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunk_deserialization() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1730000000,
            "model": "llama-3.1-8b-instant",
            "system_fingerprint": "fp_1",
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "logprobs": null, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.content(), Some("Hel"));
        assert_eq!(chunk.finish_reason(), None);
        assert_eq!(chunk.usage(), None);
    }

    #[test]
    fn groq_usage_on_final_chunk() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}],
            "x_groq": {"id": "req_1", "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}}
        }))
        .unwrap();
        assert_eq!(chunk.content(), None);
        assert_eq!(chunk.finish_reason(), Some("stop"));
        assert_eq!(chunk.usage(), Some(Usage::new(10, 3)));
    }

    #[test]
    fn empty_content_is_not_text() {
        assert_eq!(ChatCompletionChunk::text("").content(), None);
        assert_eq!(ChatCompletionChunk::text("x").content(), Some("x"));
    }
}
