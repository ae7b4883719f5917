use serde::{Deserialize, Serialize};

use crate::types::Usage;

/// The message inside a non-streamed choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionMessage {
    /// Always `assistant` for replies.
    #[serde(default)]
    pub role: String,

    /// Generated text; absent for empty replies.
    #[serde(default)]
    pub content: Option<String>,
}

/// One choice of a non-streamed completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionChoice {
    /// Index of the choice.
    #[serde(default)]
    pub index: u32,

    /// The reply.
    #[serde(default)]
    pub message: CompletionMessage,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// A `chat.completion` object returned by a non-streamed request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Completion id.
    #[serde(default)]
    pub id: String,

    /// Model that produced the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,

    /// Token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Returns the text of the first choice, or an empty string.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or("")
    }
}
