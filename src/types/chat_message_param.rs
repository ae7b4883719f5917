use serde::{Deserialize, Serialize};

/// Role of a message sent to the chat completions endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model.
    System,

    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// A `{role, content}` pair in a chat completions request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessageParam {
    /// The role of the message.
    pub role: ChatRole,

    /// The content of the message.
    pub content: String,
}

impl ChatMessageParam {
    /// Create a new `ChatMessageParam` with the given role and content.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new system `ChatMessageParam`.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a new user `ChatMessageParam`.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create a new assistant `ChatMessageParam`.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn param_serialization() {
        assert_eq!(
            to_value(ChatMessageParam::system("be terse")).unwrap(),
            json!({"role": "system", "content": "be terse"})
        );
    }
}
