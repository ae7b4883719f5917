use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The role of a row in the conversation log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A prompt typed by the user.
    User,

    /// A reply produced by the model.
    Assistant,

    /// A marker opening a new conversation; never sent to the model.
    Separator,
}

impl Role {
    /// Returns the string stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Separator => "separator",
        }
    }

    /// Returns the label used in exports and history listings.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Separator => "Conversation",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "separator" => Ok(Role::Separator),
            _ => Err(Error::validation(
                format!("unknown message role: {s}"),
                Some("role".to_string()),
            )),
        }
    }
}
