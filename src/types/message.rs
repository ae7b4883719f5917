use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{ChatMessageParam, Role};

/// One row of the conversation log.
///
/// Rows are ordered by `id`, which the store assigns on insert and never reuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Sequence number assigned by the store.
    pub id: i64,

    /// Who produced the row.
    pub role: Role,

    /// The text of the message.
    pub content: String,

    /// When the row was created.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
}

impl Message {
    /// Returns true if this row marks the start of a conversation.
    pub fn is_separator(&self) -> bool {
        self.role == Role::Separator
    }

    /// Converts the row into a request message.
    ///
    /// Separators have no request representation and yield `None`.
    pub fn to_param(&self) -> Option<ChatMessageParam> {
        match self.role {
            Role::User => Some(ChatMessageParam::user(self.content.clone())),
            Role::Assistant => Some(ChatMessageParam::assistant(self.content.clone())),
            Role::Separator => None,
        }
    }
}
