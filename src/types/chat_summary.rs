use time::OffsetDateTime;

/// Statistics over the whole conversation log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    /// Every row, separators included.
    pub total_messages: u64,

    /// Rows with role `user`.
    pub user_messages: u64,

    /// Rows with role `assistant`.
    pub assistant_messages: u64,

    /// Number of separators, i.e. explicitly started conversations.
    pub conversations: u64,

    /// Creation time of the oldest user or assistant message.
    pub first_message: Option<OffsetDateTime>,

    /// Creation time of the newest user or assistant message.
    pub last_message: Option<OffsetDateTime>,

    /// Mean content length in characters over user and assistant messages.
    pub average_length: f64,
}
