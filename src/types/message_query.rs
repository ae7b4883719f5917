use crate::types::{Message, Role};

/// Filters and pagination for listing the conversation log.
///
/// Pagination counts from the newest message: `offset` skips the most recent
/// matches and `limit` bounds how many of the remaining newest matches are
/// returned. Results are always returned oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Maximum number of messages to return; `None` returns every match.
    pub limit: Option<usize>,

    /// Number of newest matches to skip.
    pub offset: usize,

    /// Case-insensitive substring that the content must contain.
    pub search: Option<String>,

    /// Only return messages with this role.
    pub role: Option<Role>,

    /// Only return messages after the latest separator.
    pub current_conversation_only: bool,

    /// Include separator rows in the result.
    pub include_separators: bool,
}

impl MessageQuery {
    /// Creates a query matching the current conversation, without separators.
    pub fn new() -> Self {
        Self {
            limit: None,
            offset: 0,
            search: None,
            role: None,
            current_conversation_only: true,
            include_separators: false,
        }
    }

    /// Creates a query matching the whole log, without separators.
    pub fn everything() -> Self {
        Self::new().with_current_conversation_only(false)
    }

    /// Sets the maximum number of messages.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the number of newest matches to skip.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Restricts results to a role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Restricts results to the current conversation.
    pub fn with_current_conversation_only(mut self, current: bool) -> Self {
        self.current_conversation_only = current;
        self
    }

    /// Includes separator rows.
    pub fn with_separators(mut self, include: bool) -> Self {
        self.include_separators = include;
        self
    }
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    /// Matching messages, oldest first.
    pub messages: Vec<Message>,

    /// Number of messages matching the filters, ignoring pagination.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query() {
        let query = MessageQuery::default();
        assert!(query.current_conversation_only);
        assert!(!query.include_separators);
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn query_builder_pattern() {
        let query = MessageQuery::everything()
            .with_limit(Some(10))
            .with_offset(5)
            .with_search("rust")
            .with_role(Role::User)
            .with_separators(true);
        assert!(!query.current_conversation_only);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, 5);
        assert_eq!(query.search.as_deref(), Some("rust"));
        assert_eq!(query.role, Some(Role::User));
        assert!(query.include_separators);
    }
}
