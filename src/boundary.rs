//! Conversation boundaries inside the single conversation log.
//!
//! A conversation is not stored as an entity. It is every row after the most
//! recent separator, or the whole log when no separator exists yet.

use time::OffsetDateTime;
use tracing::info;

use crate::error::Result;
use crate::store::MessageStore;
use crate::types::{Message, Role};
use crate::utils::time::display_utc;

/// Returns the content of a separator row stamped with `started_at`.
pub fn separator_content(started_at: OffsetDateTime) -> String {
    format!("--- NEW CONVERSATION STARTED: {} ---", display_utc(started_at))
}

/// Tracks which part of the log belongs to the current conversation.
///
/// The id of the latest separator is looked up once and then kept up to date
/// by this value, so repeated reads do not rescan the table.
#[derive(Debug)]
pub struct SessionBoundary<S> {
    store: S,
    marker: Option<Option<i64>>,
}

impl<S: MessageStore> SessionBoundary<S> {
    /// Creates a boundary over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            marker: None,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends a separator stamped with the current time and returns its id.
    pub async fn start_new_conversation(&mut self) -> Result<i64> {
        let separator = self
            .store
            .append(Role::Separator, &separator_content(OffsetDateTime::now_utc()))
            .await?;
        self.marker = Some(Some(separator.id));
        info!(id = separator.id, "started new conversation");
        Ok(separator.id)
    }

    /// Returns the id of the latest separator, if any.
    pub async fn current_marker(&mut self) -> Result<Option<i64>> {
        if let Some(marker) = self.marker {
            return Ok(marker);
        }
        let marker = self.store.latest_separator_id().await?;
        self.marker = Some(marker);
        Ok(marker)
    }

    /// Returns the messages of the current conversation, oldest first.
    ///
    /// The separator itself is never included. An empty log yields an empty
    /// vector.
    pub async fn current_session_messages(&mut self) -> Result<Vec<Message>> {
        let marker = self.current_marker().await?;
        let messages = self.store.fetch_after(marker).await?;
        Ok(messages.into_iter().filter(|m| !m.is_separator()).collect())
    }

    /// Deletes the whole log and forgets the cached separator.
    pub async fn clear(&mut self) -> Result<u64> {
        let removed = self.store.clear().await?;
        self.marker = Some(None);
        info!(removed, "cleared conversation log");
        Ok(removed)
    }

    /// Drops the cached separator id so the next read consults the store.
    pub fn invalidate(&mut self) {
        self.marker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use time::macros::datetime;

    async fn boundary() -> SessionBoundary<SqliteStore> {
        SessionBoundary::new(SqliteStore::in_memory().await.unwrap())
    }

    #[test]
    fn separator_content_is_human_readable() {
        assert_eq!(
            separator_content(datetime!(2025-03-04 05:06:07 UTC)),
            "--- NEW CONVERSATION STARTED: 2025-03-04 05:06:07 UTC ---"
        );
    }

    #[tokio::test]
    async fn empty_log_has_empty_session() {
        let mut boundary = boundary().await;
        assert!(boundary.current_session_messages().await.unwrap().is_empty());
        assert_eq!(boundary.current_marker().await.unwrap(), None);
    }

    #[tokio::test]
    async fn new_conversation_hides_prior_sessions() {
        let mut boundary = boundary().await;
        boundary.store().append(Role::User, "one").await.unwrap();
        boundary.store().append(Role::Assistant, "two").await.unwrap();
        boundary.store().append(Role::User, "three").await.unwrap();

        let separator = boundary.start_new_conversation().await.unwrap();
        let fresh = boundary.store().append(Role::User, "four").await.unwrap();

        assert!(fresh.id > separator);
        assert_eq!(boundary.current_session_messages().await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn new_conversation_starts_empty() {
        let mut boundary = boundary().await;
        boundary.store().append(Role::User, "old").await.unwrap();
        boundary.start_new_conversation().await.unwrap();
        assert!(boundary.current_session_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn without_separator_the_whole_log_is_one_session() {
        let mut boundary = boundary().await;
        boundary.store().append(Role::User, "a").await.unwrap();
        boundary.store().append(Role::Assistant, "b").await.unwrap();
        assert_eq!(boundary.current_session_messages().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn marker_written_elsewhere_is_seen_after_invalidate() {
        let mut boundary = boundary().await;
        assert_eq!(boundary.current_marker().await.unwrap(), None);

        let separator = boundary
            .store()
            .append(Role::Separator, "--- marker ---")
            .await
            .unwrap();
        assert_eq!(boundary.current_marker().await.unwrap(), None);

        boundary.invalidate();
        assert_eq!(boundary.current_marker().await.unwrap(), Some(separator.id));
    }

    #[tokio::test]
    async fn clear_resets_the_session() {
        let mut boundary = boundary().await;
        boundary.start_new_conversation().await.unwrap();
        boundary.store().append(Role::User, "hello").await.unwrap();

        assert_eq!(boundary.clear().await.unwrap(), 2);
        assert_eq!(boundary.current_marker().await.unwrap(), None);
        assert!(boundary.store().fetch_all(false).await.unwrap().is_empty());

        let after = boundary.store().append(Role::User, "again").await.unwrap();
        assert_eq!(boundary.current_session_messages().await.unwrap(), vec![after]);
    }
}
