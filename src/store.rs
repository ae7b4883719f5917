//! The conversation log.
//!
//! Every prompt, reply and conversation separator is one row of a single
//! append-only `messages` table. Rows are only ever removed all at once by
//! [`MessageStore::clear`].
//!
//! Ids come from SQLite's `AUTOINCREMENT` generator: they strictly increase,
//! are never reused, and keep increasing after the table is cleared.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, QueryBuilder, Row, Sqlite};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::observability::{STORE_APPENDS, STORE_CONNECT_RETRIES, STORE_ERRORS};
use crate::types::{ChatSummary, Message, MessagePage, MessageQuery, Role};
use crate::utils::time::{from_rfc3339, to_rfc3339};

/// Delay before the single retry of a connection that was not ready.
const STARTUP_RETRY_DELAY: Duration = Duration::from_millis(500);

const MESSAGES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    role       TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

const ROLE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_messages_role ON messages(role, id)";

const SELECT_COLUMNS: &str = "SELECT id, role, content, created_at FROM messages";

/// Access to the conversation log.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends one row and returns it with its assigned id.
    async fn append(&self, role: Role, content: &str) -> Result<Message>;

    /// Appends a user prompt and its reply as one all-or-nothing write.
    async fn append_exchange(
        &self,
        prompt: &str,
        reply: &str,
        asked_at: OffsetDateTime,
    ) -> Result<(Message, Message)>;

    /// Returns every row with an id greater than `marker`, oldest first.
    ///
    /// `None` returns the whole log.
    async fn fetch_after(&self, marker: Option<i64>) -> Result<Vec<Message>>;

    /// Returns the id of the most recent separator.
    async fn latest_separator_id(&self) -> Result<Option<i64>>;

    /// Lists messages matching `query`.
    async fn query(&self, query: &MessageQuery) -> Result<MessagePage>;

    /// Returns the oldest `limit` messages with the given role.
    async fn messages_by_role(&self, role: Role, limit: Option<usize>) -> Result<Vec<Message>>;

    /// Computes statistics over the whole log.
    async fn summary(&self) -> Result<ChatSummary>;

    /// Deletes every row and returns how many were removed.
    async fn clear(&self) -> Result<u64>;

    /// Returns the log oldest first.
    ///
    /// With `current_session_only`, only rows after the latest separator are
    /// returned (the separator itself excluded); without any separator the
    /// whole log is one implicit session.
    async fn fetch_all(&self, current_session_only: bool) -> Result<Vec<Message>> {
        let marker = if current_session_only {
            self.latest_separator_id().await?
        } else {
            None
        };
        self.fetch_after(marker).await
    }
}

/// SQLite-backed conversation log using an sqlx pool.
///
/// Each operation acquires a pooled connection for its own duration only.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url`, e.g. `sqlite://groqchat.db`.
    ///
    /// A first attempt that fails because the database is not ready yet is
    /// retried exactly once after a short delay.
    pub async fn connect(url: &str) -> Result<Self> {
        match Self::open(url).await {
            Err(err) if err.is_transient() => {
                warn!(error = %err, url, "conversation log not ready, retrying once");
                STORE_CONNECT_RETRIES.click();
                tokio::time::sleep(STARTUP_RETRY_DELAY).await;
                Self::open(url).await
            }
            other => other,
        }
    }

    /// Opens a private in-memory log, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        // Every connection to sqlite::memory: is a different database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::storage("cannot open in-memory conversation log", e))?;
        Self::new(pool).await
    }

    /// Wraps an existing pool, creating the schema if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn open(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::storage(format!("invalid database url '{url}'"), e))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| Error::storage(format!("cannot open conversation log at {url}"), e))?;
        Self::new(pool).await
    }
}

async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(MESSAGES_TABLE)
        .execute(pool)
        .await
        .map_err(|e| Error::storage("failed to create messages table", e))?;
    sqlx::query(ROLE_INDEX)
        .execute(pool)
        .await
        .map_err(|e| Error::storage("failed to create messages index", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl MessageStore for SqliteStore {
    async fn append(&self, role: Role, content: &str) -> Result<Message> {
        validate_content(content)?;
        let message = insert(&self.pool, role, content, OffsetDateTime::now_utc())
            .await
            .inspect_err(|_| STORE_ERRORS.click())?;
        STORE_APPENDS.click();
        debug!(id = message.id, role = %role, "appended message");
        Ok(message)
    }

    async fn append_exchange(
        &self,
        prompt: &str,
        reply: &str,
        asked_at: OffsetDateTime,
    ) -> Result<(Message, Message)> {
        validate_content(prompt)?;
        validate_content(reply)?;
        let result = async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| Error::storage("failed to begin transaction", e))?;
            let user = insert(&mut *tx, Role::User, prompt, asked_at).await?;
            let assistant =
                insert(&mut *tx, Role::Assistant, reply, OffsetDateTime::now_utc()).await?;
            tx.commit()
                .await
                .map_err(|e| Error::storage("failed to commit exchange", e))?;
            Ok::<_, Error>((user, assistant))
        }
        .await;
        match &result {
            Ok((user, assistant)) => {
                STORE_APPENDS.count(2);
                debug!(user_id = user.id, assistant_id = assistant.id, "appended exchange");
            }
            Err(err) => {
                STORE_ERRORS.click();
                warn!(error = %err, "exchange was not persisted");
            }
        }
        result
    }

    async fn fetch_after(&self, marker: Option<i64>) -> Result<Vec<Message>> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id > ?1 ORDER BY id ASC"))
            .bind(marker.unwrap_or(0))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::storage("failed to fetch messages", e))?;
        rows.iter().map(map_row).collect()
    }

    async fn latest_separator_id(&self) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM messages WHERE role = ?1 ORDER BY id DESC LIMIT 1",
        )
        .bind(Role::Separator.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::storage("failed to find the latest separator", e))
    }

    async fn query(&self, query: &MessageQuery) -> Result<MessagePage> {
        let marker = if query.current_conversation_only {
            self.latest_separator_id().await?
        } else {
            None
        };
        match query.search.as_deref().filter(|s| !s.is_empty()) {
            Some(search) => self.search_page(query, marker, search).await,
            None => self.page(query, marker).await,
        }
    }

    async fn messages_by_role(&self, role: Role, limit: Option<usize>) -> Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE role = ?1 ORDER BY id ASC LIMIT ?2"
        ))
        .bind(role.as_str())
        .bind(limit.map(to_i64).unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::storage("failed to fetch messages by role", e))?;
        rows.iter().map(map_row).collect()
    }

    async fn summary(&self) -> Result<ChatSummary> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total,
                    COALESCE(SUM(role = 'user'), 0) AS users,
                    COALESCE(SUM(role = 'assistant'), 0) AS assistants,
                    COALESCE(SUM(role = 'separator'), 0) AS separators,
                    COALESCE(AVG(CASE WHEN role != 'separator' THEN LENGTH(content) END), 0.0)
                        AS average_length
             FROM messages",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::storage("failed to summarize the conversation log", e))?;

        let first_message = self.edge_timestamp("ASC").await?;
        let last_message = self.edge_timestamp("DESC").await?;

        Ok(ChatSummary {
            total_messages: to_u64(row.try_get("total")?),
            user_messages: to_u64(row.try_get("users")?),
            assistant_messages: to_u64(row.try_get("assistants")?),
            conversations: to_u64(row.try_get("separators")?),
            first_message,
            last_message,
            average_length: row.try_get("average_length")?,
        })
    }

    async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::storage("failed to clear the conversation log", e))?;
        let removed = result.rows_affected();
        debug!(removed, "cleared conversation log");
        Ok(removed)
    }
}

impl SqliteStore {
    async fn page(&self, query: &MessageQuery, marker: Option<i64>) -> Result<MessagePage> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM messages WHERE 1 = 1");
        push_filters(&mut count, query, marker);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::storage("failed to count messages", e))?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS} WHERE 1 = 1"));
        push_filters(&mut select, query, marker);
        // LIMIT -1 is unbounded in SQLite.
        let limit = query.limit.map(to_i64).unwrap_or(-1);
        select
            .push(" ORDER BY id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(to_i64(query.offset));
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::storage("failed to list messages", e))?;

        let mut messages = rows.iter().map(map_row).collect::<Result<Vec<_>>>()?;
        messages.reverse();
        Ok(MessagePage {
            messages,
            total: usize::try_from(total).unwrap_or(0),
        })
    }

    /// SQLite's `LIKE` and `lower()` only fold ASCII, so the substring match
    /// runs here on Unicode-lowercased text and pagination follows it.
    async fn search_page(
        &self,
        query: &MessageQuery,
        marker: Option<i64>,
        search: &str,
    ) -> Result<MessagePage> {
        let mut select = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS} WHERE 1 = 1"));
        push_filters(&mut select, query, marker);
        select.push(" ORDER BY id DESC");
        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::storage("failed to search messages", e))?;

        let needle = search.to_lowercase();
        let mut matches = Vec::new();
        for row in &rows {
            let message = map_row(row)?;
            if message.content.to_lowercase().contains(&needle) {
                matches.push(message);
            }
        }
        let total = matches.len();
        let mut messages: Vec<Message> = matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        messages.reverse();
        Ok(MessagePage { messages, total })
    }

    async fn edge_timestamp(&self, order: &str) -> Result<Option<OffsetDateTime>> {
        let created_at: Option<String> = sqlx::query_scalar(&format!(
            "SELECT created_at FROM messages WHERE role != 'separator' ORDER BY id {order} LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::storage("failed to read message timestamps", e))?;
        created_at.as_deref().map(parse_created_at).transpose()
    }
}

async fn insert<'e, E>(
    executor: E,
    role: Role,
    content: &str,
    created_at: OffsetDateTime,
) -> Result<Message>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stamp = to_rfc3339(created_at)?;
    let result = sqlx::query("INSERT INTO messages (role, content, created_at) VALUES (?1, ?2, ?3)")
        .bind(role.as_str())
        .bind(content)
        .bind(stamp)
        .execute(executor)
        .await
        .map_err(|e| Error::storage(format!("failed to append {role} message"), e))?;
    Ok(Message {
        id: result.last_insert_rowid(),
        role,
        content: content.to_string(),
        created_at,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &MessageQuery, marker: Option<i64>) {
    if let Some(marker) = marker {
        builder.push(" AND id > ").push_bind(marker);
    }
    if !query.include_separators {
        builder
            .push(" AND role != ")
            .push_bind(Role::Separator.as_str());
    }
    if let Some(role) = query.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
}

fn map_row(row: &SqliteRow) -> Result<Message> {
    let role_raw: String = row.try_get("role")?;
    let role = Role::from_str(&role_raw).map_err(|_| {
        Error::storage_message(format!("unknown role in conversation log: {role_raw}"))
    })?;
    let created_raw: String = row.try_get("created_at")?;
    Ok(Message {
        id: row.try_get("id")?,
        role,
        content: row.try_get("content")?,
        created_at: parse_created_at(&created_raw)?,
    })
}

fn parse_created_at(raw: &str) -> Result<OffsetDateTime> {
    from_rfc3339(raw)
        .map_err(|_| Error::storage_message(format!("corrupt timestamp in conversation log: {raw}")))
}

fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::validation(
            "message content must not be empty",
            Some("content".to_string()),
        ));
    }
    Ok(())
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    value.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn fetch_all_preserves_insertion_order() {
        let store = store().await;
        let inputs = [
            (Role::User, "first"),
            (Role::Assistant, "second"),
            (Role::Separator, "--- marker ---"),
            (Role::User, "third"),
            (Role::Assistant, "fourth"),
        ];
        for (role, content) in inputs {
            store.append(role, content).await.unwrap();
        }

        let all = store.fetch_all(false).await.unwrap();
        let got: Vec<(Role, &str)> = all.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(got, inputs.to_vec());
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn fetch_current_session_excludes_separator_and_prior_rows() {
        let store = store().await;
        store.append(Role::User, "old").await.unwrap();
        let separator = store.append(Role::Separator, "--- marker ---").await.unwrap();
        let fresh = store.append(Role::User, "new").await.unwrap();

        assert_eq!(store.latest_separator_id().await.unwrap(), Some(separator.id));
        assert_eq!(store.fetch_all(true).await.unwrap(), vec![fresh]);
    }

    #[tokio::test]
    async fn fetch_current_session_without_separator_is_whole_log() {
        let store = store().await;
        store.append(Role::User, "a").await.unwrap();
        store.append(Role::Assistant, "b").await.unwrap();
        assert_eq!(store.fetch_all(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_log_returns_empty() {
        let store = store().await;
        assert!(store.fetch_all(true).await.unwrap().is_empty());
        assert!(store.fetch_all(false).await.unwrap().is_empty());
        assert_eq!(store.latest_separator_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_empties_the_log_and_ids_keep_increasing() {
        let store = store().await;
        store.append(Role::User, "a").await.unwrap();
        let last = store.append(Role::Assistant, "b").await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.fetch_all(false).await.unwrap().is_empty());

        let next = store.append(Role::User, "c").await.unwrap();
        assert!(next.id > last.id);
    }

    #[tokio::test]
    async fn rejected_append_leaves_log_unchanged() {
        let store = store().await;
        store.append(Role::User, "kept").await.unwrap();
        let before = store.fetch_all(false).await.unwrap();

        let err = store.append(Role::User, "   ").await.unwrap_err();
        assert!(err.is_validation());
        let err = store
            .append_exchange("question", "", OffsetDateTime::now_utc())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(store.fetch_all(false).await.unwrap(), before);
    }

    #[tokio::test]
    async fn append_exchange_writes_user_then_assistant() {
        let store = store().await;
        let asked_at = OffsetDateTime::now_utc();
        let (user, assistant) = store
            .append_exchange("Hello", "Hi there", asked_at)
            .await
            .unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(assistant.role, Role::Assistant);
        assert!(user.id < assistant.id);
        assert_eq!(store.fetch_all(false).await.unwrap(), vec![user, assistant]);
    }

    #[tokio::test]
    async fn timestamps_round_trip_through_the_table() {
        let store = store().await;
        let appended = store.append(Role::User, "hello").await.unwrap();
        let fetched = store.fetch_all(false).await.unwrap();
        assert_eq!(fetched[0].created_at, appended.created_at);
    }

    #[tokio::test]
    async fn query_paginates_from_the_newest_message() {
        let store = store().await;
        for i in 0..10 {
            store.append(Role::User, &format!("message {i}")).await.unwrap();
        }

        let page = store
            .query(&MessageQuery::new().with_limit(Some(3)).with_offset(2))
            .await
            .unwrap();
        let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 5", "message 6", "message 7"]);
        assert_eq!(page.total, 10);
    }

    #[tokio::test]
    async fn query_filters_by_role_and_search() {
        let store = store().await;
        store.append(Role::User, "How do I use Rust traits?").await.unwrap();
        store.append(Role::Assistant, "Traits define shared behavior.").await.unwrap();
        store.append(Role::User, "And 100% safe code?").await.unwrap();

        let page = store
            .query(&MessageQuery::new().with_search("TRAITS"))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = store
            .query(&MessageQuery::new().with_search("traits").with_role(Role::User))
            .await
            .unwrap();
        assert_eq!(page.messages.len(), 1);
        assert_eq!(page.messages[0].content, "How do I use Rust traits?");

        let page = store
            .query(&MessageQuery::new().with_search("100%"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn query_scopes_to_current_conversation() {
        let store = store().await;
        store.append(Role::User, "before").await.unwrap();
        store.append(Role::Separator, "--- marker ---").await.unwrap();
        store.append(Role::User, "after").await.unwrap();

        let current = store.query(&MessageQuery::new()).await.unwrap();
        assert_eq!(current.total, 1);
        assert_eq!(current.messages[0].content, "after");

        let everything = store.query(&MessageQuery::everything()).await.unwrap();
        assert_eq!(everything.total, 2);

        let with_markers = store
            .query(&MessageQuery::everything().with_separators(true))
            .await
            .unwrap();
        assert_eq!(with_markers.total, 3);
    }

    #[tokio::test]
    async fn messages_by_role_returns_oldest_first() {
        let store = store().await;
        store.append(Role::User, "q1").await.unwrap();
        store.append(Role::Assistant, "a1").await.unwrap();
        store.append(Role::User, "q2").await.unwrap();

        let users = store.messages_by_role(Role::User, None).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].content, "q1");

        let limited = store.messages_by_role(Role::User, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn summary_counts_roles() {
        let store = store().await;
        let empty = store.summary().await.unwrap();
        assert_eq!(empty.total_messages, 0);
        assert_eq!(empty.first_message, None);
        assert_eq!(empty.average_length, 0.0);

        store.append(Role::Separator, "--- marker ---").await.unwrap();
        let first = store.append(Role::User, "abcd").await.unwrap();
        let last = store.append(Role::Assistant, "ab").await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.user_messages, 1);
        assert_eq!(summary.assistant_messages, 1);
        assert_eq!(summary.conversations, 1);
        assert_eq!(summary.first_message, Some(first.created_at));
        assert_eq!(summary.last_message, Some(last.created_at));
        assert_eq!(summary.average_length, 3.0);
    }

    #[tokio::test]
    async fn unknown_role_is_a_storage_error() {
        let store = store().await;
        sqlx::query("INSERT INTO messages (role, content, created_at) VALUES ('system', 'x', '2025-01-01T00:00:00Z')")
            .execute(store.pool())
            .await
            .unwrap();
        let err = store.fetch_all(false).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("chat.db").display());
        let store = SqliteStore::connect(&url).await.unwrap();
        store.append(Role::User, "persisted").await.unwrap();
        drop(store);

        let reopened = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(reopened.fetch_all(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_folds_case_beyond_ascii() {
        let store = store().await;
        store.append(Role::User, "Qué es ÉLAN en Python").await.unwrap();
        store.append(Role::Assistant, "Straße und STRASSE").await.unwrap();
        store.append(Role::User, "unrelated").await.unwrap();

        let page = store
            .query(&MessageQuery::everything().with_search("élan"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.messages[0].content, "Qué es ÉLAN en Python");

        let page = store
            .query(&MessageQuery::everything().with_search("QUÉ"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = store
            .query(&MessageQuery::everything().with_search("straße"))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn search_paginates_after_matching() {
        let store = store().await;
        for i in 0..6 {
            store.append(Role::User, &format!("Ñandú {i}")).await.unwrap();
            store.append(Role::Assistant, &format!("other {i}")).await.unwrap();
        }

        let page = store
            .query(
                &MessageQuery::everything()
                    .with_search("ñANDÚ")
                    .with_limit(Some(2))
                    .with_offset(1),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        let contents: Vec<_> = page.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["Ñandú 3", "Ñandú 4"]);
    }
}
