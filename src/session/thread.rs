//! Chat threads and in-memory storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm::{MessageRole, Turn};

/// Title placeholder until the first user message arrives.
const DEFAULT_TITLE: &str = "New Chat";

/// Maximum number of characters of the first user message kept in the title.
const TITLE_MAX_CHARS: usize = 50;

/// Errors from store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The user id / chat id pair does not resolve to a thread.
    #[error("chat thread not found")]
    ThreadNotFound,
}

/// A single message within a thread.
///
/// Messages are immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message stamped with the current time.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message stamped with the current time.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Project this message to a wire turn.
    fn turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// One conversation: its title and ordered message log.
#[derive(Debug, Clone, Serialize)]
pub struct ChatThread {
    /// Unique thread identifier.
    pub id: String,
    /// Display title, derived from the first user message.
    pub title: String,
    /// Ordered message log, starting with the greeting.
    pub messages: Vec<Message>,
    /// Thread creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl ChatThread {
    fn new(id: String, greeting: Message) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: vec![greeting],
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message, deriving the title when the count reaches two
    /// (the greeting plus the first user message).
    fn append(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() == 2
            && let Some(first_user) = self.messages.last()
            && first_user.role == MessageRole::User
        {
            self.title = derive_title(&first_user.content);
        }
        self.updated_at = Utc::now();
    }

    fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

/// Per-thread listing entry for the history sidebar.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    /// Thread identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thread creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the thread.
    pub message_count: usize,
}

fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str("...");
        title
    } else {
        content.to_string()
    }
}

/// Thread-safe store for chat threads, keyed by user id then chat id.
///
/// One lock guards the whole map: every append (including title derivation
/// and the `updated_at` bump) happens under a single write acquisition, so
/// concurrent sends against the same thread cannot lose updates.
#[derive(Debug, Clone)]
pub struct ChatStore {
    inner: Arc<ChatStoreInner>,
}

#[derive(Debug)]
struct ChatStoreInner {
    threads: RwLock<HashMap<String, HashMap<String, ChatThread>>>,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    /// Create a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChatStoreInner {
                threads: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a thread seeded with an assistant greeting and register it
    /// under the user, creating the user's collection if absent.
    pub fn create_thread(&self, user_id: &str, greeting: &str) -> ChatThread {
        let id = Uuid::new_v4().to_string();
        let thread = ChatThread::new(id.clone(), Message::assistant(greeting));
        let mut guard = self.inner.threads.write().unwrap();
        guard
            .entry(user_id.to_string())
            .or_default()
            .insert(id, thread.clone());
        thread
    }

    /// Append a message to a thread.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ThreadNotFound`] if the user id / chat id pair
    /// does not resolve.
    pub fn append(&self, user_id: &str, chat_id: &str, message: Message) -> Result<(), StoreError> {
        let mut guard = self.inner.threads.write().unwrap();
        let thread = guard
            .get_mut(user_id)
            .and_then(|threads| threads.get_mut(chat_id))
            .ok_or(StoreError::ThreadNotFound)?;
        thread.append(message);
        Ok(())
    }

    /// List the user's threads, most recently updated first.
    ///
    /// Unknown users get an empty list, not an error.
    #[must_use]
    pub fn list_threads(&self, user_id: &str) -> Vec<ThreadSummary> {
        let guard = self.inner.threads.read().unwrap();
        let mut summaries: Vec<ThreadSummary> = guard
            .get(user_id)
            .map(|threads| threads.values().map(ChatThread::summary).collect())
            .unwrap_or_default();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Get the full message log of a thread.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ThreadNotFound`] if the pair does not resolve.
    pub fn messages(&self, user_id: &str, chat_id: &str) -> Result<Vec<Message>, StoreError> {
        let guard = self.inner.threads.read().unwrap();
        guard
            .get(user_id)
            .and_then(|threads| threads.get(chat_id))
            .map(|thread| thread.messages.clone())
            .ok_or(StoreError::ThreadNotFound)
    }

    /// Project the last `limit` messages of a thread to wire turns,
    /// preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ThreadNotFound`] if the pair does not resolve.
    pub fn recent_turns(
        &self,
        user_id: &str,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        let guard = self.inner.threads.read().unwrap();
        let thread = guard
            .get(user_id)
            .and_then(|threads| threads.get(chat_id))
            .ok_or(StoreError::ThreadNotFound)?;
        let skip = thread.messages.len().saturating_sub(limit);
        Ok(thread.messages[skip..].iter().map(Message::turn).collect())
    }

    /// Remove a thread.
    ///
    /// The caller is responsible for clearing any current-chat reference
    /// pointing at it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ThreadNotFound`] if the pair does not resolve.
    pub fn remove(&self, user_id: &str, chat_id: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.threads.write().unwrap();
        guard
            .get_mut(user_id)
            .and_then(|threads| threads.remove(chat_id))
            .map(|_| ())
            .ok_or(StoreError::ThreadNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str = "Hello! How can I help?";

    #[test]
    fn test_create_thread_seeds_greeting() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);

        assert_eq!(thread.title, "New Chat");
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.messages[0].role, MessageRole::Assistant);
        assert_eq!(thread.messages[0].content, GREETING);
        assert_eq!(thread.created_at, thread.updated_at);

        let messages = store.messages("alice", &thread.id).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_title_derived_from_first_user_message_only() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);

        store.append("alice", &thread.id, Message::user("Hi")).unwrap();
        store
            .append("alice", &thread.id, Message::assistant("Hello!"))
            .unwrap();

        let summaries = store.list_threads("alice");
        assert_eq!(summaries[0].title, "Hi");
        assert_eq!(summaries[0].message_count, 3);

        // Later user messages leave the title alone.
        store
            .append("alice", &thread.id, Message::user("Something else"))
            .unwrap();
        assert_eq!(store.list_threads("alice")[0].title, "Hi");
    }

    #[test]
    fn test_long_title_truncated() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);
        let long = "x".repeat(80);

        store
            .append("alice", &thread.id, Message::user(long.as_str()))
            .unwrap();

        let title = &store.list_threads("alice")[0].title;
        assert_eq!(title.len(), 53);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..50], &long[..50]);
    }

    #[test]
    fn test_append_to_missing_thread() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);

        assert_eq!(
            store.append("alice", "no-such-chat", Message::user("Hi")),
            Err(StoreError::ThreadNotFound)
        );
        // Another user's id does not resolve someone else's thread.
        assert_eq!(
            store.append("bob", &thread.id, Message::user("Hi")),
            Err(StoreError::ThreadNotFound)
        );
    }

    #[test]
    fn test_list_threads_sorted_by_update() {
        let store = ChatStore::new();
        let first = store.create_thread("alice", GREETING);
        let second = store.create_thread("alice", GREETING);

        // Most recently created comes first.
        let summaries = store.list_threads("alice");
        assert_eq!(summaries[0].id, second.id);
        assert_eq!(summaries[1].id, first.id);

        // Appending to the older thread moves it to the front.
        store.append("alice", &first.id, Message::user("Hi")).unwrap();
        let summaries = store.list_threads("alice");
        assert_eq!(summaries[0].id, first.id);

        assert!(store.list_threads("nobody").is_empty());
    }

    #[test]
    fn test_recent_turns_caps_window() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);

        for i in 0..25 {
            store
                .append("alice", &thread.id, Message::user(format!("turn {i}")))
                .unwrap();
        }

        let turns = store.recent_turns("alice", &thread.id, 10).unwrap();
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].content, "turn 15");
        assert_eq!(turns[9].content, "turn 24");

        // Short threads come back whole.
        let short = store.create_thread("alice", GREETING);
        let turns = store.recent_turns("alice", &short.id, 10).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, MessageRole::Assistant);
    }

    #[test]
    fn test_remove_thread() {
        let store = ChatStore::new();
        let thread = store.create_thread("alice", GREETING);

        store.remove("alice", &thread.id).unwrap();
        assert_eq!(
            store.messages("alice", &thread.id).unwrap_err(),
            StoreError::ThreadNotFound
        );
        assert_eq!(
            store.remove("alice", &thread.id),
            Err(StoreError::ThreadNotFound)
        );
        assert!(store.list_threads("alice").is_empty());
    }
}
