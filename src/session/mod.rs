//! Chat thread management.
//!
//! This module provides in-memory storage for chat threads, keyed first by
//! user id and then by chat id. All data is volatile: threads live for the
//! process lifetime and are destroyed on explicit delete or restart.
//!
//! # Architecture
//!
//! - [`ChatThread`]: one conversation, its title, and its message log
//! - [`ChatStore`]: thread-safe store for all users' threads
//!
//! # Example
//!
//! ```rust
//! use banter::session::{ChatStore, Message};
//!
//! let store = ChatStore::new();
//! let thread = store.create_thread("user-1", "Hello!");
//! store.append("user-1", &thread.id, Message::user("Hi")).unwrap();
//!
//! assert_eq!(store.list_threads("user-1")[0].message_count, 2);
//! ```

mod thread;

pub use thread::{ChatStore, ChatThread, Message, StoreError, ThreadSummary};
