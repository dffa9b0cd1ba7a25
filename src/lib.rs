//! Banter
//!
//! A small web chat front end: conversation history lives in server memory,
//! scoped per browser, and every user turn is relayed to an OpenAI-compatible
//! completion endpoint whose reply is appended to the thread.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with a JSON API and an embedded page shell
//! - **Session store**: in-memory chat threads keyed by user id, then chat id
//! - **Completion client**: non-streaming Chat Completions call with a bounded timeout
//! - **Identity**: signed cookies carrying the browser's user id and current chat
//!
//! # Modules
//!
//! - [`config`]: layered configuration and LLM settings loading
//! - [`error`]: API error taxonomy and HTTP mapping
//! - [`identity`]: cookie-backed browser identity
//! - [`llm`]: completion client trait and implementation
//! - [`server`]: router and request handlers
//! - [`session`]: chat threads and the in-memory store

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod server;
pub mod session;

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use llm::CompletionClient;
use session::ChatStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// In-memory chat thread store.
    pub store: ChatStore,
    /// Completion client for assistant replies.
    pub completions: Arc<dyn CompletionClient>,
    /// Key for signing identity cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
