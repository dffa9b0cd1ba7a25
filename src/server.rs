use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Html,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::identity;
use crate::llm::{CONTEXT_WINDOW, ChatCompletionsClient, LlmSettings};
use crate::session::{ChatStore, Message, ThreadSummary};

/// Greeting seeded into a thread created from the landing flow.
const START_GREETING: &str = "Hello! I'm your AI assistant. I'm here to help you with anything you need. How can I assist you today? 😊";

/// Greeting seeded into a thread created from the "new chat" button.
const NEW_CHAT_GREETING: &str = "Hello! I'm here to help you with your new conversation. What would you like to talk about? 🚀";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: AppConfig, settings: LlmSettings) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    if config.security.session_secret.len() < 32 {
        anyhow::bail!("security.session_secret must be at least 32 bytes");
    }

    let timeout = Duration::from_secs(config.resilience.collaborator_timeout_secs);
    let completions = Arc::new(ChatCompletionsClient::new(settings, timeout)?);

    let state = AppState {
        store: ChatStore::new(),
        completions,
        cookie_key: Key::derive_from(config.security.session_secret.as_bytes()),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/start_chat", post(start_chat))
        .route("/send_message", post(send_message))
        .route("/get_chat_history", get(get_chat_history))
        .route("/get_chat_messages/{chat_id}", get(get_chat_messages))
        .route("/delete_chat/{chat_id}", delete(delete_chat))
        .route("/new_chat", post(new_chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for message sending.
#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    /// User message content.
    #[serde(default)]
    message: String,
}

/// Response for thread creation.
#[derive(Debug, Serialize)]
struct StartChatResponse {
    success: bool,
    chat_id: String,
    welcome_message: Message,
}

/// Response for message sending.
#[derive(Debug, Serialize)]
struct SendMessageResponse {
    success: bool,
    response: String,
    chat_id: String,
}

/// Response for the thread listing.
#[derive(Debug, Serialize)]
struct ChatHistoryResponse {
    success: bool,
    chats: Vec<ThreadSummary>,
}

/// Response for the message log of one thread.
#[derive(Debug, Serialize)]
struct ChatMessagesResponse {
    success: bool,
    messages: Vec<Message>,
}

/// Response for thread deletion.
#[derive(Debug, Serialize)]
struct DeleteChatResponse {
    success: bool,
}

/// GET / - Serve the page shell, establishing identity on first visit.
async fn index(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    (identity::establish(jar), Html(html_shell("Chat")))
}

/// POST /start_chat - Create a thread and make it current.
async fn start_chat(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<StartChatResponse>), ApiError> {
    let (jar, user_id) = identity::ensure_user(jar);
    open_thread(&state, jar, &user_id, START_GREETING)
}

/// POST /new_chat - Same contract as start_chat, different greeting; requires
/// an established identity.
async fn new_chat(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<StartChatResponse>), ApiError> {
    let user_id = identity::user_id(&jar).ok_or(ApiError::Unauthorized)?;
    open_thread(&state, jar, &user_id, NEW_CHAT_GREETING)
}

fn open_thread(
    state: &AppState,
    jar: SignedCookieJar,
    user_id: &str,
    greeting: &str,
) -> Result<(SignedCookieJar, Json<StartChatResponse>), ApiError> {
    let thread = state.store.create_thread(user_id, greeting);
    let chat_id = thread.id;
    let welcome = thread
        .messages
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("new thread is missing its greeting".to_string()))?;

    tracing::info!(user_id = %user_id, chat_id = %chat_id, "Created chat thread");

    let jar = identity::set_current_chat(jar, &chat_id);
    Ok((
        jar,
        Json(StartChatResponse {
            success: true,
            chat_id,
            welcome_message: welcome,
        }),
    ))
}

/// POST /send_message - Append the user message, relay the context window to
/// the completion endpoint, append and return the reply.
async fn send_message(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let user_id = identity::user_id(&jar).ok_or(ApiError::Unauthorized)?;
    let chat_id = identity::current_chat(&jar).ok_or(ApiError::Unauthorized)?;

    let Json(req) =
        payload.map_err(|_| ApiError::BadRequest("No JSON data received".to_string()))?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Empty message".to_string()));
    }

    state.store.append(&user_id, &chat_id, Message::user(message))?;
    let window = state.store.recent_turns(&user_id, &chat_id, CONTEXT_WINDOW)?;

    tracing::info!(
        user_id = %user_id,
        chat_id = %chat_id,
        window = window.len(),
        "Relaying message to completion endpoint"
    );

    // On failure the user message stays recorded; the thread simply has no
    // reply until the user retries.
    let reply = state.completions.complete(&window).await?;
    state
        .store
        .append(&user_id, &chat_id, Message::assistant(reply.clone()))?;

    Ok(Json(SendMessageResponse {
        success: true,
        response: reply,
        chat_id,
    }))
}

/// GET /get_chat_history - List the caller's threads, newest activity first.
async fn get_chat_history(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Json<ChatHistoryResponse> {
    let chats = identity::user_id(&jar)
        .map(|user_id| state.store.list_threads(&user_id))
        .unwrap_or_default();

    Json(ChatHistoryResponse {
        success: true,
        chats,
    })
}

/// GET /get_chat_messages/{chat_id} - Full message log of one thread.
async fn get_chat_messages(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatMessagesResponse>, ApiError> {
    let user_id = identity::user_id(&jar).ok_or(ApiError::Unauthorized)?;
    let messages = state.store.messages(&user_id, &chat_id)?;

    Ok(Json(ChatMessagesResponse {
        success: true,
        messages,
    }))
}

/// DELETE /delete_chat/{chat_id} - Delete a thread, clearing the current-chat
/// reference when it pointed at it.
async fn delete_chat(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(chat_id): Path<String>,
) -> Result<(SignedCookieJar, Json<DeleteChatResponse>), ApiError> {
    let user_id = identity::user_id(&jar).ok_or(ApiError::Unauthorized)?;
    state.store.remove(&user_id, &chat_id)?;

    tracing::info!(user_id = %user_id, chat_id = %chat_id, "Deleted chat thread");

    let jar = if identity::current_chat(&jar).as_deref() == Some(chat_id.as_str()) {
        identity::clear_current_chat(jar)
    } else {
        jar
    };

    Ok((jar, Json(DeleteChatResponse { success: true })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Page shell
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the HTML shell for the application.
fn html_shell(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Banter</title>
    <style>
        body {{ margin: 0; font-family: system-ui, sans-serif; display: flex; height: 100vh; }}
        #sidebar {{ width: 260px; background: #f4f4f5; padding: 1rem; overflow-y: auto; }}
        #sidebar li {{ list-style: none; padding: 0.4rem; cursor: pointer; border-radius: 6px; }}
        #sidebar li:hover {{ background: #e4e4e7; }}
        #main {{ flex: 1; display: flex; flex-direction: column; }}
        #log {{ flex: 1; overflow-y: auto; padding: 1rem; }}
        .msg {{ margin: 0.5rem 0; padding: 0.6rem 0.9rem; border-radius: 10px; max-width: 70%; white-space: pre-wrap; }}
        .user {{ background: #2563eb; color: #fff; margin-left: auto; }}
        .assistant {{ background: #e4e4e7; }}
        form {{ display: flex; gap: 0.5rem; padding: 1rem; }}
        input {{ flex: 1; padding: 0.6rem; border: 1px solid #d4d4d8; border-radius: 8px; }}
    </style>
</head>
<body>
    <aside id="sidebar">
        <button onclick="newChat()">New Chat</button>
        <ul id="chats"></ul>
    </aside>
    <div id="main">
        <div id="log"></div>
        <form onsubmit="return sendMessage(event)">
            <input id="message" placeholder="Type your message..." autocomplete="off">
            <button type="submit">Send</button>
        </form>
    </div>
    <script>
        const log = document.getElementById('log');
        const j = r => r.json();
        const show = (role, content) => {{
            const div = document.createElement('div');
            div.className = 'msg ' + role;
            div.textContent = content;
            log.appendChild(div);
            log.scrollTop = log.scrollHeight;
        }};
        const refresh = () => fetch('/get_chat_history').then(j).then(d => {{
            const ul = document.getElementById('chats');
            ul.innerHTML = '';
            for (const c of d.chats) {{
                const li = document.createElement('li');
                li.textContent = c.title;
                li.onclick = () => fetch('/get_chat_messages/' + c.id).then(j).then(m => {{
                    log.innerHTML = '';
                    m.messages.forEach(x => show(x.role, x.content));
                }});
                ul.appendChild(li);
            }}
        }});
        const newChat = () => fetch('/new_chat', {{method: 'POST'}}).then(j).then(d => {{
            log.innerHTML = '';
            show('assistant', d.welcome_message.content);
            refresh();
        }});
        const sendMessage = e => {{
            e.preventDefault();
            const input = document.getElementById('message');
            const text = input.value.trim();
            if (!text) return false;
            input.value = '';
            show('user', text);
            fetch('/send_message', {{
                method: 'POST',
                headers: {{'Content-Type': 'application/json'}},
                body: JSON.stringify({{message: text}})
            }}).then(j).then(d => show('assistant', d.success ? d.response : 'Error: ' + d.error));
            return false;
        }};
        fetch('/start_chat', {{method: 'POST'}}).then(j).then(d => {{
            show('assistant', d.welcome_message.content);
            refresh();
        }});
    </script>
</body>
</html>"#
    )
}
