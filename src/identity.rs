//! Cookie-backed browser identity.
//!
//! Each browser carries two signed cookies: an opaque `user_id` token that
//! scopes all of its chat data, and an optional `current_chat_id`
//! back-reference to the thread the next send targets. The back-reference is
//! never trusted blindly; handlers validate it against the store on use.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use uuid::Uuid;

/// Cookie holding the opaque per-browser user token.
pub const USER_COOKIE: &str = "user_id";

/// Cookie holding the current chat back-reference.
pub const CURRENT_CHAT_COOKIE: &str = "current_chat_id";

/// Get the caller's user id, if one has been established.
#[must_use]
pub fn user_id(jar: &SignedCookieJar) -> Option<String> {
    jar.get(USER_COOKIE).map(|c| c.value().to_string())
}

/// Get the caller's current chat id, if set.
#[must_use]
pub fn current_chat(jar: &SignedCookieJar) -> Option<String> {
    jar.get(CURRENT_CHAT_COOKIE).map(|c| c.value().to_string())
}

/// First-visit setup: mint a user id and clear the current chat. Returning
/// visitors keep their cookies untouched.
#[must_use]
pub fn establish(jar: SignedCookieJar) -> SignedCookieJar {
    if jar.get(USER_COOKIE).is_some() {
        return jar;
    }
    let id = Uuid::new_v4().to_string();
    tracing::debug!(user_id = %id, "Established new browser identity");
    clear_current_chat(jar.add(session_cookie(USER_COOKIE, id)))
}

/// Get the caller's user id, minting one if absent.
#[must_use]
pub fn ensure_user(jar: SignedCookieJar) -> (SignedCookieJar, String) {
    if let Some(id) = user_id(&jar) {
        return (jar, id);
    }
    let id = Uuid::new_v4().to_string();
    tracing::debug!(user_id = %id, "Established new browser identity");
    let jar = jar.add(session_cookie(USER_COOKIE, id.clone()));
    (jar, id)
}

/// Point the current-chat back-reference at the given thread.
#[must_use]
pub fn set_current_chat(jar: SignedCookieJar, chat_id: &str) -> SignedCookieJar {
    jar.add(session_cookie(CURRENT_CHAT_COOKIE, chat_id.to_string()))
}

/// Drop the current-chat back-reference.
#[must_use]
pub fn clear_current_chat(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(session_cookie(CURRENT_CHAT_COOKIE, String::new()))
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
