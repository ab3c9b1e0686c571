//! Server-side sessions behind a signed cookie
//!
//! Session records live in the `tower_sessions` table of the application
//! database; the client only holds the record id, signed with a key derived
//! from the configured secret. A cookie whose signature does not verify is
//! ignored and the request starts with an empty session.

use sha2::{Digest, Sha512};
use time::{Duration, OffsetDateTime};
use tower_sessions::{
    Expiry, Session, SessionManagerLayer,
    cookie::{Key, SameSite},
    service::SignedCookie,
    session,
};
use tower_sessions_sqlx_store::SqliteStore;

use crate::settings::SessionSettings;

/// Session key holding the logged-in user's id
pub const USER_ID_KEY: &str = "user_id";

/// Session key holding pending flash messages
pub const FLASHES_KEY: &str = "_flashes";

/// Signing key for the session cookie
///
/// The cookie jar needs 64 bytes of key material, so the secret is stretched
/// with SHA-512. Any secret, including the short development default, works.
pub fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// How long an idle session stays valid
///
/// `None`, or an age too large to put on a calendar, keeps the session for
/// as long as the browser does.
pub fn expiry(max_age_secs: Option<u64>) -> Expiry {
    max_age_secs
        .and_then(|secs| i64::try_from(secs).ok())
        .map(Duration::seconds)
        .filter(|age| OffsetDateTime::now_utc().checked_add(*age).is_some())
        .map_or(Expiry::OnSessionEnd, Expiry::OnInactivity)
}

/// Build the session layer for the router
pub fn session_layer(
    store: SqliteStore,
    settings: &SessionSettings,
) -> SessionManagerLayer<SqliteStore, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(settings.cookie_name.clone())
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(settings.secure)
        .with_expiry(expiry(settings.max_age_secs))
        .with_signed(signing_key(&settings.secret_key))
}

/// The logged-in user's id, if any
pub async fn user_id(session: &Session) -> Result<Option<i64>, session::Error> {
    session.get(USER_ID_KEY).await
}

pub async fn set_user_id(session: &Session, user_id: i64) -> Result<(), session::Error> {
    session.insert(USER_ID_KEY, user_id).await
}

/// Queue a message for the next rendered view
pub async fn flash(session: &Session, message: impl Into<String>) -> Result<(), session::Error> {
    let mut flashes: Vec<String> = session.get(FLASHES_KEY).await?.unwrap_or_default();
    flashes.push(message.into());
    session.insert(FLASHES_KEY, flashes).await
}

/// Remove and return all queued messages, oldest first
pub async fn take_flashes(session: &Session) -> Result<Vec<String>, session::Error> {
    Ok(session
        .remove::<Vec<String>>(FLASHES_KEY)
        .await?
        .unwrap_or_default())
}
