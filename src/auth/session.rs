use axum::Router;
use sha2::{Digest, Sha512};
use time::Duration;
use tower_sessions::{
    cookie::{Key, SameSite},
    session, Expiry, Session, SessionManagerLayer, SessionStore,
};

use crate::config::AppConfig;
use crate::users::User;

pub const SESSION_NAME: &str = "app-session";
pub const IS_AUTH_KEY: &str = "authenticated";
pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
pub const SESSION_MAX_AGE_DAYS: i64 = 7;

/// Identity carried by an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

/// `None` unless the authenticated flag is true and both id and username are set.
pub async fn current_user(session: &Session) -> Result<Option<CurrentUser>, session::Error> {
    let authenticated = session.get::<bool>(IS_AUTH_KEY).await?.unwrap_or(false);
    if !authenticated {
        return Ok(None);
    }
    let id = session.get::<i32>(USER_ID_KEY).await?;
    let username = session.get::<String>(USERNAME_KEY).await?;
    Ok(id
        .zip(username)
        .map(|(id, username)| CurrentUser { id, username }))
}

/// Moves the caller onto a new session id and marks it authenticated as `user`.
pub async fn sign_in(session: &Session, user: &User) -> Result<(), session::Error> {
    session.cycle_id().await?;
    session.insert(IS_AUTH_KEY, true).await?;
    session.insert(USER_ID_KEY, user.id).await?;
    session.insert(USERNAME_KEY, &user.username).await?;
    session.save().await
}

/// Clears every flag, deletes the stored row and expires the cookie.
pub async fn sign_out(session: &Session) -> Result<(), session::Error> {
    session.flush().await
}

/// Cookie signing needs a 64-byte key, so the configured secret is stretched with SHA-512.
fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub fn with_sessions<S>(router: Router, store: S, config: &AppConfig) -> Router
where
    S: SessionStore + Clone,
{
    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_NAME)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Strict)
        .with_secure(config.environment.is_production())
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_MAX_AGE_DAYS)))
        .with_signed(signing_key(&config.session_secret));
    router.layer(layer)
}
