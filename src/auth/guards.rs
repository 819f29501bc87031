use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{debug, warn};

use super::session::{current_user, CurrentUser};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// `302 Found` to `location`.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

async fn session_user(session: &Session) -> Option<CurrentUser> {
    match current_user(session).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "session load failed; treating as guest");
            None
        }
    }
}

/// Lets authenticated sessions through with a `CurrentUser` extension, sends the rest to the login page.
pub async fn require_auth(session: Session, mut request: Request, next: Next) -> Response {
    let Some(user) = session_user(&session).await else {
        debug!(uri = %request.uri(), "unauthenticated request redirected");
        return found(LOGIN_PATH);
    };
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Sends already authenticated sessions to the dashboard.
pub async fn guest_only(session: Session, request: Request, next: Next) -> Response {
    if session_user(&session).await.is_some() {
        return found(DASHBOARD_PATH);
    }
    next.run(request).await
}
