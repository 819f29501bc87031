use axum::{
    extract::{rejection::FormRejection, FromRef, State},
    http::StatusCode,
    middleware,
    response::{Html, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tower_sessions::Session;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        dto::{api_error, ApiError, DashboardResponse, LoginForm, ProfileResponse},
        guards::{found, guest_only, require_auth, DASHBOARD_PATH, LOGIN_PATH},
        services::{AuthError, AuthService},
        session::{sign_in, sign_out, CurrentUser},
    },
    state::AppState,
};

const LOGIN_FORM: &str = r#"<form method="POST" action="/login">
    <input type="text" name="username" placeholder="Username" required>
    <input type="password" name="password" placeholder="Password" required>
    <button type="submit">Login</button>
</form>
"#;

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        AuthService::new(state.users.clone())
    }
}

pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(show_login).post(login))
        .route_layer(middleware::from_fn(guest_only))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/logout", post(logout))
        .route("/api/profile", get(profile))
        .route_layer(middleware::from_fn(require_auth))
}

pub async fn show_login() -> Html<&'static str> {
    Html(LOGIN_FORM)
}

#[instrument(skip_all)]
pub async fn login(
    State(auth): State<AuthService>,
    session: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            debug!(error = %e, "login body is not a form");
            LoginForm::default()
        }
    };
    if form.username.trim().is_empty() || form.password.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        ));
    }

    let user = match auth.validate_credentials(&form.username, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            return Err(api_error(StatusCode::UNAUTHORIZED, "Invalid credentials"));
        }
        Err(e) => {
            error!(error = %e, "credential validation failed");
            return Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to validate credentials",
            ));
        }
    };

    if let Err(e) = sign_in(&session, &user).await {
        error!(error = %e, user_id = user.id, "session save failed");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save session",
        ));
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(found(DASHBOARD_PATH))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn logout(user: CurrentUser, session: Session) -> Result<Response, ApiError> {
    if let Err(e) = sign_out(&session).await {
        error!(error = %e, "session flush failed");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to clear session",
        ));
    }
    info!(username = %user.username, "user logged out");
    Ok(found(LOGIN_PATH))
}

pub async fn dashboard(user: CurrentUser) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        message: format!("Welcome to dashboard, {}!", user.username),
        user_id: user.id,
    })
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    match state.users.find_by_id(user.id).await {
        Ok(Some(record)) => Ok(Json(record.into())),
        Ok(None) => Err(api_error(StatusCode::UNAUTHORIZED, "User not found")),
        Err(e) => {
            error!(error = %e, user_id = user.id, "profile lookup failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get user info",
            ))
        }
    }
}
