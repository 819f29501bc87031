use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod guards;
pub mod handlers;
pub mod password;
pub mod services;
pub mod session;
mod extractors;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::guest_routes())
        .merge(handlers::protected_routes())
}
