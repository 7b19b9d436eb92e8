use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod validate;

/// Public routes: register and login.
pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Routes that need an authenticated caller.
pub fn protected_router() -> Router<AppState> {
    handlers::me_routes()
}
