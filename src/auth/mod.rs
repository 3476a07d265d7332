use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::page_routes())
        .merge(handlers::auth_routes())
}
