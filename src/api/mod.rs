use axum::Router;

pub mod auth;
pub mod club;
pub mod event;
pub mod membership;
pub mod request;
pub mod users;

pub fn app() -> Router {
    Router::new()
        .nest("/auth", auth::app())
        .nest("/users", users::app())
        .nest("/clubs", club::app())
        .nest("/requests", request::app())
        .nest("/memberships", membership::app())
        .nest("/events", event::app())
}
