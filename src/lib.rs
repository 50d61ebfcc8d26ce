use axum::Router;
use deadpool::managed::Pool;
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};

pub mod api;
pub mod auth;
pub mod clock;
pub mod club;
pub mod config;
pub mod error;
pub mod event;
pub mod membership;
pub mod models;
pub mod permissions;
pub mod schema;
pub mod users;
pub mod workflow;

pub type DbPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub fn connect_to_db(db_url: &str) -> anyhow::Result<DbPool> {
    let db_config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    Ok(Pool::builder(db_config).build()?)
}

pub fn app() -> Router {
    Router::new().nest("/api", api::app())
}
