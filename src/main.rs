use axum::{http::Method, Extension};
use club_hub::{
    auth::{Keys, SharedKeys},
    clock::{SharedClock, SystemClock},
    config::Config,
    connect_to_db,
};
use envconfig::Envconfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("club_hub=info,tower_http=info")),
        )
        .init();

    let config = Config::init_from_env()?;
    let keys: SharedKeys = Arc::new(Keys::from_base64_secret(
        &config.jwt_secret,
        config.token_ttl(),
    )?);
    let policy = config.workflow_policy()?;
    let clock: SharedClock = Arc::new(SystemClock);

    let pool = connect_to_db(&config.db_url)?;
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);
    let app = club_hub::app()
        .layer(Extension(pool))
        .layer(Extension(keys))
        .layer(Extension(clock))
        .layer(Extension(policy))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
