use crate::{
    auth::Principal,
    clock::SharedClock,
    error::AppResult,
    event::{self, EventChanges, EventFields},
    models::Event,
    DbPool,
};
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(flatten)]
    event: Event,
    is_upcoming: bool,
    is_past: bool,
}

impl EventResponse {
    pub fn new(event: Event, now: DateTime<Utc>) -> Self {
        EventResponse {
            is_upcoming: event.is_upcoming(now),
            is_past: event.is_past(now),
            event,
        }
    }
}

pub fn event_responses(events: Vec<Event>, now: DateTime<Utc>) -> Vec<EventResponse> {
    events
        .into_iter()
        .map(|event| EventResponse::new(event, now))
        .collect()
}

#[derive(Deserialize)]
struct CreateEventRequest {
    club: i32,
    #[serde(flatten)]
    fields: EventFields,
}

async fn create(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    principal: Principal,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<Json<EventResponse>> {
    let conn = &mut pool.get().await?;
    let event = event::create(conn, &principal, req.club, req.fields).await?;

    Ok(Json(EventResponse::new(event, clock.now())))
}

async fn by_club(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Path(club_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<Vec<EventResponse>>> {
    let conn = &mut pool.get().await?;
    let events = event::list_by_club(conn, &principal, club_id).await?;

    Ok(Json(event_responses(events, clock.now())))
}

async fn info(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Path(event_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<EventResponse>> {
    let conn = &mut pool.get().await?;
    let event = event::get(conn, &principal, event_id).await?;

    Ok(Json(EventResponse::new(event, clock.now())))
}

async fn update(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Path(event_id): Path<i32>,
    principal: Principal,
    Json(req): Json<EventChanges>,
) -> AppResult<Json<EventResponse>> {
    let conn = &mut pool.get().await?;
    let event = event::update(conn, &principal, event_id, req).await?;

    Ok(Json(EventResponse::new(event, clock.now())))
}

async fn remove(
    Extension(pool): Extension<DbPool>,
    Path(event_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<()>> {
    let conn = &mut pool.get().await?;
    event::delete(conn, &principal, event_id).await?;

    Ok(Json(()))
}

pub fn app() -> Router {
    Router::new()
        .route("/", post(create))
        .route("/by-club/:club_id", get(by_club))
        .route("/:event_id", get(info).put(update).delete(remove))
}
