use super::{
    event::{event_responses, EventResponse},
    membership::MembershipResponse,
    users::{user_responses, UserResponse},
};
use crate::{
    auth::Principal,
    clock::SharedClock,
    club::{self, ClubChanges, ClubFields},
    error::AppResult,
    event, membership,
    models::Club,
    DbPool,
};
use axum::{extract::Path, routing::get, Extension, Json, Router};
use diesel_async::AsyncPgConnection;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClubResponse {
    #[serde(flatten)]
    club: Club,
    member_count: usize,
}

async fn load_clubs(conn: &mut AsyncPgConnection, clubs: Vec<Club>) -> AppResult<Vec<ClubResponse>> {
    Ok(club::with_member_counts(conn, clubs)
        .await?
        .into_iter()
        .map(|(club, member_count)| ClubResponse { club, member_count })
        .collect())
}

async fn load_club(conn: &mut AsyncPgConnection, club: Club) -> AppResult<ClubResponse> {
    Ok(load_clubs(conn, vec![club])
        .await?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("`load_clubs` should return one club"))?)
}

async fn list(
    Extension(pool): Extension<DbPool>,
    _: Principal,
) -> AppResult<Json<Vec<ClubResponse>>> {
    let conn = &mut pool.get().await?;
    let clubs = club::list(conn).await?;

    Ok(Json(load_clubs(conn, clubs).await?))
}

async fn info(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    _: Principal,
) -> AppResult<Json<ClubResponse>> {
    let conn = &mut pool.get().await?;
    let club = club::get(conn, club_id).await?;

    Ok(Json(load_club(conn, club).await?))
}

async fn create(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    principal: Principal,
    Json(req): Json<ClubFields>,
) -> AppResult<Json<ClubResponse>> {
    let conn = &mut pool.get().await?;
    let club = club::create(conn, &principal, req, clock.now()).await?;

    Ok(Json(load_club(conn, club).await?))
}

async fn update(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    principal: Principal,
    Json(req): Json<ClubChanges>,
) -> AppResult<Json<ClubResponse>> {
    let conn = &mut pool.get().await?;
    let club = club::update(conn, &principal, club_id, req).await?;

    Ok(Json(load_club(conn, club).await?))
}

async fn remove(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<()>> {
    let conn = &mut pool.get().await?;
    club::delete(conn, &principal, club_id).await?;

    Ok(Json(()))
}

async fn members(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    _: Principal,
) -> AppResult<Json<Vec<UserResponse>>> {
    let conn = &mut pool.get().await?;
    let users = club::members(conn, club_id).await?;

    Ok(Json(user_responses(&users)))
}

async fn memberships(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<Vec<MembershipResponse>>> {
    let conn = &mut pool.get().await?;
    let memberships = membership::list_by_club(conn, club_id, &principal).await?;

    Ok(Json(
        memberships.into_iter().map(MembershipResponse::from).collect(),
    ))
}

async fn events(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Path(club_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<Vec<EventResponse>>> {
    let conn = &mut pool.get().await?;
    let events = event::list_by_club(conn, &principal, club_id).await?;

    Ok(Json(event_responses(events, clock.now())))
}

async fn coordinator(
    Extension(pool): Extension<DbPool>,
    Path(club_id): Path<i32>,
    _: Principal,
) -> AppResult<Json<UserResponse>> {
    let conn = &mut pool.get().await?;
    let user = club::coordinator(conn, club_id).await?;

    Ok(Json(UserResponse::from(&user)))
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:club_id", get(info).put(update).delete(remove))
        .route("/:club_id/members", get(members))
        .route("/:club_id/memberships", get(memberships))
        .route("/:club_id/events", get(events))
        .route("/:club_id/coordinator", get(coordinator))
}
