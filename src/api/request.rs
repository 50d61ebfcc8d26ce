use crate::{
    auth::Principal,
    clock::SharedClock,
    error::AppResult,
    models::{Club, ClubCreationRequest},
    workflow::{self, WorkflowPolicy},
    DbPool,
};
use axum::{
    extract::Path,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct SubmitRequest {
    club_name: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct RejectRequest {
    comment: Option<String>,
}

#[derive(Serialize)]
struct ApprovedResponse {
    request: ClubCreationRequest,
    club: Club,
}

async fn list(
    Extension(pool): Extension<DbPool>,
    principal: Principal,
) -> AppResult<Json<Vec<ClubCreationRequest>>> {
    let conn = &mut pool.get().await?;

    Ok(Json(workflow::list(conn, &principal).await?))
}

async fn info(
    Extension(pool): Extension<DbPool>,
    Path(request_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<ClubCreationRequest>> {
    let conn = &mut pool.get().await?;

    Ok(Json(workflow::get(conn, request_id, &principal).await?))
}

async fn submit(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    principal: Principal,
    Json(req): Json<SubmitRequest>,
) -> AppResult<Json<ClubCreationRequest>> {
    let conn = &mut pool.get().await?;
    let request =
        workflow::submit(conn, &principal, req.club_name, req.description, clock.now()).await?;

    Ok(Json(request))
}

async fn approve(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Extension(policy): Extension<WorkflowPolicy>,
    Path(request_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<ApprovedResponse>> {
    let conn = &mut pool.get().await?;
    let (request, club) =
        workflow::approve(conn, request_id, principal, policy, clock.now()).await?;

    Ok(Json(ApprovedResponse { request, club }))
}

async fn reject(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    Path(request_id): Path<i32>,
    principal: Principal,
    req: Option<Json<RejectRequest>>,
) -> AppResult<Json<ClubCreationRequest>> {
    let conn = &mut pool.get().await?;
    let comment = req.and_then(|Json(req)| req.comment);
    let request = workflow::reject(conn, request_id, principal, comment, clock.now()).await?;

    Ok(Json(request))
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/:request_id", get(info))
        .route("/:request_id/approve", patch(approve))
        .route("/:request_id/reject", patch(reject))
}
