use crate::{
    auth::Principal,
    clock::SharedClock,
    error::AppResult,
    membership,
    models::{ClubRole, Membership, MembershipStatus},
    DbPool,
};
use axum::{
    extract::Path,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    #[serde(flatten)]
    membership: Membership,
    is_admin: bool,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        MembershipResponse {
            is_admin: membership.is_admin(),
            membership,
        }
    }
}

#[derive(Deserialize)]
struct JoinRequest {
    club: i32,
}

#[derive(Deserialize)]
struct StatusRequest {
    status: MembershipStatus,
}

#[derive(Deserialize)]
struct RoleRequest {
    role: ClubRole,
}

async fn join(
    Extension(pool): Extension<DbPool>,
    Extension(clock): Extension<SharedClock>,
    principal: Principal,
    Json(req): Json<JoinRequest>,
) -> AppResult<Json<MembershipResponse>> {
    let conn = &mut pool.get().await?;
    let membership = membership::join(conn, &principal, req.club, clock.now()).await?;

    Ok(Json(membership.into()))
}

async fn info(
    Extension(pool): Extension<DbPool>,
    Path(membership_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<MembershipResponse>> {
    let conn = &mut pool.get().await?;
    let membership = membership::get(conn, membership_id, &principal).await?;

    Ok(Json(membership.into()))
}

async fn leave(
    Extension(pool): Extension<DbPool>,
    Path(membership_id): Path<i32>,
    principal: Principal,
) -> AppResult<Json<()>> {
    let conn = &mut pool.get().await?;
    membership::leave(conn, membership_id, &principal).await?;

    Ok(Json(()))
}

async fn set_status(
    Extension(pool): Extension<DbPool>,
    Path(membership_id): Path<i32>,
    principal: Principal,
    Json(req): Json<StatusRequest>,
) -> AppResult<Json<MembershipResponse>> {
    let conn = &mut pool.get().await?;
    let membership = membership::set_status(conn, membership_id, req.status, principal).await?;

    Ok(Json(membership.into()))
}

async fn set_role(
    Extension(pool): Extension<DbPool>,
    Path(membership_id): Path<i32>,
    principal: Principal,
    Json(req): Json<RoleRequest>,
) -> AppResult<Json<MembershipResponse>> {
    let conn = &mut pool.get().await?;
    let membership = membership::set_role(conn, membership_id, req.role, principal).await?;

    Ok(Json(membership.into()))
}

pub fn app() -> Router {
    Router::new()
        .route("/", post(join))
        .route("/:membership_id", get(info).delete(leave))
        .route("/:membership_id/status", patch(set_status))
        .route("/:membership_id/role", patch(set_role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn response_flattens_membership_and_flags_admins() {
        let membership = Membership {
            id: 5,
            user_id: 4,
            club_id: 7,
            joined_at: Utc.with_ymd_and_hms(2025, 4, 21, 12, 0, 0).unwrap(),
            status: MembershipStatus::Active,
            club_role: ClubRole::VicePresident,
        };
        let json = serde_json::to_value(MembershipResponse::from(membership)).unwrap();

        assert_eq!(json["user"], 4);
        assert_eq!(json["club"], 7);
        assert_eq!(json["status"], "active");
        assert_eq!(json["club_role"], "vice_president");
        assert_eq!(json["isAdmin"], true);
    }
}
