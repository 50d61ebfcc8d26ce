use super::users::UserResponse;
use crate::{
    auth::{self, Principal, SharedKeys},
    error::{AppError, AppResult},
    models::{Role, User},
    users::{self, Registration},
    DbPool,
};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizedResponse {
    pub token: String,
    pub user: UserResponse,
}

impl AuthorizedResponse {
    fn from_user(keys: &auth::Keys, user: &User) -> anyhow::Result<AuthorizedResponse> {
        Ok(AuthorizedResponse {
            token: auth::generate_jwt(keys, user.id, user.role)?,
            user: UserResponse::from(user),
        })
    }
}

async fn register(
    pool: DbPool,
    keys: SharedKeys,
    role: Role,
    req: Registration,
) -> AppResult<Json<AuthorizedResponse>> {
    let conn = &mut pool.get().await?;
    let user = users::register(conn, role, req).await?;

    Ok(Json(AuthorizedResponse::from_user(&keys, &user)?))
}

async fn register_member(
    Extension(pool): Extension<DbPool>,
    Extension(keys): Extension<SharedKeys>,
    Json(req): Json<Registration>,
) -> AppResult<Json<AuthorizedResponse>> {
    register(pool, keys, Role::Member, req).await
}

async fn register_coordinator(
    Extension(pool): Extension<DbPool>,
    Extension(keys): Extension<SharedKeys>,
    Json(req): Json<Registration>,
) -> AppResult<Json<AuthorizedResponse>> {
    register(pool, keys, Role::Coordinator, req).await
}

async fn register_officer(
    Extension(pool): Extension<DbPool>,
    Extension(keys): Extension<SharedKeys>,
    Json(req): Json<Registration>,
) -> AppResult<Json<AuthorizedResponse>> {
    register(pool, keys, Role::StudentLifeOfficer, req).await
}

async fn login(
    Extension(pool): Extension<DbPool>,
    Extension(keys): Extension<SharedKeys>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthorizedResponse>> {
    let conn = &mut pool.get().await?;

    if let Some(user) = users::login(conn, &req.email, &req.password).await? {
        return Ok(Json(AuthorizedResponse::from_user(&keys, &user)?));
    }
    Err(AppError::unauthorized("invalid email or password"))
}

async fn me(
    Extension(pool): Extension<DbPool>,
    principal: Principal,
) -> AppResult<Json<UserResponse>> {
    let conn = &mut pool.get().await?;
    let user = users::get(conn, principal.user_id).await?;

    Ok(Json(UserResponse::from(&user)))
}

pub fn app() -> Router {
    Router::new()
        .route("/register/member", post(register_member))
        .route("/register/coordinator", post(register_coordinator))
        .route("/register/officer", post(register_officer))
        .route("/login", post(login))
        .route("/me", get(me))
}
