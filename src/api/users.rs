use crate::{
    auth::Principal,
    error::AppResult,
    models::{Role, User},
    users, DbPool,
};
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    full_name: String,
    role: Role,
    profile_picture_url: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role,
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}

pub fn user_responses(users: &[User]) -> Vec<UserResponse> {
    users.iter().map(UserResponse::from).collect()
}

async fn list_by_role(pool: DbPool, role: Role) -> AppResult<Json<Vec<UserResponse>>> {
    let conn = &mut pool.get().await?;
    let users = users::list_by_role(conn, role).await?;

    Ok(Json(user_responses(&users)))
}

async fn coordinators(
    Extension(pool): Extension<DbPool>,
    _: Principal,
) -> AppResult<Json<Vec<UserResponse>>> {
    list_by_role(pool, Role::Coordinator).await
}

async fn members(
    Extension(pool): Extension<DbPool>,
    _: Principal,
) -> AppResult<Json<Vec<UserResponse>>> {
    list_by_role(pool, Role::Member).await
}

async fn officers(
    Extension(pool): Extension<DbPool>,
    _: Principal,
) -> AppResult<Json<Vec<UserResponse>>> {
    list_by_role(pool, Role::StudentLifeOfficer).await
}

pub fn app() -> Router {
    Router::new()
        .route("/coordinators", get(coordinators))
        .route("/members", get(members))
        .route("/officers", get(officers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_never_exposes_the_password_hash() {
        let user = User {
            id: 3,
            email: "grace@example.org".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            role: Role::StudentLifeOfficer,
            profile_picture_url: None,
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["fullName"], "Grace Hopper");
        assert_eq!(json["role"], "student_life_officer");
        assert!(!json.to_string().contains("argon2"));
    }
}
