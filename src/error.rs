use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Failure of a club, request, membership or event operation.
///
/// None of these are retried; the boundary maps each kind to a status code.
#[derive(Debug, Error)]
pub enum ClubError {
    #[error("validation error: {0}")]
    Validation(Cow<'static, str>),
    #[error("permission denied: {0}")]
    Permission(Cow<'static, str>),
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("conflict: {0}")]
    Conflict(Cow<'static, str>),
    #[error("database error: {0}")]
    Database(DieselError),
}

pub type ClubResult<T> = Result<T, ClubError>;

impl ClubError {
    pub fn validation(s: impl Into<Cow<'static, str>>) -> Self {
        ClubError::Validation(s.into())
    }

    pub fn permission(s: impl Into<Cow<'static, str>>) -> Self {
        ClubError::Permission(s.into())
    }

    pub fn not_found(s: impl Into<Cow<'static, str>>) -> Self {
        ClubError::NotFound(s.into())
    }

    pub fn conflict(s: impl Into<Cow<'static, str>>) -> Self {
        ClubError::Conflict(s.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ClubError::Validation(_) => StatusCode::BAD_REQUEST,
            ClubError::Permission(_) => StatusCode::FORBIDDEN,
            ClubError::NotFound(_) => StatusCode::NOT_FOUND,
            ClubError::Conflict(_) => StatusCode::CONFLICT,
            ClubError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DieselError> for ClubError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => ClubError::not_found("record does not exist"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ClubError::conflict(unique_violation_message(info.constraint_name()))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ClubError::not_found("referenced record does not exist")
            }
            e => ClubError::Database(e),
        }
    }
}

/// Client-facing text for a violated unique constraint. Postgres' own
/// message names tables and columns, so it is never passed through.
fn unique_violation_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_key") => "email is already registered",
        Some("clubs_coordinator_id_key") => "the coordinator already manages a club",
        Some("clubs_creation_request_id_key") => "a club already exists for this request",
        Some("memberships_user_id_club_id_key") => "already a member of this club",
        _ => "record already exists",
    }
}

/// Turns a denied policy decision into a [`ClubError::Permission`].
pub fn ensure(allowed: bool, s: impl Into<Cow<'static, str>>) -> ClubResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(ClubError::permission(s))
    }
}

#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    ResponseStatusError(StatusCode, Cow<'static, str>),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct AppErrorResponse {
            status: u16,
            message: Cow<'static, str>,
        }

        match self {
            AppError::InternalServerError(err) => {
                tracing::error!(error = ?err, "request failed");
                AppError::from(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                    .into_response()
            }
            AppError::ResponseStatusError(code, s) => (
                code,
                Json(AppErrorResponse {
                    status: code.as_u16(),
                    message: s,
                }),
            )
                .into_response(),
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> AppError {
        match e.into().downcast::<ClubError>() {
            Ok(ClubError::Database(e)) => AppError::InternalServerError(e.into()),
            Ok(e) => AppError::ResponseStatusError(e.status(), e.to_string().into()),
            Err(e) => AppError::InternalServerError(e),
        }
    }
}

impl AppError {
    pub fn from(code: StatusCode, s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::ResponseStatusError(code, s.into())
    }

    pub fn unauthorized(s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::from(StatusCode::UNAUTHORIZED, s)
    }
}
