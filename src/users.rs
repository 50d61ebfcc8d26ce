use crate::{
    auth,
    error::{ClubError, ClubResult},
    models::{Role, User},
    schema::*,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    fn validate(&self) -> ClubResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(ClubError::validation("first and last name are required"));
        }
        if !self.email.contains('@') {
            return Err(ClubError::validation("invalid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClubError::validation(
                "password must be at least 8 characters",
            ));
        }
        Ok(())
    }
}

pub async fn register(
    conn: &mut AsyncPgConnection,
    role: Role,
    registration: Registration,
) -> anyhow::Result<User> {
    #[derive(Insertable)]
    #[diesel(table_name = users)]
    struct NewUser {
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: Role,
    }

    registration.validate()?;

    let new_user = diesel::insert_into(users::table)
        .values(NewUser {
            email: registration.email.trim().to_lowercase(),
            password_hash: auth::hash_password(registration.password)?,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            role,
        })
        .on_conflict(users::email)
        .do_nothing()
        .get_result::<User>(conn)
        .await
        .optional()
        .map_err(ClubError::from)?;

    let Some(user) = new_user else {
        return Err(ClubError::conflict("email is already registered").into());
    };

    tracing::info!(user_id = user.id, role = %user.role, "user registered");
    Ok(user)
}

/// `None` when the email is unknown or the password does not match.
pub async fn login(
    conn: &mut AsyncPgConnection,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let user = users::table
        .filter(users::email.eq(email.trim().to_lowercase()))
        .first::<User>(conn)
        .await
        .optional()?;

    match user {
        Some(user) if auth::verify_password(password, &user.password_hash)? => Ok(Some(user)),
        _ => Ok(None),
    }
}

pub async fn get(conn: &mut AsyncPgConnection, user_id: i32) -> ClubResult<User> {
    users::table
        .find(user_id)
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or_else(|| ClubError::not_found("user does not exist"))
}

pub async fn list_by_role(conn: &mut AsyncPgConnection, role: Role) -> ClubResult<Vec<User>> {
    Ok(users::table
        .filter(users::role.eq(role))
        .order(users::email.asc())
        .load::<User>(conn)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.org".into(),
            password: "analytical".into(),
        }
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn rejects_incomplete_registration() {
        let cases = [
            Registration {
                first_name: " ".into(),
                ..registration()
            },
            Registration {
                email: "ada.example.org".into(),
                ..registration()
            },
            Registration {
                password: "short".into(),
                ..registration()
            },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(ClubError::Validation(_))));
        }
    }
}
