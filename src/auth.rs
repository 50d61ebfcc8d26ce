use crate::{error::AppError, models::Role};
use argon2::Argon2;
use axum::{
    async_trait,
    extract::{FromRequest, RequestParts},
    headers::{authorization::Bearer, Authorization},
    Extension, TypedHeader,
};
use jsonwebtoken::{
    errors::Result as JwtResult, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

pub fn hash_password(password: impl AsRef<[u8]>) -> password_hash::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_ref(), &salt)
        .map(|h| h.to_string())
}

pub fn verify_password(
    password: impl AsRef<[u8]>,
    password_hash: impl AsRef<str>,
) -> password_hash::Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash.as_ref())?;
    Ok(Argon2::default()
        .verify_password(password.as_ref(), &parsed_hash)
        .is_ok())
}

pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Keys {
    pub fn from_base64_secret(secret: &str, ttl: Duration) -> JwtResult<Keys> {
        Ok(Keys {
            encoding: EncodingKey::from_base64_secret(secret)?,
            decoding: DecodingKey::from_base64_secret(secret)?,
            ttl,
        })
    }
}

pub type SharedKeys = Arc<Keys>;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub exp: u64,
}

pub fn generate_jwt(keys: &Keys, user_id: i32, role: Role) -> JwtResult<String> {
    jsonwebtoken::encode(
        &Header::default(),
        &Claims {
            sub: user_id,
            role,
            exp: jsonwebtoken::get_current_timestamp() + keys.ttl.as_secs(),
        },
        &keys.encoding,
    )
}

pub fn validate_jwt(keys: &Keys, token: &str) -> JwtResult<TokenData<Claims>> {
    jsonwebtoken::decode::<Claims>(token, &keys.decoding, &Validation::default())
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: i32, role: Role) -> Self {
        Principal { user_id, role }
    }
}

impl From<&crate::models::User> for Principal {
    fn from(user: &crate::models::User) -> Self {
        Principal::new(user.id, user.role)
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for Principal {
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request(req)
                .await
                .map_err(|_| AppError::unauthorized("missing bearer token"))?;
        let Extension(keys) = Extension::<SharedKeys>::from_request(req)
            .await
            .map_err(|e| anyhow::anyhow!("token keys are not configured: {e}"))?;

        let claims = validate_jwt(&keys, bearer.token())
            .map_err(|_| AppError::unauthorized("invalid or expired token"))?
            .claims;

        Ok(Principal::new(claims.sub, claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of "club hub test secret, not for production"
    const SECRET: &str = "Y2x1YiBodWIgdGVzdCBzZWNyZXQsIG5vdCBmb3IgcHJvZHVjdGlvbg==";

    fn keys() -> Keys {
        Keys::from_base64_secret(SECRET, Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn token_carries_user_and_role() {
        let keys = keys();
        let token = generate_jwt(&keys, 42, Role::Coordinator).unwrap();
        let claims = validate_jwt(&keys, &token).unwrap().claims;
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Coordinator);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = generate_jwt(&keys(), 1, Role::Member).unwrap();
        let other = Keys::from_base64_secret("b3RoZXIgc2VjcmV0", Duration::from_secs(60)).unwrap();
        assert!(validate_jwt(&other, &token).is_err());
    }

    #[test]
    fn invalid_secret_is_reported() {
        assert!(Keys::from_base64_secret("not base64!", Duration::from_secs(60)).is_err());
    }
}
