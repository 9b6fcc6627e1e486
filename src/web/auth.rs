use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::{
    Json, async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts},
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::web::{ApiError, AppState, models::UserProfile};

pub const TOKEN_TTL_HOURS: i64 = 24;

/// Identity resolved from a bearer token; loaded fresh from the database on
/// every request so deactivated or deleted accounts fail closed.
#[derive(Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
}

#[derive(Clone, sqlx::FromRow)]
struct DbUserLogin {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    exp: i64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenError {
    Expired,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed = PasswordHash::new(password_hash);
    match parsed {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn issue_token(user_id: Uuid, secret: &str, ttl: ChronoDuration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (Utc::now() + ttl).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| anyhow!("failed to sign token: {err}"))
}

/// Verifies signature and expiry. Fails closed: anything malformed,
/// unsigned, or expired is rejected outright.
pub fn validate_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Ok(data.claims.sub),
        Err(err) => match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Invalid),
        },
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub async fn fetch_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<AuthUser>> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT id, username, email, is_admin, is_active FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

async fn authenticate(state: &AppState, parts: &Parts) -> Result<AuthUser, ApiError> {
    let token = bearer_token(parts).ok_or(ApiError::Unauthorized("missing bearer token"))?;

    let user_id = validate_token(token, state.token_secret()).map_err(|err| match err {
        TokenError::Expired => ApiError::Unauthorized("token expired"),
        TokenError::Invalid => ApiError::Unauthorized("invalid token"),
    })?;

    let user = fetch_user_by_id(state.pool_ref(), user_id)
        .await?
        .ok_or(ApiError::Unauthorized("user no longer exists"))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("account is inactive"));
    }

    Ok(user)
}

/// Extractor for any authenticated, active user.
pub struct CurrentUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate(&state, parts).await.map(CurrentUser)
    }
}

/// Extractor that additionally requires the administrator role.
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let user = authenticate(&state, parts).await?;

        if !user.is_admin {
            return Err(ApiError::Forbidden("administrator access required"));
        }

        Ok(AdminUser(user))
    }
}

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserProfile,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::Validation("username must not be empty".into()));
    }

    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("a valid email address is required".into()));
    }

    if payload.password.is_empty() {
        return Err(ApiError::Validation("password must not be empty".into()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|err| ApiError::Internal(anyhow!("failed to hash password: {err}")))?;

    let user_id = Uuid::new_v4();
    let result = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .execute(state.pool_ref())
    .await;

    match result {
        Ok(_) => {}
        // 23505 is the Postgres unique-violation code; the constraint name
        // tells us which field collided.
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            let message = match db_err.constraint() {
                Some("users_email_key") => "email already registered",
                _ => "username already registered",
            };
            return Err(ApiError::Conflict(message.into()));
        }
        Err(err) => return Err(err.into()),
    }

    let token = issue_token(
        user_id,
        state.token_secret(),
        ChronoDuration::hours(TOKEN_TTL_HOURS),
    )?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        user: UserProfile {
            id: user_id,
            username: username.to_string(),
            email: email.to_string(),
            is_admin: false,
            is_active: true,
        },
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.trim();

    let user = sqlx::query_as::<_, DbUserLogin>(
        "SELECT id, username, email, password_hash, is_admin, is_active FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(state.pool_ref())
    .await?
    .ok_or(ApiError::Unauthorized("incorrect username or password"))?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("incorrect username or password"));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("account is inactive"));
    }

    let token = issue_token(
        user.id,
        state.token_secret(),
        ChronoDuration::hours(TOKEN_TTL_HOURS),
    )?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        user: UserProfile {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            is_active: user.is_active,
        },
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        username: user.username,
        email: user.email,
        is_admin: user.is_admin,
        is_active: user.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const SECRET: &str = "test-secret";

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("pw123").expect("hash");
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("pw123", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trip_resolves_user_id() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, SECRET, ChronoDuration::hours(1)).expect("token");
        assert_eq!(validate_token(&token, SECRET), Ok(user_id));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let token =
            issue_token(Uuid::new_v4(), SECRET, ChronoDuration::hours(-1)).expect("token");
        assert_eq!(validate_token(&token, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let token =
            issue_token(Uuid::new_v4(), "other-secret", ChronoDuration::hours(1)).expect("token");
        assert_eq!(validate_token(&token, SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn malformed_token_is_invalid() {
        assert_eq!(validate_token("garbage", SECRET), Err(TokenError::Invalid));
        assert_eq!(validate_token("", SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn bearer_token_extraction() {
        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .expect("request")
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let (parts, _) = Request::builder()
            .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
            .body(())
            .expect("request")
            .into_parts();
        assert_eq!(bearer_token(&parts), None);

        let (parts, _) = Request::builder().body(()).expect("request").into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
