use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::User,
};
use crate::error::{ApiError, ApiResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub async fn register(db: &SqlitePool, mut payload: RegisterRequest) -> ApiResult<User> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".into()));
    }

    if User::is_taken(db, &payload.username, &payload.email).await? {
        warn!(email = %payload.email, username = %payload.username, "user already registered");
        return Err(ApiError::Conflict("Username or email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    // The pre-check races with concurrent registrations; the unique indexes decide.
    let user = User::create(db, &payload.username, &payload.email, &hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("Username or email already registered".into())
            }
            other => ApiError::from(other),
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Check credentials and issue a token for the user.
pub async fn login(db: &SqlitePool, keys: &JwtKeys, mut payload: LoginRequest) -> ApiResult<String> {
    payload.email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(token)
}
