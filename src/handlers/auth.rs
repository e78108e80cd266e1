use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Extension, Json};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::admin_user;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::create_token;
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AdminInfo,
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub id: Uuid,
    pub email: String,
}

impl From<admin_user::Model> for AdminInfo {
    fn from(admin: admin_user::Model) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim();

    let admin = admin_user::Entity::find()
        .filter(admin_user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            tracing::info!(email = %email, "Login for unknown account");
            AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

    let parsed_hash = PasswordHash::new(&admin.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            tracing::info!(email = %email, "Login with wrong password");
            AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
        })?;

    let token = create_token(
        admin.id,
        &admin.email,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(AuthResponse {
        token,
        user: admin.into(),
    }))
}

/// The admin behind the current token
pub async fn me(Extension(admin): Extension<admin_user::Model>) -> Json<AdminInfo> {
    Json(admin.into())
}
