use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::admin_user;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Require the token's subject to still be an admin account.
///
/// Accounts are matched by id first and by email second, so a token survives
/// an account being re-created under the same address.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    let admin = match admin_user::Entity::find_by_id(claims.sub).one(&state.db).await? {
        Some(admin) => Some(admin),
        None => {
            admin_user::Entity::find()
                .filter(admin_user::Column::Email.eq(&claims.email))
                .one(&state.db)
                .await?
        }
    };

    let Some(admin) = admin else {
        tracing::warn!(user_id = %claims.sub, email = %claims.email, "Token holder is not an admin");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    };

    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}
