/// Own-account endpoints
///
/// - `GET /api/profile/me`
/// - `PATCH /api/profile/me`
/// - `POST /api/profile/change-password`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smarttask_shared::{
    auth::{middleware::AuthContext, password},
    models::user::UserProfile,
};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .stores
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(ProfileResponse {
        user: user.profile(),
    }))
}

/// Updates the display name when one is supplied
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<ProfileResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = match req.name {
        Some(name) => state.stores.users.update_name(auth.user_id, &name).await?,
        None => state.stores.users.find_by_id(auth.user_id).await?,
    }
    .ok_or_else(user_not_found)?;

    Ok(Json(ProfileResponse {
        user: user.profile(),
    }))
}

/// Replaces the password after checking the current one
///
/// # Errors
///
/// - `400 Bad Request`: either password missing, or the new one too short
/// - `401 Unauthorized`: current password is wrong
/// - `404 Not Found`: account no longer exists
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;

    let (Some(current), Some(new)) = (
        req.current_password.as_deref().filter(|p| !p.is_empty()),
        req.new_password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "currentPassword and newPassword are required".to_string(),
        ));
    };
    req.validate()?;

    let user = state
        .stores
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if !password::verify_password(current, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let hash = password::hash_password(new)?;
    state
        .stores
        .users
        .update_password_hash(user.id, &hash)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(json!({ "ok": true })))
}
