/// Plan management
///
/// ```text
/// POST /api/subscription/upgrade
/// ```
///
/// Moves the caller to the premium plan, lifting the free-tier task
/// ceiling. There is no payment step and no downgrade.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::profile::ProfileResponse,
};
use axum::{extract::State, Extension, Json};
use smarttask_shared::{auth::middleware::AuthContext, models::user::PlanTier};

pub async fn upgrade(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .stores
        .users
        .set_plan(auth.user_id, PlanTier::Premium)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Plan upgraded to premium");
    Ok(Json(ProfileResponse {
        user: user.profile(),
    }))
}
