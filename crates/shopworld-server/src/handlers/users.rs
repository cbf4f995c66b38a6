use axum::{Json, extract::State};
use shopworld_api::{ApiError, ApiResult};
use shopworld_core::{PublicUser, UserUpdate};

use crate::auth::AuthUser;
use crate::extract::ApiJson;
use crate::password::hash_password;
use crate::server::AppState;

/// Partial profile update. Username and email stay unique across other
/// accounts; a new password is re-hashed.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(mut update): ApiJson<UserUpdate>,
) -> ApiResult<Json<PublicUser>> {
    update.validate()?;

    if let Some(username) = &update.username
        && let Some(other) = state.storage.get_user_by_username(username).await?
        && other.id != user.id
    {
        return Err(ApiError::bad_request("Username already exists"));
    }
    if let Some(email) = &update.email
        && let Some(other) = state.storage.get_user_by_email(email).await?
        && other.id != user.id
    {
        return Err(ApiError::bad_request("Email already exists"));
    }

    if let Some(password) = update.password.take() {
        update.password = Some(hash_password(password).await?);
    }

    let updated = state.storage.update_user(user.id, &update).await?;
    tracing::debug!(user_id = updated.id, "Profile updated");
    Ok(Json(PublicUser::from(updated)))
}
