//! Session authentication extractors.
//!
//! ```ignore
//! async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
//! ```

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use shopworld_api::ApiError;
use shopworld_core::User;

use crate::server::AppState;

/// The user behind the request's session cookie.
///
/// Rejects with 401 "Not authenticated" when there is no live session, and
/// with 401 "User not found" (destroying the session) when the session
/// outlived its user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let session_id = state
            .sessions
            .session_id_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;
        let user_id = state
            .sessions
            .user_id(&session_id)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        match state.storage.get_user(user_id).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                tracing::debug!(user_id, "Session refers to a missing user");
                state.sessions.destroy(&session_id);
                Err(ApiError::unauthorized("User not found"))
            }
        }
    }
}

/// An authenticated user with the admin flag; 403 "Not authorized" otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            tracing::debug!(user_id = user.id, "Admin access denied");
            return Err(ApiError::forbidden("Not authorized"));
        }
        Ok(AdminUser(user))
    }
}
