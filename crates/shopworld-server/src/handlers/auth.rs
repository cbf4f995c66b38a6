//! Registration, login and logout.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shopworld_api::{ApiError, ApiResponse, ApiResult};
use shopworld_core::{NewCartItem, NewUser, PublicUser, User};
use tracing::info;

use crate::auth::AuthUser;
use crate::extract::ApiJson;
use crate::password::{hash_password, verify_password};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Cart kept by the client while the visitor was anonymous.
    #[serde(default)]
    pub guest_cart: Option<Vec<NewCartItem>>,
}

/// Starts a session for `user`, replacing any session the request carried.
fn start_session(
    state: &AppState,
    headers: &HeaderMap,
    user: User,
    response: ApiResponse<PublicUser>,
) -> ApiResult<ApiResponse<PublicUser>> {
    if let Some(previous) = state.sessions.session_id_from_headers(headers) {
        state.sessions.destroy(&previous);
    }
    let session_id = state.sessions.create(user.id);
    let cookie = state
        .sessions
        .build_cookie(&session_id)
        .ok_or_else(|| ApiError::internal("session cookie is not a valid header"))?;
    Ok(response.with_header(SET_COOKIE, cookie))
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(mut payload): ApiJson<NewUser>,
) -> ApiResult<ApiResponse<PublicUser>> {
    payload.validate()?;

    if state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Username already exists"));
    }
    if state
        .storage
        .get_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already exists"));
    }

    payload.password = hash_password(payload.password).await?;
    let user = state.storage.create_user(&payload).await?;
    info!(user_id = user.id, "User registered");

    let response = ApiResponse::created(PublicUser::from(user.clone()));
    start_session(&state, &headers, user, response)
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let invalid = || ApiError::bad_request("Invalid credentials");

    let user = state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(payload.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    if let Some(guest_cart) = payload.guest_cart.filter(|items| !items.is_empty()) {
        let lines = state.storage.merge_cart(user.id, &guest_cart).await?;
        info!(user_id = user.id, lines = lines.len(), "Guest cart merged on login");
    }

    let response = ApiResponse::ok(PublicUser::from(user.clone()));
    start_session(&state, &headers, user, response)
}

pub async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ApiResponse<Value>> {
    if let Some(session_id) = state.sessions.session_id_from_headers(&headers) {
        state.sessions.destroy(&session_id);
    }
    let cookie = state
        .sessions
        .clear_cookie()
        .ok_or_else(|| ApiError::internal("session cookie is not a valid header"))?;
    Ok(ApiResponse::ok(json!({ "message": "Logged out successfully" }))
        .with_header(SET_COOKIE, cookie))
}
