/// Authentication endpoints
///
/// - `POST /api/auth/register` - create an account and start a session
/// - `POST /api/auth/login` - start a session
/// - `POST /api/auth/refresh` - rotate the token pair
/// - `POST /api/auth/logout` - clear credential cookies
///
/// Sessions are delivered twice: the access token in the JSON body for
/// bearer use, and both tokens as `HttpOnly` cookies. The refresh token is
/// never put in a body.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::AppendHeaders,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smarttask_shared::{
    auth::{
        cookies::{read_cookie, REFRESH_COOKIE},
        jwt::TokenPair,
        password,
    },
    models::user::{CreateUser, UserProfile},
};
use validator::Validate;

type SetCookies = AppendHeaders<[(HeaderName, String); 2]>;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh request; the token may come from the cookie instead
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Register and login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserProfile,
    pub access_token: String,
}

fn session_cookies(state: &AppState, pair: &TokenPair) -> SetCookies {
    AppendHeaders([
        (header::SET_COOKIE, state.cookies.access_cookie(&pair.access_token)),
        (header::SET_COOKIE, state.cookies.refresh_cookie(&pair.refresh_token)),
    ])
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "secret1",
///   "name": "Jane"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "user": {...}, "accessToken": "eyJ..." }` and both
/// credential cookies.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, SetCookies, Json<SessionResponse>)> {
    let Json(mut req) = payload?;
    req.email = req.email.trim().to_string();
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .stores
        .users
        .create(CreateUser {
            email: req.email,
            password_hash,
            name: req.name.unwrap_or_default(),
        })
        .await?;

    let pair = state.tokens.issue_pair(user.id)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        session_cookies(&state, &pair),
        Json(SessionResponse {
            user: user.profile(),
            access_token: pair.access_token,
        }),
    ))
}

/// Login endpoint
///
/// Unknown email and wrong password are indistinguishable to the caller.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(SetCookies, Json<SessionResponse>)> {
    let Json(mut req) = payload?;
    req.email = req.email.trim().to_string();
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let Some(user) = state.stores.users.find_by_email(&req.email).await? else {
        tracing::info!("Login failed: unknown email");
        return Err(invalid());
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let pair = state.tokens.issue_pair(user.id)?;
    tracing::debug!(user_id = %user.id, "User logged in");

    Ok((
        session_cookies(&state, &pair),
        Json(SessionResponse {
            user: user.profile(),
            access_token: pair.access_token,
        }),
    ))
}

/// Token refresh endpoint
///
/// Reads `refreshToken` from the JSON body, falling back to the
/// `refreshToken` cookie. Both tokens are reissued as cookies; the body is
/// `{ "ok": true }`.
///
/// # Errors
///
/// - `400 Bad Request`: no refresh token supplied
/// - `401 Unauthorized`: invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RefreshRequest>>,
) -> ApiResult<(SetCookies, Json<Value>)> {
    let from_body = payload
        .and_then(|Json(body)| body.refresh_token)
        .filter(|token| !token.is_empty());

    let token = from_body
        .or_else(|| read_cookie(&headers, REFRESH_COOKIE).map(str::to_string))
        .ok_or_else(|| ApiError::BadRequest("refreshToken is required".to_string()))?;

    let (user_id, pair) = state.tokens.refresh_session(&token).map_err(|e| {
        tracing::debug!(error = %e, "Refresh token rejected");
        ApiError::Unauthorized("Invalid or expired refresh token".to_string())
    })?;

    tracing::debug!(user_id = %user_id, "Session refreshed");
    Ok((session_cookies(&state, &pair), Json(json!({ "ok": true }))))
}

/// Logout endpoint
///
/// Stateless: tokens already handed out stay valid until they expire.
pub async fn logout(State(state): State<AppState>) -> (SetCookies, Json<Value>) {
    let [access, refresh] = state.cookies.clear_cookies();
    (
        AppendHeaders([(header::SET_COOKIE, access), (header::SET_COOKIE, refresh)]),
        Json(json!({ "ok": true })),
    )
}
