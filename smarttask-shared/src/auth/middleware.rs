/// Session extraction for protected routes
///
/// Credentials are looked up in priority order:
///
/// 1. `Authorization: Bearer <token>` header
/// 2. `accessToken` cookie
///
/// An `Authorization` header with any other scheme is ignored and the
/// cookie is consulted instead. The token is verified as an access token;
/// on success only the subject's user ID is attached to the request. The
/// credential store is never queried here.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use smarttask_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use super::cookies::{read_cookie, ACCESS_COOKIE};
use super::jwt::{JwtError, TokenKind, TokenService};
use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Authenticated identity added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Subject of the verified access token
    pub user_id: Uuid,
}

/// Error type for session extraction
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither a bearer header nor an access cookie was present
    #[error("Missing credentials")]
    MissingCredentials,

    /// A credential was present but did not verify
    #[error("{0}")]
    InvalidToken(#[from] JwtError),
}

/// Finds the raw access token on a request, header first
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| read_cookie(headers, ACCESS_COOKIE))
}

/// Resolves the request's identity
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when no credential is present
/// - `AuthError::InvalidToken` when the credential fails verification
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = extract_credential(headers).ok_or(AuthError::MissingCredentials)?;
    let user_id = tokens.verify(token, TokenKind::Access)?;
    Ok(AuthContext { user_id })
}
