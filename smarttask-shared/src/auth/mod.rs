/// Authentication primitives
///
/// # Modules
///
/// - [`jwt`]: access/refresh token issuance, verification and rotation
/// - [`cookies`]: `Set-Cookie` construction and `Cookie` parsing
/// - [`middleware`]: request identity extraction (bearer header, then cookie)
/// - [`password`]: Argon2id hashing
///
/// # Example
///
/// ```
/// use smarttask_shared::auth::cookies::CookiePolicy;
/// use smarttask_shared::auth::jwt::{TokenConfig, TokenService};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new(
///     "access-secret-at-least-32-bytes-long!",
///     "refresh-secret-at-least-32-bytes-long",
/// ));
/// let pair = tokens.issue_pair(Uuid::new_v4())?;
///
/// let policy = CookiePolicy::default();
/// let header = policy.access_cookie(&pair.access_token);
/// assert!(header.contains("HttpOnly"));
/// # Ok(())
/// # }
/// ```

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;
