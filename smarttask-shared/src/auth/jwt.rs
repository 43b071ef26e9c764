/// Session token issuance and verification
///
/// Two HS256-signed token kinds share one claim shape (`sub`, `iat`, `exp`):
///
/// - **Access token**: short-lived (8 hours by default), presented on every
///   protected request
/// - **Refresh token**: longer-lived (7 days by default), only exchanged for
///   a new pair
///
/// Each kind has its own secret, so a refresh token never verifies as an
/// access token and vice versa. Verification is stateless: there is no
/// server-side session table, so a rotated refresh token stays usable until
/// it expires.
///
/// # Example
///
/// ```
/// use smarttask_shared::auth::jwt::{TokenConfig, TokenKind, TokenService};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(TokenConfig::new(
///     "access-secret-at-least-32-bytes-long!",
///     "refresh-secret-at-least-32-bytes-long",
/// ));
///
/// let user_id = Uuid::new_v4();
/// let pair = tokens.issue_pair(user_id)?;
/// assert_eq!(tokens.verify(&pair.access_token, TokenKind::Access)?, user_id);
/// assert!(tokens.verify(&pair.refresh_token, TokenKind::Access).is_err());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error type for token operations
///
/// Every verification failure (bad signature, expiry, malformed input) means
/// the same thing to callers: the token is invalid.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature mismatch or malformed token
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Which of the two token kinds is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Token claims: subject and validity window only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: issued_at
                .checked_add_signed(ttl)
                .map_or(i64::MAX, |expires| expires.timestamp()),
        }
    }
}

/// Secrets and lifetimes for both token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Default lifetimes: 8 hours for access, 7 days for refresh
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::hours(8),
            refresh_ttl: Duration::days(7),
        }
    }
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            access: SigningKeys::new(&config.access_secret, config.access_ttl),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    /// Signs a token of `kind` for `user_id` as of `now`
    ///
    /// Deterministic for a given secret, subject and clock reading.
    pub fn issue_at(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let keys = self.keys(kind);
        let claims = Claims::new(user_id, now, keys.ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(TokenKind::Access, user_id, Utc::now())
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(TokenKind::Refresh, user_id, Utc::now())
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Verifies `token` as a token of `kind` and returns its subject
    ///
    /// # Errors
    ///
    /// - `JwtError::Expired` once `exp` has passed (no leeway)
    /// - `JwtError::InvalidToken` on signature mismatch, including a token
    ///   of the other kind, or malformed input
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, JwtError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(data.claims.sub)
    }

    /// Exchanges a valid refresh token for a brand-new pair
    ///
    /// The presented refresh token is not revoked; it remains valid until
    /// its own expiry.
    pub fn refresh_session(&self, refresh_token: &str) -> Result<(Uuid, TokenPair), JwtError> {
        let user_id = self.verify(refresh_token, TokenKind::Refresh)?;
        Ok((user_id, self.issue_pair(user_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "test-access-secret-at-least-32-bytes";
    const REFRESH: &str = "test-refresh-secret-at-least-32-bytes";

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(ACCESS, REFRESH))
    }

    #[test]
    fn test_default_lifetimes() {
        let tokens = service();
        assert_eq!(tokens.ttl(TokenKind::Access), Duration::hours(8));
        assert_eq!(tokens.ttl(TokenKind::Refresh), Duration::days(7));
    }

    #[test]
    fn test_claims_expiry_saturates() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), now, Duration::days(365 * 1_000_000));
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, i64::MAX);

        let claims = Claims::new(Uuid::new_v4(), now, Duration::hours(1));
        assert_eq!(claims.exp, now.timestamp() + 3600);
    }

    #[test]
    fn test_issue_and_verify_each_kind() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let access = tokens.issue_access_token(user_id).unwrap();
        let refresh = tokens.issue_refresh_token(user_id).unwrap();

        assert_eq!(tokens.verify(&access, TokenKind::Access).unwrap(), user_id);
        assert_eq!(tokens.verify(&refresh, TokenKind::Refresh).unwrap(), user_id);
    }

    #[test]
    fn test_kinds_do_not_cross_verify() {
        let tokens = service();
        let pair = tokens.issue_pair(Uuid::new_v4()).unwrap();

        assert!(matches!(
            tokens.verify(&pair.refresh_token, TokenKind::Access),
            Err(JwtError::InvalidToken(_))
        ));
        assert!(matches!(
            tokens.verify(&pair.access_token, TokenKind::Refresh),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = service().issue_access_token(Uuid::new_v4()).unwrap();
        let other = TokenService::new(TokenConfig::new(
            "a-completely-different-access-secret",
            REFRESH,
        ));

        assert!(matches!(
            other.verify(&token, TokenKind::Access),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        let tokens = service();
        // Issued nine hours ago with an eight-hour lifetime
        let issued = Utc::now() - Duration::hours(9);
        let token = tokens
            .issue_at(TokenKind::Access, Uuid::new_v4(), issued)
            .unwrap();

        assert!(matches!(
            tokens.verify(&token, TokenKind::Access),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_issue_is_deterministic_for_a_clock_reading() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let a = tokens.issue_at(TokenKind::Access, user_id, now).unwrap();
        let b = tokens.issue_at(TokenKind::Access, user_id, now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service();
        for garbage in ["", "not.a.jwt", "abc"] {
            assert!(tokens.verify(garbage, TokenKind::Access).is_err());
        }
    }

    #[test]
    fn test_refresh_session_rotates_pair() {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let refresh = tokens
            .issue_at(TokenKind::Refresh, user_id, Utc::now() - Duration::hours(1))
            .unwrap();

        let (subject, pair) = tokens.refresh_session(&refresh).unwrap();
        assert_eq!(subject, user_id);
        assert_ne!(pair.refresh_token, refresh);
        assert_eq!(tokens.verify(&pair.access_token, TokenKind::Access).unwrap(), user_id);

        // No revocation list: the old refresh token still works
        assert!(tokens.refresh_session(&refresh).is_ok());
    }

    #[test]
    fn test_refresh_with_access_token_fails() {
        let tokens = service();
        let access = tokens.issue_access_token(Uuid::new_v4()).unwrap();
        assert!(tokens.refresh_session(&access).is_err());
    }
}
