/// Configuration management for the API server
///
/// Loads settings from environment variables (and a `.env` file in
/// development) into a typed [`Config`].
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:8080`)
/// - `APP_ENV`: `production` marks cookies `Secure`
/// - `CORS_ORIGIN`: comma-separated allowed origins
/// - `DATABASE_URL`: PostgreSQL URL, or `memory://` for the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_ACCESS_SECRET` / `JWT_REFRESH_SECRET`: signing secrets (required)
/// - `JWT_ACCESS_EXPIRES` / `JWT_REFRESH_EXPIRES`: lifetimes (default `8h` / `7d`)
/// - `ACCESS_COOKIE_MAX_AGE_SECS` / `REFRESH_COOKIE_MAX_AGE_SECS`: cookie lifetimes
/// - `FREE_PLAN_TASK_LIMIT`: free-tier task ceiling (default 10)
/// - `GOOGLE_AI_API_KEY`, `AI_MODEL`, `AI_BASE_URL`, `AI_TIMEOUT_SECS`: text generation
///
/// # Example
///
/// ```no_run
/// use smarttask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use smarttask_shared::ai::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use smarttask_shared::auth::cookies::{
    CookiePolicy, DEFAULT_ACCESS_COOKIE_MAX_AGE, DEFAULT_REFRESH_COOKIE_MAX_AGE,
};
use smarttask_shared::auth::jwt::TokenConfig;
use smarttask_shared::quota::{QuotaLimits, DEFAULT_FREE_TASK_LIMIT};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// `DATABASE_URL` value that selects the in-memory store
pub const MEMORY_DATABASE_URL: &str = "memory://";

const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cookies: CookieConfig,
    pub plans: PlanConfig,
    pub ai: AiConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Explicitly allowed CORS origins; loopback origins are always allowed
    pub cors_origins: Vec<String>,

    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

/// Token signing configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for access tokens
    ///
    /// IMPORTANT: at least 32 bytes and different from the refresh secret.
    /// Generate with: `openssl rand -hex 32`
    pub access_secret: String,

    pub refresh_secret: String,

    pub access_ttl: Duration,

    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct CookieConfig {
    pub access_max_age: i64,
    pub refresh_max_age: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanConfig {
    pub free_task_limit: u64,
}

/// Text-generation provider configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables the provider; AI endpoints then serve fallback content
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn required_secret(key: &str) -> anyhow::Result<String> {
    let secret = env::var(key)
        .map_err(|_| anyhow::anyhow!("{key} environment variable is required"))?;

    if secret.len() < MIN_SECRET_LEN {
        anyhow::bail!("{key} must be at least {MIN_SECRET_LEN} characters long");
    }
    Ok(secret)
}

/// Parses a lifetime such as `90`, `15m`, `8h` or `7d`
///
/// A bare number is seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{raw}'"))?;

    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => anyhow::bail!("invalid duration unit in '{raw}' (expected s, m, h or d)"),
    };
    let seconds = value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("duration '{raw}' is too large"))?;

    if seconds == 0 {
        anyhow::bail!("duration '{raw}' must be positive");
    }
    Ok(Duration::from_secs(seconds))
}

fn duration_var(key: &str, default: &str) -> anyhow::Result<Duration> {
    parse_duration(&var_or(key, default)).map_err(|e| anyhow::anyhow!("{key}: {e}"))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or either JWT secret is missing
    /// - a secret is shorter than 32 characters, or both secrets are equal
    /// - a numeric or duration variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let cors_origins = var_or("CORS_ORIGIN", "")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let access_secret = required_secret("JWT_ACCESS_SECRET")?;
        let refresh_secret = required_secret("JWT_REFRESH_SECRET")?;
        if access_secret == refresh_secret {
            anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let api_key = env::var("GOOGLE_AI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parse_var("API_PORT", 8080u16)?,
                cors_origins,
                production: var_or("APP_ENV", "development") == "production",
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?,
            },
            jwt: JwtConfig {
                access_secret,
                refresh_secret,
                access_ttl: duration_var("JWT_ACCESS_EXPIRES", "8h")?,
                refresh_ttl: duration_var("JWT_REFRESH_EXPIRES", "7d")?,
            },
            cookies: CookieConfig {
                access_max_age: parse_var("ACCESS_COOKIE_MAX_AGE_SECS", DEFAULT_ACCESS_COOKIE_MAX_AGE)?,
                refresh_max_age: parse_var(
                    "REFRESH_COOKIE_MAX_AGE_SECS",
                    DEFAULT_REFRESH_COOKIE_MAX_AGE,
                )?,
            },
            plans: PlanConfig {
                free_task_limit: parse_var("FREE_PLAN_TASK_LIMIT", DEFAULT_FREE_TASK_LIMIT)?,
            },
            ai: AiConfig {
                api_key,
                model: var_or("AI_MODEL", DEFAULT_MODEL),
                base_url: var_or("AI_BASE_URL", DEFAULT_BASE_URL),
                timeout: Duration::from_secs(parse_var("AI_TIMEOUT_SECS", 20u64)?),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_config(&self) -> anyhow::Result<TokenConfig> {
        Ok(TokenConfig {
            access_secret: self.jwt.access_secret.clone(),
            refresh_secret: self.jwt.refresh_secret.clone(),
            access_ttl: chrono::Duration::from_std(self.jwt.access_ttl)?,
            refresh_ttl: chrono::Duration::from_std(self.jwt.refresh_ttl)?,
        })
    }

    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: self.api.production,
            access_max_age: self.cookies.access_max_age,
            refresh_max_age: self.cookies.refresh_max_age,
        }
    }

    pub fn quota_limits(&self) -> QuotaLimits {
        QuotaLimits {
            free_tasks: self.plans.free_task_limit,
        }
    }

    /// Development settings with the in-memory store and no AI provider
    pub fn for_testing() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["https://app.example.com".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: MEMORY_DATABASE_URL.to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                access_secret: "test-access-secret-key-at-least-32-bytes".to_string(),
                refresh_secret: "test-refresh-secret-key-at-least-32-bytes".to_string(),
                access_ttl: Duration::from_secs(8 * 60 * 60),
                refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            },
            cookies: CookieConfig {
                access_max_age: DEFAULT_ACCESS_COOKIE_MAX_AGE,
                refresh_max_age: DEFAULT_REFRESH_COOKIE_MAX_AGE,
            },
            plans: PlanConfig {
                free_task_limit: DEFAULT_FREE_TASK_LIMIT,
            },
            ai: AiConfig {
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: Duration::from_secs(2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_testing();
        config.api.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("8h").unwrap(), Duration::from_secs(28_800));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5w").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("h").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        let err = parse_duration("18446744073709551615d").unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
        assert!(parse_duration("99999999999999999999").is_err());
        assert_eq!(
            parse_duration("18446744073709551615").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_token_config_rejects_unrepresentable_ttl() {
        let mut config = Config::for_testing();
        config.jwt.refresh_ttl = Duration::from_secs(u64::MAX);
        assert!(config.token_config().is_err());
    }

    #[test]
    fn test_token_config_lifetimes() {
        let tokens = Config::for_testing().token_config().unwrap();
        assert_eq!(tokens.access_ttl, chrono::Duration::hours(8));
        assert_eq!(tokens.refresh_ttl, chrono::Duration::days(7));
    }

    #[test]
    fn test_cookie_policy_follows_environment() {
        let mut config = Config::for_testing();
        assert!(!config.cookie_policy().secure);
        config.api.production = true;
        assert!(config.cookie_policy().secure);
        assert_eq!(config.cookie_policy().access_max_age, 9_000);
    }

    #[test]
    fn test_memory_database_url() {
        assert!(Config::for_testing().database.is_in_memory());
    }
}
