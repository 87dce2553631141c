use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. `None` runs on in-memory stores.
    pub database_url: Option<String>,
    /// HS256 signing key. `None` means a random key per process start.
    pub jwt_secret: Option<String>,
    pub jwt_issuer: String,
    pub passcode_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub passcode_max_attempts: i32,
    pub notification_timeout_seconds: u64,
    pub brevo: Option<BrevoConfig>,
    pub twilio: Option<TwilioConfig>,
    pub allowed_origins: Vec<String>,
    pub rate_limit_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let jwt_secret = jwt_secret_from(env::var("JWT_SECRET"))?;

        let brevo = match (non_empty("BREVO_API_KEY"), non_empty("BREVO_SENDER_EMAIL")) {
            (Some(api_key), Some(sender_email)) => Some(BrevoConfig {
                api_key,
                sender_email,
                sender_name: non_empty("BREVO_SENDER_NAME"),
            }),
            _ => None,
        };

        let twilio = match (
            non_empty("TWILIO_ACCOUNT_SID"),
            non_empty("TWILIO_AUTH_TOKEN"),
            non_empty("TWILIO_FROM_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Ok(Self {
            port: parse_or("PORT", 5174)?,
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            jwt_issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| "pharmacy-auth".to_string()),
            passcode_ttl_seconds: parse_or("PASSCODE_TTL_SECONDS", 5 * 60)?,
            session_ttl_seconds: parse_or("SESSION_TTL_SECONDS", 7 * 24 * 60 * 60)?,
            passcode_max_attempts: parse_or("PASSCODE_MAX_ATTEMPTS", 5)?,
            notification_timeout_seconds: parse_or("NOTIFICATION_TIMEOUT_SECONDS", 10)?,
            brevo,
            twilio,
            allowed_origins: parse_list(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            rate_limit_enabled: parse_or("RATE_LIMIT_ENABLED", true)?,
        })
    }
}

/// Unset means a random per-process key; set but blank is a mistake.
fn jwt_secret_from(raw: Result<String, env::VarError>) -> Result<Option<String>> {
    match raw {
        Ok(secret) if secret.trim().is_empty() => {
            bail!("JWT_SECRET is set but empty; unset it or provide a key")
        }
        Ok(secret) => Ok(Some(secret)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).context("JWT_SECRET is not readable"),
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a valid value, got {raw:?}")),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
