use std::{fmt, time::Duration};

use crate::error::ConfigError;

const DEFAULT_DATABASE_URL: &str = "sqlite://asks.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_COOKIE_NAME: &str = "session";
const DEFAULT_TRANSCRIPT_API_URL: &str = "https://api.assemblyai.com/v2";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_TRANSCRIPT_TIMEOUT_SECS: u64 = 20;

/// HMAC key used to sign and verify session tokens.
///
/// Never printed: `Debug` only shows the key length.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    /// Returns `None` for an empty key, which is treated the same as no key.
    pub fn new(secret: impl Into<Vec<u8>>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([{} bytes redacted])", self.0.len())
    }
}

/// Settings shared by the token issuer and the token verifier.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: Option<SigningSecret>,
    pub token_ttl: chrono::Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn new(secret: Option<SigningSecret>) -> Self {
        Self {
            secret,
            token_ttl: chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranscriptConfig {
    /// Absent key disables transcription entirely.
    pub api_key: Option<String>,
    pub base_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_TRANSCRIPT_API_URL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_TRANSCRIPT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub auth: AuthConfig,
    pub transcript: TranscriptConfig,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ttl_secs: i64 = parse_or(&get, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let token_ttl = chrono::Duration::try_seconds(ttl_secs)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: ttl_secs.to_string(),
            })?;

        let auth = AuthConfig {
            secret: lookup("JWT_SECRET").and_then(SigningSecret::new),
            token_ttl,
            cookie_name: get("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.into()),
            cookie_secure: parse_or(&get, "COOKIE_SECURE", true)?,
        };

        let transcript = TranscriptConfig {
            api_key: get("ASSEMBLYAI_API_KEY"),
            base_url: get("TRANSCRIPT_API_URL")
                .unwrap_or_else(|| DEFAULT_TRANSCRIPT_API_URL.into())
                .trim_end_matches('/')
                .to_string(),
            poll_interval: Duration::from_millis(parse_or(
                &get,
                "TRANSCRIPT_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            timeout: Duration::from_secs(parse_or(
                &get,
                "TRANSCRIPT_TIMEOUT_SECS",
                DEFAULT_TRANSCRIPT_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            auth,
            transcript,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
