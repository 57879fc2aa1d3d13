use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use super::claims::{Claims, Profile};
use crate::config::AuthConfig;
use crate::error::{AppError, ConfigError};

/// Mints HS256 session tokens.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn issue(&self, subject: &str, profile: &Profile) -> Result<String, AppError> {
        self.issue_at(subject, profile, Utc::now())
    }

    /// Refuses to sign without a configured secret.
    pub fn issue_at(
        &self,
        subject: &str,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let secret = self.config.secret.as_ref().ok_or(ConfigError::MissingSecret)?;

        let expires_at = now
            .checked_add_signed(self.config.token_ttl)
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: self.config.token_ttl.num_seconds().to_string(),
            })?;

        let claims = Claims {
            sub: subject.to_string(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(token)
    }
}
