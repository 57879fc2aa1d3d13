use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::claims::{Claims, Identity, TOKEN_TYPE};
use super::extract::{bearer_token, cookie_value};
use crate::config::AuthConfig;

/// Why a token was rejected. Only ever logged; callers see "unauthenticated".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("no signing secret configured")]
    MissingSecret,
    #[error("token is not a well-formed JWT")]
    Malformed,
    #[error("segment is not valid base64url")]
    Encoding,
    #[error("segment is not valid JSON or lacks a required claim")]
    Json,
    #[error("algorithm is not HS256")]
    Algorithm,
    #[error("unsupported token type {0:?}")]
    Type(String),
    #[error("signature mismatch")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("token used before it was issued")]
    Premature,
    #[error("subject is not a user id")]
    Subject,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::ImmatureSignature => TokenError::Premature,
            ErrorKind::InvalidSignature => TokenError::Signature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::Algorithm
            }
            ErrorKind::Base64(_) | ErrorKind::Utf8(_) => TokenError::Encoding,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => TokenError::Json,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: AuthConfig,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self { config, validation }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Decodes and validates a token presented on either channel.
    ///
    /// Envelope details are tolerated (surrounding whitespace, a missing or
    /// differently cased `typ`, extra header fields, extra claims), while the
    /// algorithm, signature, expiry and issue time are checked strictly.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let secret = self.config.secret.as_ref().ok_or(TokenError::MissingSecret)?;
        let token = token.trim();

        let header = decode_header(token)?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::Algorithm);
        }
        if let Some(typ) = header.typ {
            if !typ.eq_ignore_ascii_case(TOKEN_TYPE) {
                return Err(TokenError::Type(typ));
            }
        }

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation,
        )?
        .claims;

        // `decode` only checks `exp` against the wall clock and lets `exp == now` pass.
        let now = now.timestamp();
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if now < claims.iat {
            return Err(TokenError::Premature);
        }

        Ok(claims)
    }

    fn identity_from(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let claims = self.verify_at(token, now)?;
        Identity::from_claims(claims).ok_or(TokenError::Subject)
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        self.resolve_at(headers, Utc::now())
    }

    /// Bearer header first, then the session cookie. Never fails: every
    /// rejection collapses to `None`.
    pub fn resolve_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Identity> {
        if let Some(token) = bearer_token(headers) {
            match self.identity_from(token, now) {
                Ok(identity) => return Some(identity),
                Err(e) => tracing::debug!("bearer token rejected: {}", e),
            }
        }

        if let Some(token) = cookie_value(headers, &self.config.cookie_name) {
            match self.identity_from(token, now) {
                Ok(identity) => return Some(identity),
                Err(e) => tracing::debug!("session cookie rejected: {}", e),
            }
        }

        None
    }
}
