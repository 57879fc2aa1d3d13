use serde::{Deserialize, Serialize};

/// Accepted `typ` header value, compared case-insensitively when present.
pub const TOKEN_TYPE: &str = "JWT";

/// Display attributes carried in the token next to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// The authenticated caller, as resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl Identity {
    /// `None` when the subject is not a numeric user id.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let id = claims.sub.parse().ok()?;
        Some(Self {
            id,
            email: claims.email,
            name: claims.name,
        })
    }
}
