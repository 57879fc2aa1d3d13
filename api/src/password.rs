use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

const DECOY_PASSWORD: &str = "decoy password";

/// Value of `credentials.scheme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Plaintext,
    Argon2,
}

impl HashScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            HashScheme::Plaintext => "plaintext",
            HashScheme::Argon2 => "argon2",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "plaintext" => Some(HashScheme::Plaintext),
            "argon2" => Some(HashScheme::Argon2),
            _ => None,
        }
    }
}

/// A stored password, tagged with how it was stored.
#[derive(Clone, PartialEq, Eq)]
pub enum StoredCredential {
    /// Rows written before hashing was introduced. Upgraded to
    /// `StrongHash` on the next successful sign-in.
    LegacyPlaintext(String),
    /// Argon2 PHC string.
    StrongHash(String),
}

impl StoredCredential {
    pub fn from_row(scheme: &str, secret: String) -> Option<Self> {
        match HashScheme::parse(scheme)? {
            HashScheme::Plaintext => Some(StoredCredential::LegacyPlaintext(secret)),
            HashScheme::Argon2 => Some(StoredCredential::StrongHash(secret)),
        }
    }

    pub fn scheme(&self) -> HashScheme {
        match self {
            StoredCredential::LegacyPlaintext(_) => HashScheme::Plaintext,
            StoredCredential::StrongHash(_) => HashScheme::Argon2,
        }
    }

    pub fn needs_rehash(&self) -> bool {
        matches!(self, StoredCredential::LegacyPlaintext(_))
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StoredCredential({})", self.scheme().as_str())
    }
}

/// Checks `supplied` against the stored credential. Any failure to read the
/// stored hash counts as a mismatch.
pub fn verify(stored: &StoredCredential, supplied: &str) -> bool {
    match stored {
        StoredCredential::StrongHash(phc) => {
            let Ok(parsed_hash) = PasswordHash::new(phc) else {
                tracing::warn!("Stored password hash could not be parsed");
                return false;
            };
            Argon2::default()
                .verify_password(supplied.as_bytes(), &parsed_hash)
                .is_ok()
        }
        StoredCredential::LegacyPlaintext(plain) => plain == supplied,
    }
}

/// Argon2 hash checked when no account matches, so an unknown email costs
/// the same work as a wrong password.
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password(DECOY_PASSWORD).ok())
        .as_deref()
}

/// Runs a full argon2 verification for a sign-in with no matching account.
/// Always a mismatch.
pub fn verify_unknown(supplied: &str) -> bool {
    match decoy_hash() {
        Some(phc) => {
            let _ = verify(&StoredCredential::StrongHash(phc.to_string()), supplied);
        }
        None => tracing::warn!("Decoy password hash is unavailable"),
    }
    false
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}
