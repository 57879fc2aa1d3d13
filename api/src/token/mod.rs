//! Stateless HS256 session tokens shared by the mobile (bearer header) and
//! web (session cookie) clients.

mod claims;
mod extract;
mod issuer;
mod verifier;

pub use claims::{Claims, Identity, Profile};
pub use extract::{bearer_token, cookie_value, AuthUser, MaybeUser};
pub use issuer::TokenIssuer;
pub use verifier::{TokenError, TokenVerifier};
