//! OAuth 2.0 JWT bearer flow for forcelink.
//!
//! A connected app authorizes server-to-server access by signing a short-lived
//! JWT with its RSA private key and trading it at the token endpoint for an
//! access token. No refresh token is issued, so every exchange is a fresh
//! round trip.
//!
//! # Components
//!
//! - [`assertion`]: claims and RS256 signing
//! - [`exchange`]: the [`TokenExchange`] seam and its HTTP implementation

pub mod assertion;
pub mod error;
pub mod exchange;

pub use assertion::{ASSERTION_LIFETIME_SECS, AssertionClaims, sign_assertion};
pub use error::{OAuthError, Result};
pub use exchange::{
    HttpTokenExchange, JWT_BEARER_GRANT_TYPE, JwtBearerRequest, SharedTokenExchange, TokenExchange,
    TokenGrant,
};
