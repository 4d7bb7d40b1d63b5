//! JWT bearer assertion claims and signing.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// How long a signed assertion stays valid. The token endpoint only accepts
/// assertions that expire within a few minutes.
pub const ASSERTION_LIFETIME_SECS: i64 = 3 * 60;

/// Claims of a JWT bearer assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Connected-app client id.
    pub iss: String,
    /// User the access token is issued for.
    pub sub: String,
    /// Login server the assertion is addressed to.
    pub aud: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl AssertionClaims {
    /// Claims expiring [`ASSERTION_LIFETIME_SECS`] from now.
    pub fn new(
        client_id: impl Into<String>,
        username: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            iss: client_id.into(),
            sub: username.into(),
            aud: audience.into(),
            exp: chrono::Utc::now().timestamp() + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Sign claims with an RSA private key (PKCS#1 or PKCS#8 PEM) using RS256.
pub fn sign_assertion(claims: &AssertionClaims, private_key_pem: &str) -> Result<String> {
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| OAuthError::InvalidKey(e.to_string()))?;
    encode(&Header::new(Algorithm::RS256), claims, &key)
        .map_err(|e| OAuthError::Signing(e.to_string()))
}
