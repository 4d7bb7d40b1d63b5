//! Token endpoint exchange.

use std::sync::Arc;

use async_trait::async_trait;
use forcelink_types::{PRODUCTION_LOGIN_URL, SANDBOX_LOGIN_URL};
use serde::Deserialize;
use tracing::{debug, info};

use crate::assertion::{AssertionClaims, sign_assertion};
use crate::error::{OAuthError, Result};

/// Grant type for the JWT bearer flow (RFC 7523).
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Everything needed to obtain an access token for one user.
#[derive(Clone)]
pub struct JwtBearerRequest {
    pub client_id: String,
    /// PEM-encoded RSA private key registered with the connected app.
    pub private_key: String,
    /// User the token is issued for.
    pub username: String,
    pub is_sandbox: bool,
    /// Token endpoint used instead of the environment default.
    pub custom_token_endpoint: Option<String>,
}

impl std::fmt::Debug for JwtBearerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtBearerRequest")
            .field("client_id", &self.client_id)
            .field("private_key", &"<redacted>")
            .field("username", &self.username)
            .field("is_sandbox", &self.is_sandbox)
            .field("custom_token_endpoint", &self.custom_token_endpoint)
            .finish()
    }
}

impl JwtBearerRequest {
    /// Login server the assertion is addressed to.
    pub fn audience(&self) -> &'static str {
        if self.is_sandbox {
            SANDBOX_LOGIN_URL
        } else {
            PRODUCTION_LOGIN_URL
        }
    }

    /// Endpoint the assertion is posted to.
    pub fn token_endpoint(&self) -> String {
        match self.custom_token_endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
            _ => format!("{}/services/oauth2/token", self.audience()),
        }
    }
}

/// Access token issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Instance the token is valid against, when the endpoint reports one.
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchanges a signed assertion for an access token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, request: &JwtBearerRequest) -> Result<TokenGrant>;
}

/// Shared, thread-safe token exchange.
pub type SharedTokenExchange = Arc<dyn TokenExchange>;

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// [`TokenExchange`] over HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpTokenExchange {
    client: reqwest::Client,
}

impl HttpTokenExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (proxies, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, request: &JwtBearerRequest) -> Result<TokenGrant> {
        let claims = AssertionClaims::new(
            request.client_id.as_str(),
            request.username.as_str(),
            request.audience(),
        );
        let assertion = sign_assertion(&claims, &request.private_key)?;
        let endpoint = request.token_endpoint();

        debug!(endpoint = %endpoint, username = %request.username, "Posting JWT bearer assertion");

        let response = self
            .client
            .post(&endpoint)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(OAuthError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| OAuthError::Serialization(format!("Failed to parse token response: {}", e)))?;

        info!(username = %request.username, "Obtained access token via JWT bearer flow");
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(is_sandbox: bool, custom: Option<&str>) -> JwtBearerRequest {
        JwtBearerRequest {
            client_id: "cid".into(),
            private_key: "secret-key".into(),
            username: "a@x.com".into(),
            is_sandbox,
            custom_token_endpoint: custom.map(String::from),
        }
    }

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            request(false, None).token_endpoint(),
            "https://login.salesforce.com/services/oauth2/token"
        );
        assert_eq!(
            request(true, None).token_endpoint(),
            "https://test.salesforce.com/services/oauth2/token"
        );
        assert_eq!(request(true, None).audience(), SANDBOX_LOGIN_URL);
    }

    #[test]
    fn test_custom_endpoint_wins() {
        let req = request(false, Some("https://my.domain/services/oauth2/token"));
        assert_eq!(req.token_endpoint(), "https://my.domain/services/oauth2/token");
        // The audience stays the login server.
        assert_eq!(req.audience(), PRODUCTION_LOGIN_URL);

        assert_eq!(
            request(false, Some("")).token_endpoint(),
            "https://login.salesforce.com/services/oauth2/token"
        );
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", request(false, None));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
