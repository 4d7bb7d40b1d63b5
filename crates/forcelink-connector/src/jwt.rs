//! JWT bearer logins.
//!
//! Bearer logins are never cached: there is no refresh token, so each call
//! makes a fresh exchange and the connection lives for one operation. Callers
//! always receive the connector's sentinel token in place of a session token.

use forcelink_config::EffectiveCredentials;
use forcelink_oauth::{JwtBearerRequest, SharedTokenExchange};
use forcelink_types::{SharedConnection, SharedConnectionFactory};
use tracing::{debug, info};

use crate::error::{ConnectorError, Result};
use crate::session::AuthToken;

/// Performs the JWT bearer exchange and wraps the access token in a connection.
#[derive(Clone)]
pub struct JwtBearerAuthenticator {
    exchange: SharedTokenExchange,
    factory: SharedConnectionFactory,
    sentinel: AuthToken,
}

impl JwtBearerAuthenticator {
    pub fn new(
        exchange: SharedTokenExchange,
        factory: SharedConnectionFactory,
        sentinel: AuthToken,
    ) -> Self {
        Self {
            exchange,
            factory,
            sentinel,
        }
    }

    pub fn sentinel(&self) -> &AuthToken {
        &self.sentinel
    }

    /// Build the exchange request, checking the required fields in order.
    pub fn request_for(credentials: &EffectiveCredentials) -> Result<JwtBearerRequest> {
        let private_key = credentials
            .private_key
            .clone()
            .ok_or(ConnectorError::MissingPrivateKey)?;
        let client_id = credentials
            .client_id
            .clone()
            .ok_or(ConnectorError::MissingClientId)?;
        let username = credentials
            .act_as_username
            .clone()
            .ok_or(ConnectorError::MissingActAsUsername)?;

        Ok(JwtBearerRequest {
            client_id,
            private_key,
            username,
            is_sandbox: credentials.is_sandbox,
            custom_token_endpoint: credentials.custom_token_endpoint.clone(),
        })
    }

    /// Exchange an assertion for an access token and open a connection with it.
    ///
    /// The connection belongs to the caller, who must log it out when done.
    pub async fn authenticate(
        &self,
        credentials: &EffectiveCredentials,
    ) -> Result<(SharedConnection, AuthToken)> {
        let request = Self::request_for(credentials)?;
        debug!(
            client_id = %request.client_id,
            username = %request.username,
            endpoint = %request.token_endpoint(),
            "JWT bearer exchange"
        );

        let grant = self.exchange.exchange(&request).await?;

        let instance_url = match credentials.login_host.as_deref() {
            Some(host) => instance_url_for(host),
            None => grant
                .instance_url
                .clone()
                .ok_or(ConnectorError::MissingLoginHost)?,
        };

        let connection = self.factory.from_access_token(
            &instance_url,
            &grant.access_token,
            &credentials.api_version,
        );
        info!(
            username = %request.username,
            instance_url = %instance_url,
            "JWT bearer connection opened"
        );
        Ok((connection, self.sentinel.clone()))
    }
}

/// `my.salesforce.com` → `https://my.salesforce.com`; full URLs pass through.
fn instance_url_for(login_host: &str) -> String {
    if login_host.starts_with("https://") || login_host.starts_with("http://") {
        login_host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", login_host.trim_end_matches('/'))
    }
}
