//! Connection factory: password logins and access-token connections.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forcelink_types::{
    Connection, ConnectionError, ConnectionFactory, LoginOptions, OAuth2Client, Result,
    SharedConnection,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::connection::RestConnection;
use crate::error::{OAuthErrorBody, http_error};
use crate::soap;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds [`RestConnection`]s.
#[derive(Debug, Clone)]
pub struct RestConnectionFactory {
    http: reqwest::Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct PasswordGrant {
    access_token: String,
    instance_url: String,
}

impl RestConnectionFactory {
    /// Create a new factory builder.
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    fn connection(&self, instance_url: &str, token: &str, api_version: &str) -> RestConnection {
        RestConnection::new(
            self.http.clone(),
            instance_url,
            token,
            api_version,
            self.timeout,
        )
    }

    /// OAuth2 username/password grant against the token endpoint.
    async fn password_grant(
        &self,
        options: &LoginOptions,
        client: &OAuth2Client,
        username: &str,
        password: &str,
    ) -> Result<RestConnection> {
        let client_id = client.client_id.as_deref().ok_or_else(|| {
            ConnectionError::InvalidRequest("oauth2.clientId is required".to_string())
        })?;
        let client_secret = client.client_secret.as_deref().unwrap_or_default();

        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("username", username),
            ("password", password),
        ];
        if let Some(redirect_uri) = client.redirect_uri.as_deref() {
            form.push(("redirect_uri", redirect_uri));
        }

        let url = format!(
            "{}/services/oauth2/token",
            options.login_url.trim_end_matches('/')
        );
        debug!(url = %url, username, "OAuth2 password login");

        let response = self
            .http
            .post(&url)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(http_error)?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => body,
            };
            return Err(ConnectionError::Auth(message));
        }

        let grant: PasswordGrant = response.json().await.map_err(http_error)?;
        Ok(self.connection(&grant.instance_url, &grant.access_token, &options.api_version))
    }

    /// Partner SOAP `login`.
    async fn soap_login(
        &self,
        options: &LoginOptions,
        username: &str,
        password: &str,
    ) -> Result<RestConnection> {
        let url = format!(
            "{}{}",
            options.login_url.trim_end_matches('/'),
            soap::login_path(&options.api_version)
        );
        debug!(url = %url, username, "SOAP login");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", "login")
            .body(soap::login_envelope(username, password))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(http_error)?;

        // Faults arrive with a 500 status and an XML body.
        let body = response.text().await.map_err(http_error)?;
        let session = soap::parse_login_response(&body)?;
        Ok(self.connection(&session.instance_url, &session.session_id, &options.api_version))
    }
}

#[async_trait]
impl ConnectionFactory for RestConnectionFactory {
    async fn login(
        &self,
        options: &LoginOptions,
        username: &str,
        password: &str,
    ) -> Result<SharedConnection> {
        let connection = match &options.oauth2 {
            Some(client) => {
                self.password_grant(options, client, username, password)
                    .await?
            }
            None => self.soap_login(options, username, password).await?,
        };
        info!(
            username,
            instance_url = %connection.instance_url(),
            "Logged in"
        );
        Ok(Arc::new(connection))
    }

    fn from_access_token(
        &self,
        instance_url: &str,
        access_token: &str,
        api_version: &str,
    ) -> SharedConnection {
        Arc::new(self.connection(instance_url, access_token, api_version))
    }
}

/// Builder for creating a [`RestConnectionFactory`].
#[derive(Debug)]
pub struct FactoryBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl FactoryBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the factory.
    pub fn build(self) -> Result<RestConnectionFactory> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("forcelink/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(http_error)?;

        Ok(RestConnectionFactory {
            http,
            timeout: self.timeout,
        })
    }
}

impl Default for FactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
