//! Connection traits implemented by transport crates.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::records::FindQuery;

/// Login endpoint for production orgs.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Login endpoint for sandbox orgs.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// REST API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "42.0";

/// OAuth2 client registration used for the username/password grant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Client {
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(default, alias = "clientSecret")]
    pub client_secret: Option<String>,
    #[serde(default, alias = "redirectUri")]
    pub redirect_uri: Option<String>,
}

/// Where and how to perform a password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOptions {
    /// Login endpoint (production or sandbox).
    pub login_url: String,
    /// Alternate client configuration. When absent the SOAP login is used.
    pub oauth2: Option<OAuth2Client>,
    /// REST API version, without the leading `v`.
    pub api_version: String,
}

impl LoginOptions {
    /// Options for the production or sandbox login endpoint.
    pub fn for_environment(is_sandbox: bool) -> Self {
        let login_url = if is_sandbox {
            SANDBOX_LOGIN_URL
        } else {
            PRODUCTION_LOGIN_URL
        };
        Self {
            login_url: login_url.to_string(),
            oauth2: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Use an alternate OAuth2 client for the login.
    pub fn with_oauth2(mut self, oauth2: Option<OAuth2Client>) -> Self {
        self.oauth2 = oauth2;
        self
    }

    /// Override the REST API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// An authenticated handle to the remote CRM service.
///
/// A handle is owned by exactly one session entry (or by one bearer-flow
/// operation). Whoever removes the entry is responsible for calling
/// [`Connection::logout`].
#[async_trait]
pub trait Connection: Send + Sync + fmt::Debug {
    /// Instance URL the handle talks to.
    fn instance_url(&self) -> &str;

    /// Terminate the remote session.
    async fn logout(&self) -> Result<()>;

    /// Run a raw SOQL/SOSL query.
    async fn query(&self, soql: &str) -> Result<Value>;

    /// Query records of one entity by conditions.
    async fn find(&self, query: &FindQuery) -> Result<Value>;

    /// Describe one object class.
    async fn describe(&self, object: &str) -> Result<Value>;

    /// List all object classes available to the session.
    async fn describe_global(&self) -> Result<Value>;

    /// Create one record (object) or several (array).
    async fn create(&self, entity: &str, details: &Value) -> Result<Value>;

    /// Update one or several records; each must carry its `Id`.
    async fn update(&self, entity: &str, details: &Value) -> Result<Value>;

    /// Insert or update records matched by an external id field.
    async fn upsert(&self, entity: &str, details: &Value, external_id_name: &str)
    -> Result<Value>;

    /// Delete records by id (string, array of ids, or objects carrying `Id`).
    async fn destroy(&self, entity: &str, ids: &Value) -> Result<Value>;
}

/// Shared connection handle.
pub type SharedConnection = Arc<dyn Connection>;

/// Builds connections, either through a password login or from an access
/// token that was obtained elsewhere.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + fmt::Debug {
    /// Build a new connection and log in with username/password.
    async fn login(
        &self,
        options: &LoginOptions,
        username: &str,
        password: &str,
    ) -> Result<SharedConnection>;

    /// Build a connection from an existing access token, bypassing login.
    fn from_access_token(
        &self,
        instance_url: &str,
        access_token: &str,
        api_version: &str,
    ) -> SharedConnection;
}

/// Shared connection factory.
pub type SharedConnectionFactory = Arc<dyn ConnectionFactory>;
