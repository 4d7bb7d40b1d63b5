//! Connector configuration.

use std::path::PathBuf;
use std::time::Duration;

use forcelink_types::{DEFAULT_API_VERSION, OAuth2Client};
use serde::{Deserialize, Serialize};

/// Default session lifetime in milliseconds (15 minutes).
pub const DEFAULT_TIMEOUT_MS: u64 = 15 * 60 * 1000;

/// Claim type the acting username is read from when none is configured.
pub const DEFAULT_USER_NAME_CLAIM_TYPE: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";

/// Constructor-time defaults for a connector.
///
/// Every field is optional so that configs can be layered; the accessor
/// methods apply the built-in defaults. Both snake_case and the camelCase
/// names used by existing deployments are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Default username for password logins.
    pub username: Option<String>,

    /// Default password for password logins.
    pub password: Option<String>,

    /// Alternate OAuth2 client used for password logins.
    pub oauth2: Option<OAuth2Client>,

    /// Log in against the sandbox endpoint.
    #[serde(alias = "isSandbox")]
    pub is_sandbox: Option<bool>,

    /// Session lifetime in milliseconds.
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,

    /// Authenticate with the OAuth JWT bearer flow instead of a password.
    #[serde(alias = "useOAuthJwtFlow")]
    pub use_oauth_jwt_flow: Option<bool>,

    /// PEM-encoded private key that signs JWT bearer assertions.
    #[serde(alias = "privateKey")]
    pub private_key: Option<String>,

    /// File to read the private key from when it is not given inline.
    #[serde(alias = "privateKeyPath")]
    pub private_key_path: Option<PathBuf>,

    /// Connected-app client id (JWT `iss`).
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,

    /// User the JWT bearer flow acts as (JWT `sub`).
    #[serde(alias = "actAsUsername")]
    pub act_as_username: Option<String>,

    /// Instance host bearer-flow connections are built against.
    #[serde(alias = "loginHost")]
    pub login_host: Option<String>,

    /// Token endpoint overriding the default for the environment.
    #[serde(alias = "customTokenEndpoint")]
    pub custom_token_endpoint: Option<String>,

    /// Claim type the acting username is read from.
    #[serde(alias = "userNameClaimType")]
    pub user_name_claim_type: Option<String>,

    /// REST API version, without the leading `v`.
    #[serde(alias = "apiVersion")]
    pub api_version: Option<String>,
}

impl ConnectorConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority per field).
    pub fn merge(&mut self, other: ConnectorConfig) {
        fn take<T>(base: &mut Option<T>, over: Option<T>) {
            if over.is_some() {
                *base = over;
            }
        }

        take(&mut self.username, other.username);
        take(&mut self.password, other.password);
        take(&mut self.oauth2, other.oauth2);
        take(&mut self.is_sandbox, other.is_sandbox);
        take(&mut self.timeout_ms, other.timeout_ms);
        take(&mut self.use_oauth_jwt_flow, other.use_oauth_jwt_flow);
        take(&mut self.private_key, other.private_key);
        take(&mut self.private_key_path, other.private_key_path);
        take(&mut self.client_id, other.client_id);
        take(&mut self.act_as_username, other.act_as_username);
        take(&mut self.login_host, other.login_host);
        take(&mut self.custom_token_endpoint, other.custom_token_endpoint);
        take(&mut self.user_name_claim_type, other.user_name_claim_type);
        take(&mut self.api_version, other.api_version);
    }

    /// Whether logins go to the sandbox endpoint.
    pub fn is_sandbox(&self) -> bool {
        self.is_sandbox.unwrap_or(false)
    }

    /// Whether the JWT bearer flow is the instance default.
    pub fn use_oauth_jwt_flow(&self) -> bool {
        self.use_oauth_jwt_flow.unwrap_or(false)
    }

    /// Session lifetime. A zero or missing timeout falls back to the default.
    pub fn session_ttl(&self) -> Duration {
        let ms = match self.timeout_ms {
            Some(ms) if ms > 0 => ms,
            _ => DEFAULT_TIMEOUT_MS,
        };
        Duration::from_millis(ms)
    }

    /// REST API version.
    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    // Builder-style setters used by embedders and tests.

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_sandbox(mut self, is_sandbox: bool) -> Self {
        self.is_sandbox = Some(is_sandbox);
        self
    }

    pub fn with_oauth2(mut self, oauth2: OAuth2Client) -> Self {
        self.oauth2 = Some(oauth2);
        self
    }

    pub fn with_jwt_flow(mut self, enabled: bool) -> Self {
        self.use_oauth_jwt_flow = Some(enabled);
        self
    }

    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_act_as_username(mut self, username: impl Into<String>) -> Self {
        self.act_as_username = Some(username.into());
        self
    }

    pub fn with_login_host(mut self, host: impl Into<String>) -> Self {
        self.login_host = Some(host.into());
        self
    }

    pub fn with_user_name_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.user_name_claim_type = Some(claim_type.into());
        self
    }
}
