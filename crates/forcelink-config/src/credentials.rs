//! Per-call credential overrides and their merge over instance defaults.

use forcelink_types::{LoginOptions, OAuth2Client};
use serde::{Deserialize, Serialize};

use crate::types::{ConnectorConfig, DEFAULT_USER_NAME_CLAIM_TYPE};

/// Credentials supplied with a single call. Unset fields fall back to the
/// connector's [`ConnectorConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub oauth2: Option<OAuth2Client>,
    #[serde(alias = "useOAuthJwtFlow")]
    pub use_oauth_jwt_flow: Option<bool>,
    #[serde(alias = "privateKey")]
    pub private_key: Option<String>,
    #[serde(alias = "clientId")]
    pub client_id: Option<String>,
    #[serde(alias = "actAsUsername")]
    pub act_as_username: Option<String>,
    #[serde(alias = "loginHost")]
    pub login_host: Option<String>,
    #[serde(alias = "userNameClaimType")]
    pub user_name_claim_type: Option<String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password_login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
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

    pub fn with_oauth2(mut self, oauth2: OAuth2Client) -> Self {
        self.oauth2 = Some(oauth2);
        self
    }

    /// Resolve these overrides against the instance defaults.
    ///
    /// This is the only place per-call values and defaults are combined.
    /// Empty strings count as unset.
    pub fn layer_over(&self, defaults: &ConnectorConfig) -> EffectiveCredentials {
        fn pick(over: &Option<String>, default: &Option<String>) -> Option<String> {
            over.as_ref()
                .filter(|v| !v.is_empty())
                .or(default.as_ref().filter(|v| !v.is_empty()))
                .cloned()
        }

        EffectiveCredentials {
            username: pick(&self.username, &defaults.username),
            password: pick(&self.password, &defaults.password),
            oauth2: self.oauth2.clone().or_else(|| defaults.oauth2.clone()),
            use_oauth_jwt_flow: self.use_oauth_jwt_flow.unwrap_or(false)
                || defaults.use_oauth_jwt_flow(),
            private_key: pick(&self.private_key, &defaults.private_key),
            client_id: pick(&self.client_id, &defaults.client_id),
            act_as_username: pick(&self.act_as_username, &defaults.act_as_username),
            login_host: pick(&self.login_host, &defaults.login_host),
            user_name_claim_type: pick(
                &self.user_name_claim_type,
                &defaults.user_name_claim_type,
            )
            .unwrap_or_else(|| DEFAULT_USER_NAME_CLAIM_TYPE.to_string()),
            is_sandbox: defaults.is_sandbox(),
            custom_token_endpoint: defaults.custom_token_endpoint.clone(),
            api_version: defaults.api_version().to_string(),
        }
    }
}

/// Credentials after per-call overrides have been merged over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub oauth2: Option<OAuth2Client>,
    /// Either the call or the instance asked for the JWT bearer flow.
    pub use_oauth_jwt_flow: bool,
    pub private_key: Option<String>,
    pub client_id: Option<String>,
    pub act_as_username: Option<String>,
    pub login_host: Option<String>,
    pub user_name_claim_type: String,
    pub is_sandbox: bool,
    pub custom_token_endpoint: Option<String>,
    pub api_version: String,
}

impl EffectiveCredentials {
    /// Login endpoint options for a password login.
    pub fn login_options(&self) -> LoginOptions {
        LoginOptions::for_environment(self.is_sandbox)
            .with_oauth2(self.oauth2.clone())
            .with_api_version(self.api_version.clone())
    }
}
