//! Picks the connection an operation runs on.

use std::sync::Arc;

use forcelink_config::{ConnectorConfig, EffectiveCredentials};
use forcelink_session::SessionStore;
use forcelink_types::{Connection, SharedConnection};
use tracing::{debug, warn};

use crate::auth::AuthCoordinator;
use crate::error::{ConnectorError, Result};
use crate::jwt::JwtBearerAuthenticator;
use crate::options::OperationOptions;
use crate::session::{AuthResponse, AuthToken, SessionEntry};

/// Connection lent to one operation.
#[derive(Debug)]
pub struct ResolvedConnection {
    connection: SharedConnection,
    token: AuthToken,
    ephemeral: bool,
}

impl ResolvedConnection {
    fn cached(connection: SharedConnection, token: AuthToken) -> Self {
        Self {
            connection,
            token,
            ephemeral: false,
        }
    }

    fn bearer(connection: SharedConnection, token: AuthToken) -> Self {
        Self {
            connection,
            token,
            ephemeral: true,
        }
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.connection
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// True for JWT bearer connections, which are not cached and must be
    /// logged out once the operation is done.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Hand the connection back; ephemeral connections are logged out.
    pub async fn release(self) {
        if !self.ephemeral {
            return;
        }
        if let Err(e) = self.connection.logout().await {
            warn!(error = %e, "Failed to log out JWT bearer connection");
        }
    }
}

/// Resolves operation options to a connection.
#[derive(Clone)]
pub struct ConnectionResolver {
    defaults: Arc<ConnectorConfig>,
    store: SessionStore<SessionEntry>,
    coordinator: AuthCoordinator,
    jwt: JwtBearerAuthenticator,
}

impl ConnectionResolver {
    pub fn new(
        defaults: Arc<ConnectorConfig>,
        store: SessionStore<SessionEntry>,
        coordinator: AuthCoordinator,
        jwt: JwtBearerAuthenticator,
    ) -> Self {
        Self {
            defaults,
            store,
            coordinator,
            jwt,
        }
    }

    /// Resolve in this order: the sentinel token, a cached token, then
    /// credentials (optionally acting as the user named in the caller's
    /// claims).
    pub async fn resolve(&self, options: &OperationOptions) -> Result<ResolvedConnection> {
        let call = options.call_credentials();

        if let Some(auth) = &options.auth {
            if auth == self.jwt.sentinel() {
                let effective = call.layer_over(&self.defaults);
                if !effective.use_oauth_jwt_flow {
                    debug!("Sentinel token used without JWT bearer flow");
                    return Err(ConnectorError::InvalidAuthToken);
                }
                return self.bearer(&effective).await;
            }
            return self.cached(auth);
        }

        let mut effective = call.layer_over(&self.defaults);
        if let Some(metadata) = options
            .metadata
            .as_ref()
            .filter(|m| m.user_claims.is_some())
        {
            let claim_type = &effective.user_name_claim_type;
            let username = metadata
                .claim(claim_type)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConnectorError::ClaimNotFound(claim_type.clone()))?;
            effective.act_as_username = Some(username.to_string());
        }

        if effective.use_oauth_jwt_flow {
            return self.bearer(&effective).await;
        }

        let AuthResponse { auth } = self.coordinator.authenticate_effective(&effective).await?;
        // The session may expire between authenticate and this lookup.
        self.cached(&auth)
    }

    fn cached(&self, token: &AuthToken) -> Result<ResolvedConnection> {
        self.store
            .get_with(token.as_str(), SessionEntry::connection)
            .map(|connection| ResolvedConnection::cached(connection, token.clone()))
            .ok_or(ConnectorError::InvalidAuthToken)
    }

    async fn bearer(&self, credentials: &EffectiveCredentials) -> Result<ResolvedConnection> {
        let (connection, sentinel) = self.jwt.authenticate(credentials).await?;
        Ok(ResolvedConnection::bearer(connection, sentinel))
    }
}
