//! Password logins and the session cache in front of them.

use std::sync::Arc;

use forcelink_config::{ConnectorConfig, Credentials, EffectiveCredentials};
use forcelink_session::{SessionStore, UserLookup};
use forcelink_types::{Connection, SharedConnectionFactory};
use tracing::{debug, info, warn};

use crate::error::{ConnectorError, Result};
use crate::jwt::JwtBearerAuthenticator;
use crate::session::{AuthResponse, AuthToken, SessionEntry};

/// Turns credentials into an auth token, logging in only on a cache miss.
#[derive(Clone)]
pub struct AuthCoordinator {
    store: SessionStore<SessionEntry>,
    factory: SharedConnectionFactory,
    jwt: JwtBearerAuthenticator,
    defaults: Arc<ConnectorConfig>,
}

impl AuthCoordinator {
    pub fn new(
        store: SessionStore<SessionEntry>,
        factory: SharedConnectionFactory,
        jwt: JwtBearerAuthenticator,
        defaults: Arc<ConnectorConfig>,
    ) -> Self {
        Self {
            store,
            factory,
            jwt,
            defaults,
        }
    }

    /// Authenticate with per-call credentials layered over the defaults.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let effective = credentials.layer_over(&self.defaults);
        self.authenticate_effective(&effective).await
    }

    /// Authenticate with already-merged credentials.
    ///
    /// A username with a live session gets that session's token back as long
    /// as the password matches; a different password is rejected without
    /// contacting the server and leaves the session alone.
    pub async fn authenticate_effective(
        &self,
        credentials: &EffectiveCredentials,
    ) -> Result<AuthResponse> {
        if credentials.use_oauth_jwt_flow {
            let (connection, sentinel) = self.jwt.authenticate(credentials).await?;
            if let Err(e) = connection.logout().await {
                warn!(error = %e, "Failed to log out JWT bearer connection");
            }
            return Ok(AuthResponse { auth: sentinel });
        }

        let username = credentials
            .username
            .as_deref()
            .ok_or(ConnectorError::InvalidUsername)?;
        let password = credentials
            .password
            .as_deref()
            .ok_or(ConnectorError::InvalidPassword)?;

        match self
            .store
            .lookup_user(username, |entry| entry.password_matches(password))
        {
            UserLookup::Known {
                token,
                session: Some(true),
            } => {
                debug!(username, token = %token, "Session cache hit");
                return Ok(AuthResponse {
                    auth: AuthToken::from(token),
                });
            }
            UserLookup::Known {
                token,
                session: Some(false),
            } => {
                debug!(username, token = %token, "Cached session rejected");
                return Err(ConnectorError::InvalidCredentials);
            }
            // Expired but not yet evicted; the new login replaces the mapping.
            UserLookup::Known {
                token,
                session: None,
            } => {
                debug!(username, token = %token, "Cached session expired");
            }
            UserLookup::Unknown => {}
        }

        if credentials
            .oauth2
            .as_ref()
            .is_some_and(|oauth2| oauth2.client_secret.is_none())
        {
            return Err(ConnectorError::InvalidClientSecret);
        }

        debug!(username, "Session cache miss, logging in");
        let connection = self
            .factory
            .login(&credentials.login_options(), username, password)
            .await?;

        let token = AuthToken::mint();
        self.store.insert(SessionEntry::new(
            token.clone(),
            username,
            password,
            connection,
        ));
        info!(username, token = %token, "Session established");

        Ok(AuthResponse { auth: token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnectionFactory, MockTokenExchange};
    use forcelink_session::StoreConfig;
    use forcelink_types::OAuth2Client;
    use std::time::Duration;

    struct Fixture {
        coordinator: AuthCoordinator,
        store: SessionStore<SessionEntry>,
        factory: Arc<MockConnectionFactory>,
    }

    fn fixture(defaults: ConnectorConfig) -> Fixture {
        let (store, _expired) =
            SessionStore::spawn(StoreConfig::new().with_ttl(Duration::from_secs(60))).unwrap();
        let factory = Arc::new(MockConnectionFactory::new());
        let jwt = JwtBearerAuthenticator::new(
            Arc::new(MockTokenExchange::new("00Dbearer")),
            factory.clone(),
            AuthToken::from("sentinel"),
        );
        let coordinator =
            AuthCoordinator::new(store.clone(), factory.clone(), jwt, Arc::new(defaults));
        Fixture {
            coordinator,
            store,
            factory,
        }
    }

    #[tokio::test]
    async fn test_missing_username_and_password() {
        let f = fixture(ConnectorConfig::new());

        let err = f
            .coordinator
            .authenticate(&Credentials::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'username' property is missing or invalid.");

        let err = f
            .coordinator
            .authenticate(&Credentials {
                username: Some("a@x.com".into()),
                ..Credentials::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'password' property is missing or invalid.");
        assert_eq!(f.factory.login_count(), 0);
    }

    #[tokio::test]
    async fn test_defaults_supply_credentials() {
        let f = fixture(
            ConnectorConfig::new()
                .with_username("a@x.com")
                .with_password("p1"),
        );
        let response = f.coordinator.authenticate(&Credentials::new()).await.unwrap();
        assert!(f.store.contains(response.auth.as_str()));
        assert_eq!(f.factory.logins()[0].username, "a@x.com");
    }

    #[tokio::test]
    async fn test_oauth2_requires_client_secret() {
        let f = fixture(ConnectorConfig::new());
        let credentials = Credentials::password_login("a@x.com", "p1").with_oauth2(OAuth2Client {
            client_id: Some("cid".into()),
            client_secret: None,
            redirect_uri: None,
        });

        let err = f.coordinator.authenticate(&credentials).await.unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidClientSecret));
        assert_eq!(f.factory.login_count(), 0);
    }

    #[tokio::test]
    async fn test_login_failure_is_not_cached() {
        let f = fixture(ConnectorConfig::new());
        f.factory.reject_logins("INVALID_LOGIN: bad");

        let credentials = Credentials::password_login("a@x.com", "p1");
        let err = f.coordinator.authenticate(&credentials).await.unwrap_err();
        assert_eq!(err.to_string(), "INVALID_LOGIN: bad");
        assert!(f.store.is_empty());

        f.factory.accept_logins();
        f.coordinator.authenticate(&credentials).await.unwrap();
        assert_eq!(f.factory.login_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_and_password_mismatch() {
        let f = fixture(ConnectorConfig::new());
        let first = f
            .coordinator
            .authenticate(&Credentials::password_login("a@x.com", "p1"))
            .await
            .unwrap();
        let again = f
            .coordinator
            .authenticate(&Credentials::password_login("a@x.com", "p1"))
            .await
            .unwrap();
        assert_eq!(again.auth, first.auth);

        let err = f
            .coordinator
            .authenticate(&Credentials::password_login("a@x.com", "p2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidCredentials));
        assert_eq!(f.factory.login_count(), 1);
        assert_eq!(f.store.token_for("a@x.com"), Some(first.auth.into_string()));
    }

    #[tokio::test]
    async fn test_sandbox_login_url() {
        let f = fixture(ConnectorConfig::new().with_sandbox(true));
        f.coordinator
            .authenticate(&Credentials::password_login("a@x.com", "p1"))
            .await
            .unwrap();
        assert_eq!(
            f.factory.logins()[0].login_url,
            forcelink_types::SANDBOX_LOGIN_URL
        );
    }
}
