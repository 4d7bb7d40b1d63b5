//! The connector facade.

use std::fmt;
use std::sync::Arc;

use forcelink_client::RestConnectionFactory;
use forcelink_config::{ConnectorConfig, Credentials};
use forcelink_oauth::{HttpTokenExchange, SharedTokenExchange};
use forcelink_session::{SessionStore, StoreConfig};
use forcelink_types::{Connection, SharedConnectionFactory};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::auth::AuthCoordinator;
use crate::error::Result;
use crate::jwt::JwtBearerAuthenticator;
use crate::lifecycle::{LifecycleManager, spawn_expiry_cleanup};
use crate::options::OperationOptions;
use crate::resolver::{ConnectionResolver, ResolvedConnection};
use crate::session::{AuthResponse, AuthToken, SessionEntry, SessionEvent};

/// Default capacity of the session event channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Session-caching front end to a Salesforce org.
///
/// Cloning is cheap; clones share the session cache. Must be built inside a
/// Tokio runtime, which runs the expiry timer and logout tasks.
#[derive(Clone)]
pub struct Connector {
    inner: Arc<ConnectorInner>,
}

struct ConnectorInner {
    config: Arc<ConnectorConfig>,
    sentinel: AuthToken,
    store: SessionStore<SessionEntry>,
    coordinator: AuthCoordinator,
    resolver: ConnectionResolver,
    lifecycle: LifecycleManager,
    events: broadcast::Sender<SessionEvent>,
}

impl Connector {
    /// Create a new connector builder.
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    /// Build a connector with the default HTTP transport.
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// The defaults this connector was built with.
    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    /// Token returned for every JWT bearer login of this connector.
    pub fn sentinel(&self) -> &AuthToken {
        &self.inner.sentinel
    }

    /// Number of cached sessions.
    pub fn session_count(&self) -> usize {
        self.inner.store.len()
    }

    /// Check if a token names a cached session.
    pub fn is_cached(&self, token: &AuthToken) -> bool {
        self.inner.store.contains(token.as_str())
    }

    /// Subscribe to session expiry and removal events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Authenticate and return a token for later operations.
    ///
    /// With no credentials the configured defaults are used.
    pub async fn authenticate(&self, credentials: Option<&Credentials>) -> Result<AuthResponse> {
        let defaults = Credentials::default();
        self.inner
            .coordinator
            .authenticate(credentials.unwrap_or(&defaults))
            .await
    }

    /// Run a SOQL query, or a find built from `entity`, `conditions`,
    /// `fields` and `options` when no query text is given.
    pub async fn query(&self, options: &OperationOptions) -> Result<Value> {
        match options.soql.as_deref().filter(|q| !q.is_empty()) {
            Some(soql) => {
                let resolved = self.resolve(options).await?;
                let result = resolved.connection().query(soql).await;
                finish(resolved, result).await
            }
            None => {
                let query = options.find_query()?;
                let resolved = self.resolve(options).await?;
                let result = resolved.connection().find(&query).await;
                finish(resolved, result).await
            }
        }
    }

    /// Describe the object named by `object_class`.
    pub async fn describe(&self, options: &OperationOptions) -> Result<Value> {
        let object = options.require_object_class()?;
        let resolved = self.resolve(options).await?;
        let result = resolved.connection().describe(object).await;
        finish(resolved, result).await
    }

    /// List every object in the org.
    pub async fn describe_global(&self, options: &OperationOptions) -> Result<Value> {
        let resolved = self.resolve(options).await?;
        let result = resolved.connection().describe_global().await;
        finish(resolved, result).await
    }

    /// Create one record or an array of records.
    pub async fn create(&self, options: &OperationOptions) -> Result<Value> {
        let entity = options.require_entity()?;
        let details = options.require_details()?;
        let resolved = self.resolve(options).await?;
        let result = resolved.connection().create(entity, details).await;
        finish(resolved, result).await
    }

    /// Update records; each must carry its `Id`.
    pub async fn update(&self, options: &OperationOptions) -> Result<Value> {
        let entity = options.require_entity()?;
        let details = options.require_details()?;
        let resolved = self.resolve(options).await?;
        let result = resolved.connection().update(entity, details).await;
        finish(resolved, result).await
    }

    /// Insert or update records keyed by `external_id_name`.
    pub async fn upsert(&self, options: &OperationOptions) -> Result<Value> {
        let entity = options.require_entity()?;
        let details = options.require_details()?;
        let external_id_name = options.require_external_id_name()?;
        let resolved = self.resolve(options).await?;
        let result = resolved
            .connection()
            .upsert(entity, details, external_id_name)
            .await;
        finish(resolved, result).await
    }

    /// Delete records by id (`details` is an id, a record, or an array of either).
    pub async fn delete(&self, options: &OperationOptions) -> Result<Value> {
        let entity = options.require_entity()?;
        let details = options.require_details()?;
        let resolved = self.resolve(options).await?;
        let result = resolved.connection().destroy(entity, details).await;
        finish(resolved, result).await
    }

    /// End one cached session. Returns false for unknown tokens.
    pub async fn logout(&self, token: &AuthToken) -> bool {
        self.inner.lifecycle.evict(token).await
    }

    /// Log out every cached session and return how many were closed.
    pub async fn close(&self) -> usize {
        self.inner.lifecycle.close().await
    }

    async fn resolve(&self, options: &OperationOptions) -> Result<ResolvedConnection> {
        let resolved = self.inner.resolver.resolve(options).await?;
        debug!(
            token = %resolved.token(),
            ephemeral = resolved.is_ephemeral(),
            "Connection resolved"
        );
        Ok(resolved)
    }
}

async fn finish(
    resolved: ResolvedConnection,
    result: forcelink_types::Result<Value>,
) -> Result<Value> {
    resolved.release().await;
    Ok(result?)
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("sessions", &self.session_count())
            .field("is_sandbox", &self.inner.config.is_sandbox())
            .field("ttl", &self.inner.store.config().ttl)
            .finish()
    }
}

/// Builder for creating a [`Connector`].
pub struct ConnectorBuilder {
    config: ConnectorConfig,
    connection_factory: Option<SharedConnectionFactory>,
    token_exchange: Option<SharedTokenExchange>,
    event_capacity: usize,
}

impl ConnectorBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::default(),
            connection_factory: None,
            token_exchange: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Set the instance defaults.
    pub fn config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom transport for password logins and token connections.
    pub fn connection_factory(mut self, factory: SharedConnectionFactory) -> Self {
        self.connection_factory = Some(factory);
        self
    }

    /// Use a custom JWT bearer token exchange.
    pub fn token_exchange(mut self, exchange: SharedTokenExchange) -> Self {
        self.token_exchange = Some(exchange);
        self
    }

    /// Set how many session events a slow subscriber may lag behind.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Build the connector, starting its expiry timer and cleanup task.
    pub fn build(self) -> Result<Connector> {
        let factory: SharedConnectionFactory = match self.connection_factory {
            Some(factory) => factory,
            None => Arc::new(RestConnectionFactory::builder().build()?),
        };
        let exchange: SharedTokenExchange = match self.token_exchange {
            Some(exchange) => exchange,
            None => Arc::new(HttpTokenExchange::new()),
        };

        let config = Arc::new(self.config);
        let ttl = config.session_ttl();
        let (store, expired) = SessionStore::spawn(StoreConfig::new().with_ttl(ttl))?;
        let (events, _) = broadcast::channel(self.event_capacity);
        let sentinel = AuthToken::mint();

        let jwt = JwtBearerAuthenticator::new(exchange, factory.clone(), sentinel.clone());
        let coordinator =
            AuthCoordinator::new(store.clone(), factory, jwt.clone(), config.clone());
        let resolver =
            ConnectionResolver::new(config.clone(), store.clone(), coordinator.clone(), jwt);
        let lifecycle = LifecycleManager::new(store.clone(), events.clone());
        spawn_expiry_cleanup(expired, events.clone());

        info!(
            ttl_ms = ttl.as_millis() as u64,
            is_sandbox = config.is_sandbox(),
            jwt_flow = config.use_oauth_jwt_flow(),
            "Connector ready"
        );

        Ok(Connector {
            inner: Arc::new(ConnectorInner {
                config,
                sentinel,
                store,
                coordinator,
                resolver,
                lifecycle,
                events,
            }),
        })
    }
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnectionFactory, MockTokenExchange};

    #[tokio::test]
    async fn test_build_with_defaults() {
        let connector = Connector::new(ConnectorConfig::new()).unwrap();
        assert_eq!(connector.session_count(), 0);
        assert_eq!(
            connector.inner.store.config().ttl,
            std::time::Duration::from_millis(forcelink_config::DEFAULT_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = Connector::builder()
            .connection_factory(Arc::new(MockConnectionFactory::new()))
            .token_exchange(Arc::new(MockTokenExchange::new("t")))
            .build();
        assert!(matches!(result, Err(crate::ConnectorError::Session(_))));
    }

    #[tokio::test]
    async fn test_sentinel_is_per_instance() {
        let a = Connector::builder()
            .connection_factory(Arc::new(MockConnectionFactory::new()))
            .build()
            .unwrap();
        let b = a.clone();
        let c = Connector::builder()
            .connection_factory(Arc::new(MockConnectionFactory::new()))
            .build()
            .unwrap();
        assert_eq!(a.sentinel(), b.sentinel());
        assert_ne!(a.sentinel(), c.sentinel());
    }

    #[tokio::test]
    async fn test_validation_precedes_resolution() {
        let factory = Arc::new(MockConnectionFactory::new());
        let connector = Connector::builder()
            .config(
                ConnectorConfig::new()
                    .with_username("a@x.com")
                    .with_password("p1"),
            )
            .connection_factory(factory.clone())
            .build()
            .unwrap();

        let err = connector
            .create(&OperationOptions::new().with_entity("Account"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(factory.login_count(), 0);
    }
}
