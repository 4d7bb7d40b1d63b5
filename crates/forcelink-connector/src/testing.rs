//! In-memory doubles for the remote seams.
//!
//! [`MockConnectionFactory`] hands out [`MockConnection`]s and keeps every one
//! it created, so tests can count logins and logouts without a network.
//! [`MockTokenExchange`] answers JWT bearer exchanges with a fixed token.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use forcelink_oauth::{JwtBearerRequest, OAuthError, TokenExchange, TokenGrant};
use forcelink_types::{
    Connection, ConnectionError, ConnectionFactory, FindQuery, LoginOptions, Result,
    SharedConnection,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Connection that records calls instead of making them.
#[derive(Debug)]
pub struct MockConnection {
    instance_url: String,
    access_token: Option<String>,
    calls: Mutex<Vec<String>>,
    logouts: AtomicUsize,
    logout_delay: Duration,
    fail_logout: bool,
}

impl MockConnection {
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: None,
            calls: Mutex::new(Vec::new()),
            logouts: AtomicUsize::new(0),
            logout_delay: Duration::ZERO,
            fail_logout: false,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Make `logout` take this long to complete.
    pub fn with_logout_delay(mut self, delay: Duration) -> Self {
        self.logout_delay = delay;
        self
    }

    /// Make `logout` fail (after counting the attempt).
    pub fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Calls made so far, as `"op:argument"` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn logout_count(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    async fn logout(&self) -> Result<()> {
        if !self.logout_delay.is_zero() {
            tokio::time::sleep(self.logout_delay).await;
        }
        self.logouts.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            return Err(ConnectionError::Http("logout refused".to_string()));
        }
        Ok(())
    }

    async fn query(&self, soql: &str) -> Result<Value> {
        self.record(format!("query:{}", soql));
        Ok(json!({ "totalSize": 0, "done": true, "records": [] }))
    }

    async fn find(&self, query: &FindQuery) -> Result<Value> {
        self.record(format!("find:{}", query.entity));
        Ok(json!({ "totalSize": 0, "done": true, "records": [] }))
    }

    async fn describe(&self, object: &str) -> Result<Value> {
        self.record(format!("describe:{}", object));
        Ok(json!({ "name": object }))
    }

    async fn describe_global(&self) -> Result<Value> {
        self.record("describe_global".to_string());
        Ok(json!({ "sobjects": [] }))
    }

    async fn create(&self, entity: &str, details: &Value) -> Result<Value> {
        self.record(format!("create:{}", entity));
        Ok(json!({ "id": "001MOCK", "success": true, "errors": [], "echo": details }))
    }

    async fn update(&self, entity: &str, details: &Value) -> Result<Value> {
        self.record(format!("update:{}", entity));
        Ok(json!({ "id": details.get("Id").cloned().unwrap_or(Value::Null), "success": true, "errors": [] }))
    }

    async fn upsert(&self, entity: &str, _details: &Value, external_id_name: &str) -> Result<Value> {
        self.record(format!("upsert:{}:{}", entity, external_id_name));
        Ok(json!({ "success": true, "errors": [] }))
    }

    async fn destroy(&self, entity: &str, _ids: &Value) -> Result<Value> {
        self.record(format!("destroy:{}", entity));
        Ok(json!({ "success": true, "errors": [] }))
    }
}

/// One password login seen by a [`MockConnectionFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub oauth2: bool,
}

/// Factory that logs in without a network.
#[derive(Debug)]
pub struct MockConnectionFactory {
    instance_url: String,
    logins: Mutex<Vec<LoginRecord>>,
    connections: Mutex<Vec<Arc<MockConnection>>>,
    logout_delays: Mutex<VecDeque<Duration>>,
    login_delay: Duration,
    failure: Mutex<Option<String>>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self {
            instance_url: "https://na1.salesforce.com".to_string(),
            logins: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
            logout_delays: Mutex::new(VecDeque::new()),
            login_delay: Duration::ZERO,
            failure: Mutex::new(None),
        }
    }

    /// Logout delays for the next connections, in creation order.
    pub fn with_logout_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        self.logout_delays.lock().extend(delays);
        self
    }

    /// Sleep this long inside every password login, after recording it.
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    /// Fail every following login with this message.
    pub fn reject_logins(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn accept_logins(&self) {
        *self.failure.lock() = None;
    }

    pub fn logins(&self) -> Vec<LoginRecord> {
        self.logins.lock().clone()
    }

    pub fn login_count(&self) -> usize {
        self.logins.lock().len()
    }

    /// Every connection handed out, password logins and token connections alike.
    pub fn connections(&self) -> Vec<Arc<MockConnection>> {
        self.connections.lock().clone()
    }

    pub fn logout_count(&self) -> usize {
        self.connections
            .lock()
            .iter()
            .map(|c| c.logout_count())
            .sum()
    }

    fn track(&self, connection: MockConnection) -> SharedConnection {
        let connection = match self.logout_delays.lock().pop_front() {
            Some(delay) => connection.with_logout_delay(delay),
            None => connection,
        };
        let connection = Arc::new(connection);
        self.connections.lock().push(connection.clone());
        connection
    }
}

impl Default for MockConnectionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn login(
        &self,
        options: &LoginOptions,
        username: &str,
        password: &str,
    ) -> Result<SharedConnection> {
        self.logins.lock().push(LoginRecord {
            login_url: options.login_url.clone(),
            username: username.to_string(),
            password: password.to_string(),
            oauth2: options.oauth2.is_some(),
        });
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        if let Some(message) = self.failure.lock().clone() {
            return Err(ConnectionError::Auth(message));
        }
        Ok(self.track(MockConnection::new(self.instance_url.clone())))
    }

    fn from_access_token(
        &self,
        instance_url: &str,
        access_token: &str,
        _api_version: &str,
    ) -> SharedConnection {
        self.track(MockConnection::new(instance_url).with_access_token(access_token))
    }
}

/// Token exchange that answers with a fixed grant.
#[derive(Debug)]
pub struct MockTokenExchange {
    grant: TokenGrant,
    requests: Mutex<Vec<JwtBearerRequest>>,
    failure: Option<String>,
}

impl MockTokenExchange {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            grant: TokenGrant {
                access_token: access_token.into(),
                instance_url: None,
                token_type: Some("Bearer".to_string()),
                scope: None,
            },
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    pub fn with_instance_url(mut self, instance_url: impl Into<String>) -> Self {
        self.grant.instance_url = Some(instance_url.into());
        self
    }

    /// Reject every exchange with an `invalid_grant` error.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut exchange = Self::new("");
        exchange.failure = Some(message.into());
        exchange
    }

    pub fn requests(&self) -> Vec<JwtBearerRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TokenExchange for MockTokenExchange {
    async fn exchange(&self, request: &JwtBearerRequest) -> forcelink_oauth::Result<TokenGrant> {
        self.requests.lock().push(request.clone());
        match &self.failure {
            Some(message) => Err(OAuthError::Backend {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(self.grant.clone()),
        }
    }
}
