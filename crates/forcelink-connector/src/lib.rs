//! Session-caching authentication for Salesforce.
//!
//! A [`Connector`] logs in once per username and hands back an opaque token.
//! Later operations present the token (or credentials) and run on the cached
//! connection until its session expires, at which point the connection is
//! logged out in the background.
//!
//! Connectors configured for the JWT bearer flow never cache: every
//! operation makes a fresh token exchange and logs out afterwards, and
//! callers get the connector's fixed sentinel token instead of a session
//! token.
//!
//! # Example
//!
//! ```rust,ignore
//! use forcelink_config::{ConnectorConfig, Credentials};
//! use forcelink_connector::{Connector, OperationOptions};
//!
//! let connector = Connector::new(ConnectorConfig::new())?;
//! let response = connector
//!     .authenticate(Some(&Credentials::password_login("a@x.com", "secret")))
//!     .await?;
//!
//! let accounts = connector
//!     .query(&OperationOptions::new()
//!         .with_auth(response.auth)
//!         .with_soql("SELECT Id, Name FROM Account"))
//!     .await?;
//!
//! connector.close().await;
//! ```

pub mod auth;
pub mod connector;
pub mod error;
pub mod jwt;
pub mod lifecycle;
pub mod options;
pub mod resolver;
pub mod session;
pub mod testing;

pub use auth::AuthCoordinator;
pub use connector::{Connector, ConnectorBuilder};
pub use error::{ConnectorError, Result};
pub use jwt::JwtBearerAuthenticator;
pub use lifecycle::LifecycleManager;
pub use options::OperationOptions;
pub use resolver::{ConnectionResolver, ResolvedConnection};
pub use session::{AuthResponse, AuthToken, SessionEntry, SessionEvent};
