//! Shared types for the forcelink connector.
//!
//! The session layer never talks to Salesforce directly. Everything that
//! crosses the wire goes through the [`Connection`] and [`ConnectionFactory`]
//! traits defined here, so the caching and auth logic can be exercised with
//! in-memory doubles and the REST implementation can live in its own crate.

pub mod connection;
pub mod error;
pub mod records;

pub use connection::{
    Connection, ConnectionFactory, LoginOptions, OAuth2Client, PRODUCTION_LOGIN_URL,
    SANDBOX_LOGIN_URL, SharedConnection, SharedConnectionFactory, DEFAULT_API_VERSION,
};
pub use error::{ConnectionError, Result};
pub use records::{FindOptions, FindQuery, UserClaim, UserMetadata};
