//! Configuration for the forcelink connector.
//!
//! Provides:
//! - [`ConnectorConfig`]: constructor-time defaults (credentials, sandbox
//!   flag, session timeout, JWT bearer settings)
//! - [`Credentials`]: per-call overrides, merged over the defaults exactly
//!   once into [`EffectiveCredentials`]
//! - [`Discovery`]: TOML files layered user, then project, then explicit
//! - Secret overrides from environment variables

pub mod credentials;
pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use credentials::{Credentials, EffectiveCredentials};
pub use discovery::{
    Discovered, Discovery, Layer, LayerKind, LayerStatus, config_home, read_config_file,
};
pub use error::{ConfigError, Result};
pub use secrets::{
    PASSWORD_ENV, PRIVATE_KEY_ENV, SecretSource, resolve_secrets, resolve_secrets_with,
};
pub use types::{ConnectorConfig, DEFAULT_TIMEOUT_MS, DEFAULT_USER_NAME_CLAIM_TYPE};
