//! HTTP implementation of the forcelink connection traits.
//!
//! [`RestConnectionFactory`] logs in either through the OAuth2
//! username/password grant (when a client registration is supplied) or the
//! SOAP `login` call, and hands out [`RestConnection`]s that speak the REST
//! data API.
//!
//! # Example
//!
//! ```no_run
//! use forcelink_client::RestConnectionFactory;
//! use forcelink_types::{ConnectionFactory, LoginOptions};
//!
//! # async fn example() -> forcelink_types::Result<()> {
//! let factory = RestConnectionFactory::builder().build()?;
//! let conn = factory
//!     .login(&LoginOptions::for_environment(false), "a@x.com", "secret")
//!     .await?;
//!
//! let accounts = conn.query("SELECT Id, Name FROM Account LIMIT 5").await?;
//! println!("{accounts}");
//! conn.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod factory;
pub mod soap;
pub mod soql;

pub use connection::RestConnection;
pub use factory::{FactoryBuilder, RestConnectionFactory};
pub use soql::build_find_soql;
