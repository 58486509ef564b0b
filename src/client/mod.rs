//! Client entry point and configuration for the Visier APIs.
//!
//! [`VisierClient`] bundles a [`Session`](crate::Session) with the API
//! services built on top of it.
//!
//! # Example
//!
//! ```no_run
//! use visier_rs::{BasicCredentials, VisierClient};
//!
//! # async fn example() -> visier_rs::Result<()> {
//! let credentials = BasicCredentials::builder()
//!     .host("https://customer.api.visier.io")
//!     .api_key("the-api-key")
//!     .username("analyst@customer.com")
//!     .password("hunter2")
//!     .build()?;
//!
//! let client = VisierClient::new(credentials.into());
//! let metrics = client.model().metrics(None).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod http;

pub use config::SessionConfig;
pub use http::VisierClient;
pub(crate) use http::ClientInner;
