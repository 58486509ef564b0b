//! # visier-rs
//!
//! A Rust connector for the Visier People Analytics APIs.
//!
//! This crate manages the connection lifecycle to a Visier tenant:
//! authenticating with either username/password or OAuth2 credentials,
//! transparently refreshing an expired authentication, and exposing a
//! retryable request-execution primitive that the API services build upon.
//!
//! ## Features
//!
//! - **Authentication**: basic (secure-token) and OAuth2 password or
//!   authorization-code grants, including PKCE and a local callback
//!   listener for the interactive flow
//! - **Automatic retry**: one transparent reconnect-and-retry when the
//!   server reports an expired authentication
//! - **Streaming results**: JSON Lines query results decoded one row at a
//!   time, without buffering the body
//! - **Partner access**: optional per-session tenant override for
//!   cross-tenant administrative calls
//! - **Async-first**: built on Tokio and reqwest
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use visier_rs::{BasicCredentials, VisierClient};
//!
//! #[tokio::main]
//! async fn main() -> visier_rs::Result<()> {
//!     let credentials = BasicCredentials::builder()
//!         .host("https://customer.api.visier.io")
//!         .api_key("the-api-key")
//!         .username("analyst@customer.com")
//!         .password("hunter2")
//!         .build()?;
//!
//!     let client = VisierClient::new(credentials.into());
//!
//!     let mut table = client
//!         .query()
//!         .sqllike("SELECT employeeId, FullName FROM Employee", None)
//!         .await?;
//!
//!     println!("columns: {:?}", table.header());
//!     while let Some(row) = table.rows().next().await {
//!         println!("{:?}", row?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom requests
//!
//! Endpoints without a dedicated service are reachable through the
//! session's execution primitive directly. The request-building closure
//! receives a fresh context per attempt, so a retried request is rebuilt
//! against the reconnected transport:
//!
//! ```rust,no_run
//! use visier_rs::{OAuth2Credentials, Session};
//!
//! #[tokio::main]
//! async fn main() -> visier_rs::Result<()> {
//!     let credentials = OAuth2Credentials::builder()
//!         .host("https://customer.api.visier.io")
//!         .api_key("the-api-key")
//!         .client_id("client-id")
//!         .username("analyst@customer.com")
//!         .password("hunter2")
//!         .build()?;
//!
//!     let session = Session::new(credentials.into());
//!     let response = session
//!         .execute(|ctx| async move {
//!             ctx.get("/v1/data/model/analytic-objects").send().await
//!         })
//!         .await?;
//!     println!("{}", response.text().await.unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod table;

// Re-export primary types at crate root for convenience
pub use auth::{
    BasicCredentials, Credentials, OAuth2Credentials, Session, SessionContext, TARGET_TENANT_ID,
};
pub use client::{SessionConfig, VisierClient};
pub use error::{Error, Result};
pub use table::ResultTable;

/// Prelude module for convenient imports.
///
/// ```rust
/// use visier_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{ModelService, QueryService};
    pub use crate::auth::{
        BasicCredentials, Credentials, OAuth2Credentials, Session, SessionContext,
    };
    pub use crate::client::{SessionConfig, VisierClient};
    pub use crate::error::{Error, Result};
    pub use crate::table::ResultTable;
}
