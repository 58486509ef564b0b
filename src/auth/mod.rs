//! Authentication and session management for the Visier platform.
//!
//! Two authentication strategies are supported:
//!
//! 1. **Basic** - username/password against the tenant's secure-token
//!    endpoint, returning an opaque ASID token.
//! 2. **OAuth2** - the password grant when a username and password are
//!    present on the credential, or the interactive authorization-code
//!    grant (with PKCE and a local callback listener) otherwise.
//!
//! ```no_run
//! use visier_rs::{OAuth2Credentials, Session};
//!
//! # async fn example() -> visier_rs::Result<()> {
//! let credentials = OAuth2Credentials::builder()
//!     .host("https://customer.api.visier.io")
//!     .api_key("the-api-key")
//!     .client_id("client-id")
//!     .redirect_uri("http://localhost:5000/oauth2/callback")
//!     .build()?;
//!
//! let session = Session::new(credentials.into());
//! session.connect().await?;
//! # Ok(())
//! # }
//! ```

mod callback;
mod credentials;
mod pkce;
mod session;

pub use credentials::{
    BasicCredentials, BasicCredentialsBuilder, Credentials, OAuth2Credentials,
    OAuth2CredentialsBuilder, ENV_APIKEY, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_HOST,
    ENV_OAUTH_CALLBACK_URL, ENV_PASSWORD, ENV_REDIRECT_URI, ENV_TARGET_TENANT_ID, ENV_USERNAME,
    ENV_VANITY,
};
pub use session::{Session, SessionContext, TARGET_TENANT_ID};
