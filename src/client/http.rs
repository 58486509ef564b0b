//! Client entry point for the Visier APIs.

use std::sync::Arc;

use crate::api::{ModelService, QueryService};
use crate::auth::{Credentials, Session};
use crate::Result;

use super::config::SessionConfig;

/// The main client for interacting with the Visier APIs.
///
/// The client owns the authenticated [`Session`] and exposes the API
/// services through accessor methods. All service calls funnel through the
/// session's retrying execution primitive, so an expired authentication is
/// refreshed transparently.
pub struct VisierClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) session: Session,
}

impl VisierClient {
    /// Create a client over the given credentials with default
    /// configuration. The session connects lazily on first use.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, SessionConfig::default())
    }

    /// Create a client with explicit session configuration.
    pub fn with_config(credentials: Credentials, config: SessionConfig) -> Self {
        Self::from_session(Session::with_config(credentials, config))
    }

    /// Create a client over an existing session.
    pub fn from_session(session: Session) -> Self {
        Self {
            inner: Arc::new(ClientInner { session }),
        }
    }

    /// Get the query service for aggregate, list, and SQL-like queries.
    pub fn query(&self) -> QueryService {
        QueryService::new(self.inner.clone())
    }

    /// Get the analytic model metadata service.
    pub fn model(&self) -> ModelService {
        ModelService::new(self.inner.clone())
    }

    /// Eagerly connect the underlying session.
    pub async fn connect(&self) -> Result<()> {
        self.inner.session.connect().await
    }

    /// Close the underlying session. The next call reconnects implicitly.
    pub async fn close(&self) {
        self.inner.session.close().await
    }

    /// Get a reference to the underlying session.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }
}

impl Clone for VisierClient {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for VisierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisierClient")
            .field("session", &self.inner.session)
            .finish()
    }
}
