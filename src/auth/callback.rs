//! Local HTTP listener for the OAuth2 authorization-code callback.
//!
//! During the interactive authorization-code grant, the browser is redirected
//! to a short-lived local endpoint carrying the authorization code. The
//! [`CallbackServer`] binds that endpoint, serves it on a background task,
//! and hands the code to the waiting connect flow through a bounded channel.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_PATH: &str = "/oauth2/callback";

/// Host, port, and path the callback listener binds to.
///
/// Derived by parsing a callback URL; absent components fall back to
/// `localhost`, port `5000`, and `/oauth2/callback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallbackBinding {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl CallbackBinding {
    /// Parse a binding from a callback URL, or all defaults when absent.
    pub fn new(provided_url: Option<&str>) -> Result<Self> {
        let Some(raw) = provided_url else {
            return Ok(Self::default());
        };
        let url = Url::parse(raw)?;
        let host = url
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = url.port().unwrap_or(DEFAULT_PORT);
        let path = match url.path() {
            "" | "/" => DEFAULT_PATH.to_string(),
            path => path.to_string(),
        };
        Ok(Self { host, port, path })
    }
}

impl Default for CallbackBinding {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
}

async fn receive_code(
    State(codes): State<mpsc::Sender<String>>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    if let Some(code) = params.code {
        // One code per listener lifetime; extras are dropped by the
        // bounded channel.
        let _ = codes.try_send(code);
    }
    Html("<p>You can now close this window</p>")
}

/// Short-lived HTTP server that captures the OAuth2 authorization code.
///
/// `start` binds the socket and serves on a background task; `stop` signals
/// graceful shutdown and awaits the task. Callers pair the two on every exit
/// path.
pub(crate) struct CallbackServer {
    binding: CallbackBinding,
    codes_tx: mpsc::Sender<String>,
    codes_rx: mpsc::Receiver<String>,
    shutdown: Option<oneshot::Sender<()>>,
    serve_task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Create a server for the given binding. No socket is bound until
    /// [`start`](Self::start).
    pub fn new(binding: CallbackBinding) -> Self {
        let (codes_tx, codes_rx) = mpsc::channel(1);
        Self {
            binding,
            codes_tx,
            codes_rx,
            shutdown: None,
            serve_task: None,
        }
    }

    /// Bind the listener socket and begin serving on a background task.
    pub async fn start(&mut self) -> Result<()> {
        let app = Router::new()
            .route(&self.binding.path, get(receive_code))
            .with_state(self.codes_tx.clone());
        let listener =
            TcpListener::bind((self.binding.host.as_str(), self.binding.port)).await?;
        debug!(
            host = %self.binding.host,
            port = self.binding.port,
            path = %self.binding.path,
            "callback listener bound"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let serve_task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(error) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                debug!(%error, "callback listener terminated with error");
            }
        });

        self.shutdown = Some(shutdown_tx);
        self.serve_task = Some(serve_task);
        Ok(())
    }

    /// Wait for an authorization code, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OAuthConnect`] when the wait times out or the
    /// delivery channel is unexpectedly closed. The server keeps running;
    /// callers still invoke [`stop`](Self::stop).
    pub async fn recv_code(&mut self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, self.codes_rx.recv()).await {
            Ok(Some(code)) => Ok(code),
            Ok(None) => Err(Error::OAuthConnect(
                "authorization code channel closed".to_string(),
            )),
            Err(_) => Err(Error::OAuthConnect(
                "timed out waiting for OAuth2 authorization code".to_string(),
            )),
        }
    }

    /// Signal shutdown and block until the serving task terminates.
    ///
    /// Idempotent: calling `stop` on a server that never started, or twice,
    /// has no effect.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(serve_task) = self.serve_task.take() {
            let _ = serve_task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_defaults() {
        let binding = CallbackBinding::new(None).unwrap();
        assert_eq!(binding.host, "localhost");
        assert_eq!(binding.port, 5000);
        assert_eq!(binding.path, "/oauth2/callback");
    }

    #[test]
    fn test_binding_from_url() {
        let binding =
            CallbackBinding::new(Some("http://127.0.0.1:8080/custom/callback")).unwrap();
        assert_eq!(binding.host, "127.0.0.1");
        assert_eq!(binding.port, 8080);
        assert_eq!(binding.path, "/custom/callback");
    }

    #[test]
    fn test_binding_fills_missing_components() {
        let binding = CallbackBinding::new(Some("http://localhost")).unwrap();
        assert_eq!(binding.port, 5000);
        assert_eq!(binding.path, "/oauth2/callback");
    }

    #[tokio::test]
    async fn test_delivers_code_from_callback_request() {
        let binding = CallbackBinding::new(Some("http://127.0.0.1:18411/oauth2/callback")).unwrap();
        let mut server = CallbackServer::new(binding);
        server.start().await.unwrap();

        let body = reqwest::get("http://127.0.0.1:18411/oauth2/callback?code=XYZ")
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("close this window"));

        let code = server.recv_code(Duration::from_secs(2)).await.unwrap();
        assert_eq!(code, "XYZ");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_recv_code_times_out() {
        let binding = CallbackBinding::new(Some("http://127.0.0.1:18412/oauth2/callback")).unwrap();
        let mut server = CallbackServer::new(binding);
        server.start().await.unwrap();

        let result = server.recv_code(Duration::from_millis(50)).await;
        match result {
            Err(Error::OAuthConnect(message)) => assert!(message.contains("timed out")),
            other => panic!("expected OAuthConnect error, got {other:?}"),
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let mut server = CallbackServer::new(CallbackBinding::default());
        server.stop().await;
    }
}
