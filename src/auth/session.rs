//! Session management and the retrying execution primitive.
//!
//! A [`Session`] owns one set of [`Credentials`] and the authenticated HTTP
//! transport produced by the connect handshake. Every API call funnels
//! through [`Session::execute`], which connects lazily on first use and
//! transparently reconnects-and-retries exactly once when the server reports
//! an expired authentication (HTTP 401).

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::auth::callback::{CallbackBinding, CallbackServer};
use crate::auth::credentials::{BasicCredentials, Credentials, OAuth2Credentials};
use crate::auth::pkce::PkcePair;
use crate::client::SessionConfig;
use crate::{Error, Result};

const SECURE_TOKEN_PATH: &str = "/v1/admin/visierSecureToken";
const OAUTH_TOKEN_PATH: &str = "/v1/auth/oauth2/token";
const OAUTH_AUTHORIZE_PATH: &str = "/v1/auth/oauth2/authorize";

const APIKEY: HeaderName = HeaderName::from_static("apikey");
const ASID_TOKEN_COOKIE: &str = "VisierASIDToken";

/// Header carrying the partner target tenant id.
pub const TARGET_TENANT_ID: &str = "TargetTenantID";

/// Context passed to the request-building function of [`Session::execute`].
///
/// Wraps the authenticated transport, the target host, and the optional
/// tenant override for exactly one request attempt; it is rebuilt for the
/// retry after a reconnect.
pub struct SessionContext {
    client: Client,
    host: String,
    target_tenant_id: Option<String>,
}

impl SessionContext {
    pub(crate) fn new(client: Client, host: String, target_tenant_id: Option<String>) -> Self {
        Self {
            client,
            host,
            target_tenant_id,
        }
    }

    /// The authenticated HTTP client for this attempt.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A full URL for the given path on the session's host.
    pub fn mk_url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// The tenant override applied to requests built through this context.
    pub fn target_tenant_id(&self) -> Option<&str> {
        self.target_tenant_id.as_deref()
    }

    /// Start a GET request for the given path, with the tenant override
    /// applied when configured.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.with_tenant(self.client.get(self.mk_url(path)))
    }

    /// Start a POST request for the given path, with the tenant override
    /// applied when configured.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.with_tenant(self.client.post(self.mk_url(path)))
    }

    /// Start a PUT request for the given path, with the tenant override
    /// applied when configured.
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.with_tenant(self.client.put(self.mk_url(path)))
    }

    /// Start a DELETE request for the given path, with the tenant override
    /// applied when configured.
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.with_tenant(self.client.delete(self.mk_url(path)))
    }

    fn with_tenant(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.target_tenant_id.as_deref() {
            Some(tenant) => builder.header(TARGET_TENANT_ID, tenant),
            None => builder,
        }
    }
}

/// Authenticated session with the Visier platform.
///
/// The session connects lazily: the first call to
/// [`execute`](Self::execute) performs the handshake appropriate to the
/// credential variant. [`connect`](Self::connect) is available for eager
/// connection at a scope boundary, paired with [`close`](Self::close).
///
/// A `Session` hands out one transport at a time; the transport is replaced
/// in place during a reconnect, so callers sharing a session across tasks
/// serialize their own access.
///
/// # Example
///
/// ```no_run
/// use visier_rs::{BasicCredentials, Session};
///
/// # async fn example() -> visier_rs::Result<()> {
/// let credentials = BasicCredentials::builder()
///     .host("https://customer.api.visier.io")
///     .api_key("the-api-key")
///     .username("analyst@customer.com")
///     .password("hunter2")
///     .build()?;
///
/// let session = Session::new(credentials.into());
/// let response = session
///     .execute(|ctx| async move { ctx.get("/v1/data/model/metrics").send().await })
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    credentials: Credentials,
    config: SessionConfig,
    transport: RwLock<Option<Client>>,
}

impl Session {
    /// Create a session over the given credentials with default
    /// configuration. No network traffic happens until first use.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(credentials: Credentials, config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                credentials,
                config,
                transport: RwLock::new(None),
            }),
        }
    }

    /// The credentials this session authenticates with.
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns `true` when a connect handshake has completed and the
    /// session holds an authenticated transport.
    pub async fn is_connected(&self) -> bool {
        self.inner.transport.read().await.is_some()
    }

    /// Perform the connect handshake for the session's credential variant,
    /// replacing any previously held transport.
    pub async fn connect(&self) -> Result<()> {
        let client = self.handshake().await?;
        *self.inner.transport.write().await = Some(client);
        Ok(())
    }

    /// Drop the authenticated transport, returning the session to the
    /// unconnected state. The next execution reconnects implicitly.
    pub async fn close(&self) {
        *self.inner.transport.write().await = None;
    }

    /// Run a caller-built request with at most one reconnect-and-retry.
    ///
    /// The `call` function receives a fresh [`SessionContext`] per attempt
    /// and returns the HTTP response for one outbound request. A 2xx
    /// response is returned as-is. A 401 on the first attempt triggers a
    /// fresh handshake followed by exactly one retry. Any other failure, or
    /// a failure on the retry, surfaces as [`Error::QueryExecution`]
    /// carrying the status code and body text.
    ///
    /// Total attempts per call never exceed two.
    pub async fn execute<F, Fut>(&self, call: F) -> Result<Response>
    where
        F: Fn(SessionContext) -> Fut,
        Fut: Future<Output = std::result::Result<Response, reqwest::Error>>,
    {
        let mut attempts_left: u8 = 2;
        loop {
            let transport = self.transport().await?;
            let context = SessionContext::new(
                transport,
                self.inner.credentials.host().to_string(),
                self.inner.credentials.target_tenant_id().map(str::to_string),
            );
            let response = call(context).await?;
            attempts_left -= 1;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::UNAUTHORIZED && attempts_left > 0 {
                debug!("request returned 401; reconnecting and retrying once");
                self.connect().await?;
                continue;
            }
            return Err(Error::QueryExecution {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
    }

    /// The current transport, connecting first when the session is not yet
    /// connected.
    async fn transport(&self) -> Result<Client> {
        {
            let guard = self.inner.transport.read().await;
            if let Some(client) = guard.as_ref() {
                return Ok(client.clone());
            }
        }
        let client = self.handshake().await?;
        *self.inner.transport.write().await = Some(client.clone());
        Ok(client)
    }

    async fn handshake(&self) -> Result<Client> {
        match &self.inner.credentials {
            Credentials::Basic(auth) => self.connect_basic(auth).await,
            Credentials::OAuth2(auth) => self.connect_oauth(auth).await,
        }
    }

    /// Username/password handshake against the secure-token endpoint.
    async fn connect_basic(&self, auth: &BasicCredentials) -> Result<Client> {
        debug!(host = auth.host(), "connecting with basic credentials");
        let mut form = vec![
            ("username", auth.username().to_string()),
            ("password", auth.password().expose_secret().to_string()),
        ];
        if let Some(vanity) = auth.vanity() {
            form.push(("vanityName", vanity.to_string()));
        }

        let url = format!("{}{}", auth.host(), SECURE_TOKEN_PATH);
        let response = self.bootstrap_transport()?.post(&url).form(&form).send().await?;

        let status = response.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR && auth.vanity().is_none() {
            return Err(Error::VanityNameRequired);
        }
        if !status.is_success() {
            return Err(Error::Connect {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        // The response body is the opaque ASID token, bound into the
        // transport's cookie state for all subsequent requests.
        let token = response.text().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            header_value(&format!("{}={}", ASID_TOKEN_COOKIE, token.trim()))?,
        );
        headers.insert(APIKEY, header_value(auth.api_key())?);
        self.authenticated_transport(headers)
    }

    async fn connect_oauth(&self, auth: &OAuth2Credentials) -> Result<Client> {
        match (auth.username(), auth.password()) {
            (Some(username), Some(password)) => {
                let password = password.expose_secret().to_string();
                self.connect_oauth_password(auth, username, &password).await
            }
            _ => self.connect_auth_code(auth).await,
        }
    }

    /// Non-interactive (two-legged) OAuth2 password grant.
    async fn connect_oauth_password(
        &self,
        auth: &OAuth2Credentials,
        username: &str,
        password: &str,
    ) -> Result<Client> {
        debug!(host = auth.host(), "connecting with OAuth2 password grant");
        let form = vec![
            ("grant_type", "password".to_string()),
            ("client_id", auth.client_id().to_string()),
            ("scope", "read".to_string()),
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        let token = self.request_token(auth, form).await?;
        self.bearer_transport(&token, auth.api_key())
    }

    /// Interactive (three-legged) OAuth2 authorization-code grant.
    ///
    /// Opens a browser for the authorization and consent screens and runs a
    /// local listener to capture the redirected authorization code. The
    /// listener is stopped on every exit path before the token exchange
    /// result is inspected.
    async fn connect_auth_code(&self, auth: &OAuth2Credentials) -> Result<Client> {
        debug!(host = auth.host(), "connecting with OAuth2 authorization-code grant");
        let pkce = PkcePair::generate();
        let binding = CallbackBinding::new(auth.callback_url().or(auth.redirect_uri()))?;
        let mut server = CallbackServer::new(binding);
        server.start().await?;
        let code = {
            let result = self.await_authorization_code(auth, &pkce, &mut server).await;
            server.stop().await;
            result?
        };

        let form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", auth.client_id().to_string()),
            ("scope", "read".to_string()),
            ("code", code),
            ("code_verifier", pkce.verifier.clone()),
        ];
        let token = self.request_token(auth, form).await?;
        self.bearer_transport(&token, auth.api_key())
    }

    async fn await_authorization_code(
        &self,
        auth: &OAuth2Credentials,
        pkce: &PkcePair,
        server: &mut CallbackServer,
    ) -> Result<String> {
        let url = authorize_url(auth, &pkce.challenge)?;
        if webbrowser::open(&url).is_err() {
            warn!("could not open a browser; navigate to {url} to continue");
        }
        server.recv_code(self.inner.config.auth_code_timeout).await
    }

    /// Issue or exchange a token at the OAuth2 token endpoint.
    async fn request_token(
        &self,
        auth: &OAuth2Credentials,
        mut form: Vec<(&'static str, String)>,
    ) -> Result<String> {
        if let Some(redirect_uri) = auth.redirect_uri() {
            // RFC 6749 section 4.1.3: a redirect_uri used when obtaining the
            // authorization code must accompany the token request as well.
            form.push(("redirect_uri", redirect_uri.to_string()));
        }

        let url = format!("{}{}", auth.host(), OAUTH_TOKEN_PATH);
        let mut request = self
            .bootstrap_transport()?
            .post(&url)
            .header(APIKEY, auth.api_key())
            .form(&form);
        if let Some(secret) = auth.client_secret() {
            request = request.basic_auth(
                auth.client_id(),
                Some(urlencoding::encode(secret.expose_secret()).into_owned()),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connect {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        #[derive(serde::Deserialize)]
        struct TokenResponse {
            access_token: String,
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Plain client used for the handshake requests themselves.
    fn bootstrap_transport(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.inner.config.request_timeout)
            .user_agent(&self.inner.config.user_agent)
            .build()
            .map_err(Error::from)
    }

    /// Client with a bearer access token and API key bound as persistent
    /// header state.
    fn bearer_transport(&self, access_token: &str, api_key: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            header_value(&format!("Bearer {access_token}"))?,
        );
        headers.insert(APIKEY, header_value(api_key)?);
        self.authenticated_transport(headers)
    }

    fn authenticated_transport(&self, headers: HeaderMap) -> Result<Client> {
        Client::builder()
            .timeout(self.inner.config.request_timeout)
            .user_agent(&self.inner.config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(Error::from)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.inner.credentials)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Build the browser-navigated authorization URL for the code grant.
fn authorize_url(auth: &OAuth2Credentials, challenge: &str) -> Result<String> {
    let mut url = Url::parse(auth.host())?.join(OAUTH_AUTHORIZE_PATH)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("apikey", auth.api_key());
        pairs.append_pair("response_type", "code");
        pairs.append_pair("client_id", auth.client_id());
        pairs.append_pair("code_challenge_method", "S256");
        pairs.append_pair("code_challenge", challenge);
        if let Some(redirect_uri) = auth.redirect_uri() {
            pairs.append_pair("redirect_uri", redirect_uri);
        }
    }
    Ok(url.to_string())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidInput(format!("invalid header value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth_credentials() -> OAuth2Credentials {
        OAuth2Credentials::builder()
            .host("https://customer.api.visier.io")
            .api_key("key")
            .client_id("client")
            .redirect_uri("http://localhost:5001/oauth2/callback")
            .build()
            .unwrap()
    }

    #[test]
    fn test_authorize_url_carries_pkce_challenge() {
        let url = authorize_url(&oauth_credentials(), "the-challenge").unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v1/auth/oauth2/authorize");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("apikey".into(), "key".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("client_id".into(), "client".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
        assert!(pairs.contains(&("code_challenge".into(), "the-challenge".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:5001/oauth2/callback".into()
        )));
    }

    #[test]
    fn test_authorize_url_omits_absent_redirect() {
        let auth = OAuth2Credentials::builder()
            .host("https://customer.api.visier.io")
            .api_key("key")
            .client_id("client")
            .build()
            .unwrap();
        let url = authorize_url(&auth, "challenge").unwrap();
        assert!(!url.contains("redirect_uri"));
    }

    #[test]
    fn test_session_debug_redacts_password() {
        let credentials = BasicCredentials::builder()
            .host("https://customer.api.visier.io")
            .api_key("key")
            .username("user")
            .password("super-secret")
            .build()
            .unwrap();
        let session = Session::new(credentials.into());
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_context_urls_and_tenant() {
        let context = SessionContext::new(
            Client::new(),
            "https://customer.api.visier.io".to_string(),
            Some("WFF_abc".to_string()),
        );
        assert_eq!(
            context.mk_url("/v1/data/model/metrics"),
            "https://customer.api.visier.io/v1/data/model/metrics"
        );
        assert_eq!(context.target_tenant_id(), Some("WFF_abc"));
    }
}
