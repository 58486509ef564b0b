//! Credential definitions for the two supported authentication strategies.
//!
//! A [`BasicCredentials`] value authenticates with username and password
//! against the tenant's secure-token endpoint. An [`OAuth2Credentials`] value
//! authenticates through OAuth2, either with the password grant (when a
//! username and password are present) or with the interactive
//! authorization-code grant.
//!
//! Both variants validate their required fields at construction time; a
//! credential that builds successfully is immutable and complete.

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Environment variable holding the host and protocol portion of the URL.
pub const ENV_HOST: &str = "VISIER_HOST";
/// Environment variable holding the tenant API key.
pub const ENV_APIKEY: &str = "VISIER_APIKEY";
/// Environment variable holding the user name.
pub const ENV_USERNAME: &str = "VISIER_USERNAME";
/// Environment variable holding the user password.
pub const ENV_PASSWORD: &str = "VISIER_PASSWORD";
/// Environment variable holding the optional tenant vanity name.
pub const ENV_VANITY: &str = "VISIER_VANITY";
/// Environment variable holding the OAuth2 client id.
pub const ENV_CLIENT_ID: &str = "VISIER_CLIENT_ID";
/// Environment variable holding the OAuth2 client secret.
pub const ENV_CLIENT_SECRET: &str = "VISIER_CLIENT_SECRET";
/// Environment variable holding the OAuth2 redirect URI.
pub const ENV_REDIRECT_URI: &str = "VISIER_REDIRECT_URI";
/// Environment variable holding the partner target tenant id.
pub const ENV_TARGET_TENANT_ID: &str = "VISIER_TARGET_TENANT_ID";
/// Environment variable holding the local OAuth2 callback binding URL.
pub const ENV_OAUTH_CALLBACK_URL: &str = "VISIER_OAUTH_CALLBACK_URL";

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Authentication configuration, one of the two supported strategies.
///
/// The discriminant is inspected at connect time to select the handshake.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password authentication against the secure-token endpoint.
    Basic(BasicCredentials),
    /// OAuth2 authentication, password or authorization-code grant.
    OAuth2(OAuth2Credentials),
}

impl Credentials {
    /// The host and protocol portion of the URL, e.g.
    /// `https://customer-name.api.visier.io`.
    pub fn host(&self) -> &str {
        match self {
            Credentials::Basic(auth) => auth.host(),
            Credentials::OAuth2(auth) => auth.host(),
        }
    }

    /// The tenant API key.
    pub fn api_key(&self) -> &str {
        match self {
            Credentials::Basic(auth) => auth.api_key(),
            Credentials::OAuth2(auth) => auth.api_key(),
        }
    }

    /// The partner target tenant id, if configured.
    pub fn target_tenant_id(&self) -> Option<&str> {
        match self {
            Credentials::Basic(auth) => auth.target_tenant_id(),
            Credentials::OAuth2(auth) => auth.target_tenant_id(),
        }
    }
}

impl From<BasicCredentials> for Credentials {
    fn from(auth: BasicCredentials) -> Self {
        Credentials::Basic(auth)
    }
}

impl From<OAuth2Credentials> for Credentials {
    fn from(auth: OAuth2Credentials) -> Self {
        Credentials::OAuth2(auth)
    }
}

/// Username/password credentials for the secure-token handshake.
///
/// # Example
///
/// ```
/// use visier_rs::BasicCredentials;
///
/// let credentials = BasicCredentials::builder()
///     .host("https://customer.api.visier.io")
///     .api_key("the-api-key")
///     .username("analyst@customer.com")
///     .password("hunter2")
///     .build()
///     .unwrap();
/// assert_eq!(credentials.username(), "analyst@customer.com");
/// ```
#[derive(Clone)]
pub struct BasicCredentials {
    host: String,
    api_key: String,
    username: String,
    password: SecretString,
    vanity: Option<String>,
    target_tenant_id: Option<String>,
}

impl BasicCredentials {
    /// Start building a set of basic credentials.
    pub fn builder() -> BasicCredentialsBuilder {
        BasicCredentialsBuilder::default()
    }

    /// Build credentials from the `VISIER_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the variables that are unset or
    /// empty.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(host) = env_opt(ENV_HOST) {
            builder = builder.host(host);
        }
        if let Some(api_key) = env_opt(ENV_APIKEY) {
            builder = builder.api_key(api_key);
        }
        if let Some(username) = env_opt(ENV_USERNAME) {
            builder = builder.username(username);
        }
        if let Some(password) = env_opt(ENV_PASSWORD) {
            builder = builder.password(password);
        }
        if let Some(vanity) = env_opt(ENV_VANITY) {
            builder = builder.vanity(vanity);
        }
        if let Some(tenant) = env_opt(ENV_TARGET_TENANT_ID) {
            builder = builder.target_tenant_id(tenant);
        }
        builder.build()
    }

    /// The host and protocol portion of the URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The tenant API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The name of the user to authenticate as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password of the user.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// The optional tenant vanity name.
    pub fn vanity(&self) -> Option<&str> {
        self.vanity.as_deref()
    }

    /// The partner target tenant id, if configured.
    pub fn target_tenant_id(&self) -> Option<&str> {
        self.target_tenant_id.as_deref()
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("vanity", &self.vanity)
            .field("target_tenant_id", &self.target_tenant_id)
            .finish()
    }
}

/// Builder for [`BasicCredentials`].
#[derive(Default)]
pub struct BasicCredentialsBuilder {
    host: Option<String>,
    api_key: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    vanity: Option<String>,
    target_tenant_id: Option<String>,
}

impl BasicCredentialsBuilder {
    /// Set the host and protocol portion of the URL.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the tenant API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the name of the user to authenticate as.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password of the user.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the tenant vanity name.
    pub fn vanity(mut self, vanity: impl Into<String>) -> Self {
        self.vanity = Some(vanity.into());
        self
    }

    /// Set the partner target tenant id.
    pub fn target_tenant_id(mut self, target_tenant_id: impl Into<String>) -> Self {
        self.target_tenant_id = Some(target_tenant_id.into());
        self
    }

    /// Validate the required fields and build the credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every required field that is missing
    /// or empty.
    pub fn build(self) -> Result<BasicCredentials> {
        let mut missing = Vec::new();
        require(&mut missing, "host", self.host.as_deref());
        require(&mut missing, "api_key", self.api_key.as_deref());
        require(&mut missing, "username", self.username.as_deref());
        require(
            &mut missing,
            "password",
            self.password.as_ref().map(|p| p.expose_secret()),
        );
        if !missing.is_empty() {
            return Err(Error::Config { missing });
        }
        Ok(BasicCredentials {
            host: self.host.unwrap_or_default(),
            api_key: self.api_key.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            password: self
                .password
                .unwrap_or_else(|| SecretString::from(String::new())),
            vanity: self.vanity,
            target_tenant_id: self.target_tenant_id,
        })
    }
}

/// OAuth2 credentials for the token endpoint.
///
/// When both a username and a password are present, connecting uses the
/// non-interactive password grant. Otherwise the interactive
/// authorization-code grant runs: a browser is opened for the authorization
/// and consent screens, and a short-lived local listener captures the
/// redirected authorization code.
///
/// # Example
///
/// ```
/// use visier_rs::OAuth2Credentials;
///
/// let credentials = OAuth2Credentials::builder()
///     .host("https://customer.api.visier.io")
///     .api_key("the-api-key")
///     .client_id("client-id")
///     .redirect_uri("http://localhost:5000/oauth2/callback")
///     .build()
///     .unwrap();
/// assert!(credentials.username().is_none());
/// ```
#[derive(Clone)]
pub struct OAuth2Credentials {
    host: String,
    api_key: String,
    client_id: String,
    client_secret: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    redirect_uri: Option<String>,
    callback_url: Option<String>,
    target_tenant_id: Option<String>,
}

impl OAuth2Credentials {
    /// Start building a set of OAuth2 credentials.
    pub fn builder() -> OAuth2CredentialsBuilder {
        OAuth2CredentialsBuilder::default()
    }

    /// Build credentials from the `VISIER_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the variables that are unset or
    /// empty.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(host) = env_opt(ENV_HOST) {
            builder = builder.host(host);
        }
        if let Some(api_key) = env_opt(ENV_APIKEY) {
            builder = builder.api_key(api_key);
        }
        if let Some(client_id) = env_opt(ENV_CLIENT_ID) {
            builder = builder.client_id(client_id);
        }
        if let Some(client_secret) = env_opt(ENV_CLIENT_SECRET) {
            builder = builder.client_secret(client_secret);
        }
        if let Some(username) = env_opt(ENV_USERNAME) {
            builder = builder.username(username);
        }
        if let Some(password) = env_opt(ENV_PASSWORD) {
            builder = builder.password(password);
        }
        if let Some(redirect_uri) = env_opt(ENV_REDIRECT_URI) {
            builder = builder.redirect_uri(redirect_uri);
        }
        if let Some(callback_url) = env_opt(ENV_OAUTH_CALLBACK_URL) {
            builder = builder.callback_url(callback_url);
        }
        if let Some(tenant) = env_opt(ENV_TARGET_TENANT_ID) {
            builder = builder.target_tenant_id(tenant);
        }
        builder.build()
    }

    /// The host and protocol portion of the URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The tenant API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The OAuth2 client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The OAuth2 client secret, present for confidential-client flows.
    pub fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    /// The user name, when the password grant should be used.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The user password, when the password grant should be used.
    pub fn password(&self) -> Option<&SecretString> {
        self.password.as_ref()
    }

    /// The registered redirect URI, if any.
    ///
    /// When absent, the flow completes through the client's registered
    /// default redirect.
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// The local callback binding URL, when it differs from the redirect
    /// URI.
    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    /// The partner target tenant id, if configured.
    pub fn target_tenant_id(&self) -> Option<&str> {
        self.target_tenant_id.as_deref()
    }
}

impl std::fmt::Debug for OAuth2Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Credentials")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("target_tenant_id", &self.target_tenant_id)
            .finish()
    }
}

/// Builder for [`OAuth2Credentials`].
#[derive(Default)]
pub struct OAuth2CredentialsBuilder {
    host: Option<String>,
    api_key: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    redirect_uri: Option<String>,
    callback_url: Option<String>,
    target_tenant_id: Option<String>,
}

impl OAuth2CredentialsBuilder {
    /// Set the host and protocol portion of the URL.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the tenant API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the OAuth2 client id.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the OAuth2 client secret for confidential-client flows.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::from(client_secret.into()));
        self
    }

    /// Set the user name; together with a password this selects the
    /// password grant.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the user password; together with a username this selects the
    /// password grant.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the registered redirect URI for the authorization-code grant.
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the local callback binding URL, when it differs from the
    /// redirect URI.
    pub fn callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    /// Set the partner target tenant id.
    pub fn target_tenant_id(mut self, target_tenant_id: impl Into<String>) -> Self {
        self.target_tenant_id = Some(target_tenant_id.into());
        self
    }

    /// Validate the required fields and build the credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every required field that is missing
    /// or empty.
    pub fn build(self) -> Result<OAuth2Credentials> {
        let mut missing = Vec::new();
        require(&mut missing, "host", self.host.as_deref());
        require(&mut missing, "api_key", self.api_key.as_deref());
        require(&mut missing, "client_id", self.client_id.as_deref());
        if !missing.is_empty() {
            return Err(Error::Config { missing });
        }
        Ok(OAuth2Credentials {
            host: self.host.unwrap_or_default(),
            api_key: self.api_key.unwrap_or_default(),
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret,
            username: self.username,
            password: self.password,
            redirect_uri: self.redirect_uri,
            callback_url: self.callback_url,
            target_tenant_id: self.target_tenant_id,
        })
    }
}

fn require(missing: &mut Vec<String>, name: &str, value: Option<&str>) {
    if value.map_or(true, str::is_empty) {
        missing.push(name.to_string());
    }
}
