//! Error types for the Visier connector.
//!
//! This module provides a single error type covering every failure mode of
//! the connector, from credential validation through connect handshakes to
//! query execution and result decoding.

use thiserror::Error;

/// A specialized `Result` type for Visier connector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all Visier connector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Credential construction failed because required fields were missing
    /// or empty.
    #[error("missing credentials: {}", missing.join(", "))]
    Config {
        /// Names of the missing or empty required fields.
        missing: Vec<String>,
    },

    /// A connect handshake (token issuance or exchange) failed with a
    /// non-2xx response.
    #[error("connect failed: status={status}, body={body}")]
    Connect {
        /// HTTP status code returned by the token endpoint.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// The tenant requires a vanity name for password authentication.
    ///
    /// Raised when the secure-token endpoint returns HTTP 500 and no vanity
    /// name was supplied on the credential.
    #[error("vanity name is required for logging on to this tenant")]
    VanityNameRequired,

    /// The OAuth2 authorization-code flow failed, typically because the
    /// browser flow did not deliver a code before the flow timeout.
    #[error("OAuth2 connect failed: {0}")]
    OAuthConnect(String),

    /// A request executed through the session failed terminally.
    ///
    /// Raised after the single permitted reconnect-and-retry is exhausted,
    /// or immediately for non-401 failures.
    #[error("query execution failed with status {status}: {body}")]
    QueryExecution {
        /// HTTP status code of the failing response.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// A result body line could not be decoded as JSON.
    #[error("decode error at line {line}: {message}")]
    Decode {
        /// 1-based position of the offending line in the body.
        line: usize,
        /// Description of the JSON parse failure.
        message: String,
    },

    /// A tabular result body contained no lines at all; at least a header
    /// line is required.
    #[error("empty result body; expected a header line")]
    EmptyResult,

    /// Invalid input provided to a function.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// I/O error, e.g. when binding the OAuth2 callback listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Connect { status, .. } | Error::QueryExecution { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this error arose during a connect handshake.
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. } | Error::VanityNameRequired | Error::OAuthConnect(_)
        )
    }

    /// Returns `true` if this error arose while decoding a tabular result.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = Error::QueryExecution {
            status: 403,
            body: "forbidden".into(),
        };
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(Error::EmptyResult.status_code(), None);
    }

    #[test]
    fn test_connect_error_classification() {
        assert!(Error::VanityNameRequired.is_connect_error());
        assert!(Error::OAuthConnect("timed out".into()).is_connect_error());
        assert!(!Error::EmptyResult.is_connect_error());
    }

    #[test]
    fn test_config_error_names_fields() {
        let err = Error::Config {
            missing: vec!["host".into(), "api_key".into()],
        };
        assert_eq!(err.to_string(), "missing credentials: host, api_key");
    }
}
