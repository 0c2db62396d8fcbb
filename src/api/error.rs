//! Error types for text.ru API operations.
//!
//! Every public operation fails with exactly one [`ApiError`]: either the
//! remote service answered with its JSON error envelope, or the exchange
//! itself broke down ([`TransportError`]).

use thiserror::Error;

/// Description used when the remote error envelope carries no `error_desc`.
pub const UNKNOWN_ERROR_DESCRIPTION: &str = "_unknown_";

/// Errors returned by [`CheckClient`](super::CheckClient) operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote service returned a well-formed `error_code` envelope.
    #[error("text.ru API error {code}: {description}")]
    Remote {
        /// Value of the `error_code` field.
        code: i64,
        /// Value of the `error_desc` field, or `_unknown_` when absent.
        description: String,
    },

    /// The request could not be completed or the response could not be read.
    #[error("text.ru request failed: {0}")]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// Creates a `Remote` error from an error envelope.
    #[must_use]
    pub fn remote(code: i64, description: impl Into<String>) -> Self {
        Self::Remote {
            code,
            description: description.into(),
        }
    }

    /// Returns the numeric error code.
    ///
    /// Remote errors report the service's `error_code`; transport errors
    /// report the HTTP status when one is known and `0` otherwise.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Remote { code, .. } => *code,
            Self::Transport(error) => error.code(),
        }
    }

    /// Returns the human-readable failure description without the prefix
    /// added by `Display`.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Remote { description, .. } => description.clone(),
            Self::Transport(error) => error.to_string(),
        }
    }

    /// Returns true when the remote service itself reported the failure.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// Failures below the remote protocol: network, HTTP status, and response
/// decoding.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS, body read).
    #[error("network error calling {url}: {source}")]
    Network {
        /// Endpoint that failed.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before a response arrived.
    #[error("timeout calling {url}")]
    Timeout {
        /// Endpoint that timed out.
        url: String,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP {status} calling {url}")]
    HttpStatus {
        /// Endpoint that answered with the status.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {source}")]
    Build {
        /// The underlying reqwest builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body is not valid JSON.
    #[error("malformed JSON in response: {source}")]
    Json {
        /// The underlying decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// The response is JSON but a field is missing or has the wrong shape.
    #[error("malformed response field `{field}`: {reason}")]
    MalformedResponse {
        /// Name of the offending field.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Failure reported by a caller-supplied [`HttpClient`](super::HttpClient).
    #[error("{message}")]
    Client {
        /// Description of the failure.
        message: String,
        /// Original failure, when the client kept one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a malformed-response error for `field`.
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a free-form client error without an underlying cause.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a free-form client error that keeps the original failure.
    pub fn client_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Client {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status for status failures, `0` otherwise.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::HttpStatus { status, .. } => i64::from(*status),
            Self::Network { source, .. } | Self::Build { source } => {
                source.status().map_or(0, |status| i64::from(status.as_u16()))
            }
            _ => 0,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}
