//! Default [`HttpClient`] implementation backed by reqwest.
//!
//! Timeouts, User-Agent, compression and proxy handling are decided here so
//! `CheckClient` only deals with the text.ru protocol.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, instrument, warn};

use crate::user_agent;

use super::{FormData, HttpClient, HttpResponse, Method, TransportError};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Timeout settings for [`ReqwestHttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// reqwest-backed HTTP client.
///
/// Create once and share; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] when reqwest cannot build a client,
    /// or [`TransportError::Client`] when client construction panicked.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeouts(HttpTimeouts::default())
    }

    /// Creates a client with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    #[instrument(level = "debug")]
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Result<Self, TransportError> {
        let client = match try_build_client(timeouts, false) {
            Ok(client) => client,
            Err(BuildClientFailure::Panic) => {
                // Some sandboxed macOS environments panic when reading system
                // proxy settings; retry with environment proxies only.
                warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
                match try_build_client(timeouts, true) {
                    Ok(client) => client,
                    Err(BuildClientFailure::Panic) => {
                        return Err(TransportError::client(
                            "HTTP client construction panicked while initializing networking",
                        ));
                    }
                    Err(BuildClientFailure::Build(source)) => {
                        return Err(TransportError::Build { source });
                    }
                }
            }
            Err(BuildClientFailure::Build(source)) => return Err(TransportError::Build { source }),
        };
        Ok(Self { client })
    }

    /// Wraps an already configured reqwest client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    #[instrument(skip_all, fields(url = %url, method = %method))]
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: &FormData,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form.encode())
            .send()
            .await
            .map_err(|error| classify_send_error(url, error))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "text.ru answered with error status");
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| classify_send_error(url, error))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(HttpResponse::new(status.as_u16(), body))
    }
}

fn classify_send_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        warn!(url, "Request timed out");
        TransportError::timeout(url)
    } else {
        warn!(url, error = %error, "Request failed");
        TransportError::network(url, error)
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_timeout_secs))
        .timeout(Duration::from_secs(timeouts.read_timeout_secs))
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    for (scheme, names) in [
        ("https", ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        ("http", ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
    ] {
        let Some(proxy) = first_non_empty_var(&names) else {
            continue;
        };
        let resolved = if scheme == "https" {
            Proxy::https(&proxy)
        } else {
            Proxy::http(&proxy)
        };
        if let Ok(resolved) = resolved {
            builder = builder.proxy(resolved);
        }
    }
    builder
}

fn first_non_empty_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
