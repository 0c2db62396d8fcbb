//! Client for the text.ru uniqueness-checking API.
//!
//! # Architecture
//!
//! - [`CheckClient`] - Builds requests for the three remote operations and
//!   turns responses into typed values
//! - [`HttpClient`] - Async trait for the injected HTTP capability
//! - [`ReqwestHttpClient`] - Default `HttpClient` backed by reqwest
//! - [`parse_check_result`] - Network-free parsing of a result body, for
//!   callback deliveries
//!
//! All requests are form-encoded `POST`s. Submission and polling share the
//! `post` endpoint and are told apart by their fields; quota lookups go to
//! `account`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use textru::api::{CheckClient, CheckOptions, ReqwestHttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! let client = CheckClient::new("my-api-key", http);
//!
//! let options = CheckOptions::new().exclude_domain("example.com");
//! let text_id = client.submit("Some text to check", &options).await?;
//!
//! // Later, once the service has finished:
//! let result = client.poll_result(&text_id).await?;
//! println!("{}% unique", result.unique_percent());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http_client;
mod response;
mod result;

pub use client::{CheckClient, CheckOptions};
pub use error::{ApiError, TransportError, UNKNOWN_ERROR_DESCRIPTION};
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts, ReqwestHttpClient,
};
pub use response::parse_check_result;
pub use result::CheckResult;

use std::fmt;

use async_trait::async_trait;
pub use reqwest::Method;

/// HTTP method used for every API call.
pub const API_METHOD: Method = Method::POST;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.text.ru/";

/// Endpoint path for text submission and result polling.
pub const POST_ENDPOINT: &str = "post";

/// Endpoint path for account queries.
pub const ACCOUNT_ENDPOINT: &str = "account";

/// Form field carrying the API key; redacted from debug output.
const SECRET_FIELD: &str = "userkey";

/// Ordered form fields for an `application/x-www-form-urlencoded` body.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes the fields as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl fmt::Debug for FormData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(key, value)| {
                if key == SECRET_FIELD {
                    (key, "<redacted>")
                } else {
                    (key, value)
                }
            }))
            .finish()
    }
}

/// Response returned by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw response body.
    #[must_use]
    pub fn body_text(&self) -> &str {
        &self.body
    }
}

/// HTTP capability injected into [`CheckClient`].
///
/// Implementations perform one request per call. Timeouts, proxies and
/// status handling belong to the implementation; a client that wants non-2xx
/// responses treated as failures should return
/// [`TransportError::HttpStatus`].
///
/// # Object Safety
///
/// This trait uses `async_trait` so it can be shared as `Arc<dyn HttpClient>`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `form` to `url` as a form-encoded body.
    async fn request(
        &self,
        method: Method,
        url: &str,
        form: &FormData,
    ) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_data_preserves_insertion_order() {
        let form = FormData::new()
            .with("text", "Some text")
            .with("userkey", "k")
            .with("callback", "http://test.com");
        let keys: Vec<&str> = form.keys().collect();
        assert_eq!(keys, ["text", "userkey", "callback"]);
    }

    #[test]
    fn test_form_data_insert_replaces_in_place() {
        let mut form = FormData::new().with("a", "1").with("b", "2");
        form.insert("a", "3");
        assert_eq!(form.len(), 2);
        assert_eq!(form.get("a"), Some("3"));
        assert_eq!(form.keys().next(), Some("a"));
    }

    #[test]
    fn test_form_data_encode_escapes_values() {
        let form = FormData::new()
            .with("text", "Some text & more")
            .with("callback", "http://test.com/process-result");
        assert_eq!(
            form.encode(),
            "text=Some+text+%26+more&callback=http%3A%2F%2Ftest.com%2Fprocess-result"
        );
    }

    #[test]
    fn test_form_data_debug_redacts_api_key() {
        let form = FormData::new().with("userkey", "secret-key").with("uid", "1");
        let debug = format!("{form:?}");
        assert!(!debug.contains("secret-key"), "debug output leaked key: {debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("uid"));
    }

    #[test]
    fn test_http_response_accessors() {
        let response = HttpResponse::new(200, r#"{"size":1}"#);
        assert_eq!(response.status(), 200);
        assert_eq!(response.body_text(), r#"{"size":1}"#);
    }
}
