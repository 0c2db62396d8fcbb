//! The text.ru request/response adapter.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use super::error::ApiError;
use super::response::{ensure_no_remote_error, parse_object, required_i64, required_string};
use super::result::CheckResult;
use super::{
    ACCOUNT_ENDPOINT, API_METHOD, DEFAULT_BASE_URL, FormData, HttpClient, POST_ENDPOINT,
    parse_check_result,
};

/// Optional settings for [`CheckClient::submit`].
///
/// The defaults submit a private check with no callback, no excluded domains
/// and no visual report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// URL the service calls with the finished result.
    pub result_callback_url: Option<String>,
    /// Publish the result page on the service's site.
    pub is_result_public: bool,
    /// Let the service add its visual report badge to the result.
    pub has_visual_report: bool,
    /// Domains ignored when searching for matches.
    pub excluded_domains: Vec<String>,
}

impl CheckOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result callback URL.
    #[must_use]
    pub fn callback(mut self, url: impl Into<String>) -> Self {
        self.result_callback_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn public(mut self, is_public: bool) -> Self {
        self.is_result_public = is_public;
        self
    }

    #[must_use]
    pub fn visual_report(mut self, enabled: bool) -> Self {
        self.has_visual_report = enabled;
        self
    }

    /// Adds one excluded domain.
    #[must_use]
    pub fn exclude_domain(mut self, domain: impl Into<String>) -> Self {
        self.excluded_domains.push(domain.into());
        self
    }

    /// Adds several excluded domains.
    #[must_use]
    pub fn exclude_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_domains.extend(domains.into_iter().map(Into::into));
        self
    }

    /// Excluded domains with blanks dropped and duplicates removed, keeping
    /// first-occurrence order.
    fn normalized_domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = Vec::with_capacity(self.excluded_domains.len());
        for domain in self.excluded_domains.iter().map(|d| d.trim()) {
            if !domain.is_empty() && !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }
}

/// Client for the text.ru uniqueness-checking API.
///
/// Each operation is a single form-encoded `POST` followed by JSON decoding.
/// Nothing is retried; callers polling [`poll_result`](Self::poll_result)
/// own their interval and cancellation.
pub struct CheckClient {
    api_key: String,
    http: Arc<dyn HttpClient>,
    post_url: String,
    account_url: String,
}

impl CheckClient {
    /// Creates a client for the public text.ru endpoints.
    #[must_use]
    pub fn new(api_key: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            api_key: api_key.into(),
            http,
            post_url: format!("{DEFAULT_BASE_URL}{POST_ENDPOINT}"),
            account_url: format!("{DEFAULT_BASE_URL}{ACCOUNT_ENDPOINT}"),
        }
    }

    /// Creates a client against a custom base URL (mock servers, proxies).
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base_url` is not an absolute URL.
    pub fn with_base_url(
        api_key: impl Into<String>,
        http: Arc<dyn HttpClient>,
        base_url: &str,
    ) -> Result<Self, url::ParseError> {
        let base = normalized_base(base_url)?;
        Ok(Self {
            api_key: api_key.into(),
            http,
            post_url: base.join(POST_ENDPOINT)?.to_string(),
            account_url: base.join(ACCOUNT_ENDPOINT)?.to_string(),
        })
    }

    /// Endpoint used for submission and polling.
    #[must_use]
    pub fn post_url(&self) -> &str {
        &self.post_url
    }

    /// Endpoint used for account queries.
    #[must_use]
    pub fn account_url(&self) -> &str {
        &self.account_url
    }

    /// Submits `text` for checking and returns the service's text id.
    ///
    /// Checking is asynchronous on the remote side; use the returned id with
    /// [`poll_result`](Self::poll_result) or wait for the callback.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Remote`] when the service rejects the submission
    /// and [`ApiError::Transport`] when the request or response fails.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub async fn submit(&self, text: &str, options: &CheckOptions) -> Result<String, ApiError> {
        let form = self.submission_form(text, options);
        let object = parse_object(&self.send(&self.post_url, &form).await?)?;
        ensure_no_remote_error(&object)?;
        let text_id = required_string(&object, "text_uid")?;
        debug!(text_id = %text_id, "Text accepted for checking");
        Ok(text_id)
    }

    /// Asks for the result of an earlier submission.
    ///
    /// A check that has not finished yet is reported by the service as an
    /// error envelope and surfaces as [`ApiError::Remote`].
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit), plus malformed result bodies.
    #[instrument(skip(self))]
    pub async fn poll_result(&self, text_id: &str) -> Result<CheckResult, ApiError> {
        let form = FormData::new()
            .with("uid", text_id)
            .with("userkey", self.api_key.as_str())
            .with("jsonvisible", "detail");
        let body = self.send(&self.post_url, &form).await?;
        self.parse_result(&body, Some(text_id))
    }

    /// Parses a result body without touching the network.
    ///
    /// See [`parse_check_result`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Remote`] for error envelopes and
    /// [`ApiError::Transport`] for malformed bodies.
    pub fn parse_result(
        &self,
        body: &str,
        text_id: Option<&str>,
    ) -> Result<CheckResult, ApiError> {
        parse_check_result(body, text_id)
    }

    /// Returns the remaining character quota on the account.
    ///
    /// # Errors
    ///
    /// Same as [`submit`](Self::submit).
    #[instrument(skip_all)]
    pub async fn available_symbols(&self) -> Result<i64, ApiError> {
        let form = FormData::new()
            .with("method", "get_packages_info")
            .with("userkey", self.api_key.as_str());
        let object = parse_object(&self.send(&self.account_url, &form).await?)?;
        ensure_no_remote_error(&object)?;
        let size = required_i64(&object, "size")?;
        debug!(size, "Fetched available symbols");
        Ok(size)
    }

    pub(crate) fn submission_form(&self, text: &str, options: &CheckOptions) -> FormData {
        let mut form = FormData::new()
            .with("text", text)
            .with("userkey", self.api_key.as_str());

        if let Some(callback) = options
            .result_callback_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            form.insert("callback", callback);
        }

        if options.is_result_public {
            form.insert("visible", "vis_on");
        }

        // The service adds its badge unless told otherwise.
        if !options.has_visual_report {
            form.insert("copying", "noadd");
        }

        let domains = options.normalized_domains();
        if !domains.is_empty() {
            form.insert("exceptdomain", domains.join(" "));
        }

        form
    }

    async fn send(&self, url: &str, form: &FormData) -> Result<String, ApiError> {
        debug!(url, fields = ?form.keys().collect::<Vec<_>>(), "Sending text.ru request");
        match self.http.request(API_METHOD, url, form).await {
            Ok(response) => Ok(response.body_text().to_owned()),
            Err(error) => {
                warn!(url, error = %error, code = error.code(), "text.ru request failed");
                Err(error.into())
            }
        }
    }
}

impl fmt::Debug for CheckClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckClient")
            .field("post_url", &self.post_url)
            .field("account_url", &self.account_url)
            .finish_non_exhaustive()
    }
}

fn normalized_base(base_url: &str) -> Result<Url, url::ParseError> {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}
