//! text.ru Client Library
//!
//! This library wraps the text.ru uniqueness-checking web API: it submits
//! texts for analysis, fetches finished results, parses result bodies
//! (including those delivered to a callback URL) and reports the remaining
//! character quota.
//!
//! # Architecture
//!
//! - [`api`] - `CheckClient`, the injected `HttpClient` capability, the
//!   reqwest-backed default transport, and typed results and errors

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use api::{
    ApiError, CheckClient, CheckOptions, CheckResult, FormData, HttpClient, HttpResponse,
    HttpTimeouts, ReqwestHttpClient, TransportError, parse_check_result,
};
