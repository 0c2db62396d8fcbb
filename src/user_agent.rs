//! User-Agent string sent with every API request.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/topot-ru/textru";

/// Default User-Agent for API requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("textru/{version} (+{PROJECT_UA_URL})")
}
