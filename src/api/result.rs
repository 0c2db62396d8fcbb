//! Typed uniqueness-check result.

use serde::Serialize;

/// Outcome of a finished uniqueness check.
///
/// Values are immutable once constructed; fields are only readable through
/// accessors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    text_id: String,
    unique_percent: f64,
    water_percent: f64,
}

impl CheckResult {
    /// Creates a new result.
    #[must_use]
    pub fn new(text_id: impl Into<String>, unique_percent: f64, water_percent: f64) -> Self {
        Self {
            text_id: text_id.into(),
            unique_percent,
            water_percent,
        }
    }

    /// Identifier the service assigned to the submitted text.
    #[must_use]
    pub fn text_id(&self) -> &str {
        &self.text_id
    }

    /// Share of the text judged unique, 0 to 100.
    #[must_use]
    pub fn unique_percent(&self) -> f64 {
        self.unique_percent
    }

    /// Share of low-information filler content, 0 to 100.
    #[must_use]
    pub fn water_percent(&self) -> f64 {
        self.water_percent
    }
}
