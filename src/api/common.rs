//! Common API utilities and shared types

use serde::Deserialize;

use crate::api::middleware::ApiError;
use crate::models::Locale;

/// `?locale=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

/// `?locale=&category=` query parameters for post listings
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Parse an optional locale code, defaulting when absent or blank
///
/// An unsupported code is a validation error listing the supported ones.
pub fn parse_locale_param(raw: Option<&str>, default: Locale) -> Result<Locale, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(code) => Locale::parse(code).ok_or_else(|| {
            let supported: Vec<&str> = Locale::ALL.iter().map(|l| l.code()).collect();
            ApiError::with_details(
                "VALIDATION_ERROR",
                format!("Unsupported locale: {}", code),
                serde_json::json!({ "supported": supported }),
            )
        }),
    }
}

/// Treat a blank `category` as no filter
pub fn category_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}
