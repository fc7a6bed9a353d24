//! Blog post model
//!
//! This module provides:
//! - `BlogPost`, the static content record as it is stored in `posts.yml`
//! - `Localized`, a text map keyed by display-language label
//! - `PostView` and `PostCard`, a post resolved for one locale

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Locale;

/// Text keyed by display-language label (`"English"`, `"日本語"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Localized(pub BTreeMap<String, String>);

impl Localized {
    /// Text for exactly this locale, if present and non-empty
    pub fn exact(&self, locale: Locale) -> Option<&str> {
        self.0
            .get(locale.label())
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Text for this locale, falling back to English, then to an empty string
    pub fn resolve(&self, locale: Locale) -> &str {
        self.exact(locale)
            .or_else(|| self.exact(Locale::DEFAULT))
            .unwrap_or("")
    }

    /// Whether the locale has its own text
    pub fn has(&self, locale: Locale) -> bool {
        self.exact(locale).is_some()
    }

    /// Build from `(locale, text)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Locale, S)>,
        S: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(l, s)| (l.label().to_string(), s.into()))
                .collect(),
        )
    }
}

/// Blog post as shipped with the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// URL slug
    pub id: String,
    /// Category key (translated through the UI dictionary as `category_<key>`)
    pub category: String,
    /// Cover image path
    pub image: String,
    /// Estimated reading time in minutes
    pub read_time: u32,
    /// Publication date
    pub date: NaiveDate,
    pub author: String,
    pub title: Localized,
    #[serde(default)]
    pub excerpt: Localized,
    #[serde(default)]
    pub content: Localized,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of related posts, in display order
    #[serde(default, alias = "related_posts")]
    pub related: Vec<String>,
}

/// Post card for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCard {
    pub id: String,
    pub category: String,
    pub category_label: String,
    pub image: String,
    pub read_time: u32,
    pub date: NaiveDate,
    pub date_display: String,
    pub author: String,
    pub title: String,
    pub excerpt: String,
    /// Link to the article in the requested locale
    pub url: String,
}

/// Post resolved for one locale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub locale: Locale,
    pub id: String,
    pub category: String,
    pub category_label: String,
    pub image: String,
    pub read_time: u32,
    pub date: NaiveDate,
    pub date_display: String,
    pub author: String,
    pub title: String,
    pub excerpt: String,
    /// Raw Markdown body
    pub content: String,
    pub tags: Vec<String>,
    /// Whether the body is in the requested locale (false means English fallback)
    pub translated: bool,
}
