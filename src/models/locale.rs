//! Locale model
//!
//! A locale is selected by the first URL path segment (`/en/...`, `/ja/...`).
//! Content and UI strings are keyed by the display-language label
//! (`"English"`, `"日本語"`) rather than by the ISO code.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Supported display locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
    Pt,
    De,
    Ja,
    Zh,
}

impl Locale {
    /// Fallback locale for every lookup
    pub const DEFAULT: Locale = Locale::En;

    /// All supported locales, in language-switcher order
    pub const ALL: [Locale; 6] = [
        Locale::En,
        Locale::Es,
        Locale::Pt,
        Locale::De,
        Locale::Ja,
        Locale::Zh,
    ];

    /// URL path segment
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Pt => "pt",
            Locale::De => "de",
            Locale::Ja => "ja",
            Locale::Zh => "zh",
        }
    }

    /// Display-language label used as the key of content maps
    pub fn label(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
            Locale::Pt => "Português",
            Locale::De => "Deutsch",
            Locale::Ja => "日本語",
            Locale::Zh => "中文",
        }
    }

    /// Parse a path segment (case-insensitive)
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Parse a display-language label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == label)
    }

    /// Format a publication date the way readers of this locale expect
    pub fn format_date(self, date: NaiveDate) -> String {
        let pattern = match self {
            Locale::En => "%B %-d, %Y",
            Locale::Es | Locale::Pt => "%d/%m/%Y",
            Locale::De => "%d.%m.%Y",
            Locale::Ja | Locale::Zh => "%Y年%-m月%-d日",
        };
        date.format(pattern).to_string()
    }

    /// `lang` attribute for the `<html>` element
    pub fn html_lang(self) -> &'static str {
        match self {
            Locale::Zh => "zh-Hans",
            other => other.code(),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Accepts the same spellings as [`Locale::parse`]
impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        Locale::parse(&code).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown locale '{}', expected one of: en, es, pt, de, ja, zh",
                code
            ))
        })
    }
}
