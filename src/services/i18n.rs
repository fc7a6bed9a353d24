//! UI string dictionaries
//!
//! Strings are grouped per display-language label. Lookup order is the
//! requested locale, then English, then the key itself so a missing entry
//! shows up on the page instead of an empty element.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::Locale;

/// Keys the default theme reads from `t`
///
/// Always present in a bundle so a dictionary missing one still renders.
pub const UI_KEYS: &[&str] = &[
    "all_categories",
    "back_to_blog",
    "blog_subtitle",
    "blog_title",
    "by_author",
    "categories",
    "footer_disclaimer",
    "footer_explore",
    "footer_rights",
    "go_home",
    "hero_subtitle",
    "hero_title",
    "language",
    "latest_posts",
    "min_read",
    "nav_blog",
    "nav_dashboard",
    "nav_home",
    "nav_login",
    "nav_menu",
    "no_posts",
    "not_found_message",
    "not_found_title",
    "on_this_page",
    "page_not_found_message",
    "page_not_found_title",
    "read_more",
    "related_posts",
    "site_tagline",
    "tags",
    "translation_missing",
    "view_all",
];

/// Flat string dictionaries keyed by display-language label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations {
    tables: HashMap<String, HashMap<String, String>>,
}

impl Translations {
    /// Look up `key` for `locale`
    pub fn t<'a>(&'a self, locale: Locale, key: &'a str) -> &'a str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(Locale::DEFAULT, key))
            .unwrap_or(key)
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.tables
            .get(locale.label())
            .and_then(|table| table.get(key))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Every key known in English or in `locale`, resolved for `locale`
    ///
    /// Passed to templates as `t`. Every entry of [`UI_KEYS`] is present,
    /// falling back to the key itself.
    pub fn bundle(&self, locale: Locale) -> BTreeMap<String, String> {
        let mut bundle: BTreeMap<String, String> = UI_KEYS
            .iter()
            .map(|key| (key.to_string(), key.to_string()))
            .collect();
        for label in [Locale::DEFAULT.label(), locale.label()] {
            if let Some(table) = self.tables.get(label) {
                for (key, value) in table {
                    if !value.is_empty() {
                        bundle.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        bundle
    }

    /// Keys present in English but missing for `locale`
    pub fn missing_keys(&self, locale: Locale) -> Vec<String> {
        let Some(english) = self.tables.get(Locale::DEFAULT.label()) else {
            return Vec::new();
        };
        let mut missing: Vec<String> = english
            .keys()
            .filter(|key| self.lookup(locale, key).is_none())
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    /// Labels that have a dictionary but match no supported locale
    pub fn unknown_labels(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .tables
            .keys()
            .filter(|label| Locale::from_label(label).is_none())
            .cloned()
            .collect();
        unknown.sort();
        unknown
    }
}
