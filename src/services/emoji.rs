//! Emoji badges and shortcodes
//!
//! Callout paragraphs in posts start with an emoji (`✅ Compare prices...`).
//! The leading emoji is wrapped in a styled badge. Shortcodes such as
//! `:check:` are expanded to the same emoji first so authors can type either.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;

/// Badge styles for callout emoji
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Success,
    Danger,
    Warning,
    Tip,
    Stats,
    Hot,
    Target,
    Money,
}

impl Badge {
    pub const ALL: [Badge; 8] = [
        Badge::Success,
        Badge::Danger,
        Badge::Warning,
        Badge::Tip,
        Badge::Stats,
        Badge::Hot,
        Badge::Target,
        Badge::Money,
    ];

    /// CSS modifier (`badge-<kind>`)
    pub fn kind(self) -> &'static str {
        match self {
            Badge::Success => "success",
            Badge::Danger => "danger",
            Badge::Warning => "warning",
            Badge::Tip => "tip",
            Badge::Stats => "stats",
            Badge::Hot => "hot",
            Badge::Target => "target",
            Badge::Money => "money",
        }
    }

    // Longest form first so the variation selector is consumed with its base.
    fn forms(self) -> &'static [&'static str] {
        match self {
            Badge::Success => &["\u{2705}", "\u{2714}\u{FE0F}", "\u{2714}"],
            Badge::Danger => &["\u{274C}", "\u{26D4}"],
            Badge::Warning => &["\u{26A0}\u{FE0F}", "\u{26A0}"],
            Badge::Tip => &["\u{1F4A1}"],
            Badge::Stats => &["\u{1F4CA}", "\u{1F4C8}"],
            Badge::Hot => &["\u{1F525}"],
            Badge::Target => &["\u{1F3AF}"],
            Badge::Money => &["\u{1F4B0}", "\u{1F4B5}"],
        }
    }

    /// Badge markup for the matched emoji
    pub fn to_html(self, emoji: &str) -> String {
        format!(
            "<span class=\"badge badge-{}\" role=\"img\" aria-label=\"{}\">{}</span>",
            self.kind(),
            self.kind(),
            emoji
        )
    }
}

/// Split a leading badge emoji from `text`
///
/// Returns the badge, the exact emoji matched and the remaining text.
/// Leading whitespace before the emoji is allowed.
pub fn split_badge(text: &str) -> Option<(Badge, &str, &str)> {
    let trimmed = text.trim_start();
    Badge::ALL.into_iter().find_map(|badge| {
        badge
            .forms()
            .iter()
            .find_map(|form| trimmed.strip_prefix(form).map(|rest| (badge, *form, rest)))
    })
}

static SHORTCODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // Callouts
    m.insert("check", "\u{2705}");
    m.insert("white_check_mark", "\u{2705}");
    m.insert("x", "\u{274C}");
    m.insert("warning", "\u{26A0}\u{FE0F}");
    m.insert("bulb", "\u{1F4A1}");
    m.insert("bar_chart", "\u{1F4CA}");
    m.insert("chart", "\u{1F4C8}");
    m.insert("fire", "\u{1F525}");
    m.insert("dart", "\u{1F3AF}");
    m.insert("moneybag", "\u{1F4B0}");
    // Sports
    m.insert("soccer", "\u{26BD}");
    m.insert("basketball", "\u{1F3C0}");
    m.insert("football", "\u{1F3C8}");
    m.insert("baseball", "\u{26BE}");
    m.insert("tennis", "\u{1F3BE}");
    m.insert("hockey", "\u{1F3D2}");
    m.insert("trophy", "\u{1F3C6}");
    m.insert("medal", "\u{1F3C5}");
    m
});

static SHORTCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":([a-z0-9_]+):").expect("shortcode pattern is valid")
});

/// Replace known `:name:` shortcodes with their emoji; unknown ones stay as typed
pub fn expand_shortcodes(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }
    SHORTCODE_RE.replace_all(text, |caps: &Captures| {
        SHORTCODES
            .get(&caps[1])
            .map(|emoji| emoji.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
}
