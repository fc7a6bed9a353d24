//! Services layer - Business logic
//!
//! - `blog`: post lookup, localization, listings and related posts
//! - `markdown`: locale-aware Markdown rendering
//! - `emoji`: callout badges and shortcodes
//! - `i18n`: UI string lookup with English fallback

pub mod blog;
pub mod emoji;
pub mod i18n;
pub mod markdown;

pub use blog::{post_url, ArticlePage, BlogService, BlogServiceError};
pub use emoji::{expand_shortcodes, split_badge, Badge};
pub use i18n::Translations;
pub use markdown::{MarkdownRenderer, Rendered, TocEntry};
