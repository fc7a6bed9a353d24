//! Shared API response types

use serde::{Deserialize, Serialize};

use crate::models::{Locale, PostCard, PostView};
use crate::services::blog::ArticlePage;
use crate::services::markdown::TocEntry;

/// Post list response
#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub posts: Vec<PostCard>,
    pub total: usize,
}

/// Full localized post
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: PostView,
    pub content_html: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub toc: Vec<TocEntry>,
    pub related: Vec<PostCard>,
    /// Locales with their own translation of the body
    pub available_locales: Vec<Locale>,
}

impl From<ArticlePage> for PostResponse {
    fn from(page: ArticlePage) -> Self {
        Self {
            post: page.post,
            content_html: page.content_html,
            toc: page.toc,
            related: page.related,
            available_locales: page.available_locales,
        }
    }
}
