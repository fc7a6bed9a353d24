//! Blog service
//!
//! Resolves posts for a locale, renders their bodies and picks related posts.
//! Rendered HTML is cached per locale and post since content never changes
//! while the process runs.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::{Cache, CacheLayer};
use crate::content::ContentStore;
use crate::models::{BlogPost, Locale, PostCard, PostView};
use crate::services::markdown::{MarkdownRenderer, Rendered, TocEntry};

/// Cache key prefix for rendered post bodies
const POST_HTML_PREFIX: &str = "post_html";

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    /// No post with this id
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Everything the article page shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePage {
    pub post: PostView,
    pub content_html: String,
    pub toc: Vec<TocEntry>,
    pub related: Vec<PostCard>,
    /// Locales that have their own body for this post
    pub available_locales: Vec<Locale>,
}

/// Blog service over the static content store
pub struct BlogService {
    store: Arc<ContentStore>,
    renderer: MarkdownRenderer,
    cache: Arc<Cache>,
    related_limit: usize,
}

impl BlogService {
    pub fn new(
        store: Arc<ContentStore>,
        renderer: MarkdownRenderer,
        cache: Arc<Cache>,
        related_limit: usize,
    ) -> Self {
        Self {
            store,
            renderer,
            cache,
            related_limit,
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Look up a post by id
    pub fn get(&self, id: &str) -> Result<&BlogPost, BlogServiceError> {
        self.store
            .get(id)
            .ok_or_else(|| BlogServiceError::NotFound(id.to_string()))
    }

    /// Post resolved for `locale`, English where a translation is missing
    pub fn view(&self, id: &str, locale: Locale) -> Result<PostView, BlogServiceError> {
        let post = self.get(id)?;
        Ok(self.to_view(post, locale))
    }

    fn to_view(&self, post: &BlogPost, locale: Locale) -> PostView {
        PostView {
            locale,
            id: post.id.clone(),
            category: post.category.clone(),
            category_label: self.category_label(&post.category, locale),
            image: post.image.clone(),
            read_time: post.read_time,
            date: post.date,
            date_display: locale.format_date(post.date),
            author: post.author.clone(),
            title: post.title.resolve(locale).to_string(),
            excerpt: post.excerpt.resolve(locale).to_string(),
            content: post.content.resolve(locale).to_string(),
            tags: post.tags.clone(),
            translated: post.content.has(locale),
        }
    }

    /// Listing card for `post`
    pub fn card(&self, post: &BlogPost, locale: Locale) -> PostCard {
        PostCard {
            id: post.id.clone(),
            category: post.category.clone(),
            category_label: self.category_label(&post.category, locale),
            image: post.image.clone(),
            read_time: post.read_time,
            date: post.date,
            date_display: locale.format_date(post.date),
            author: post.author.clone(),
            title: post.title.resolve(locale).to_string(),
            excerpt: post.excerpt.resolve(locale).to_string(),
            url: post_url(locale, &post.id),
        }
    }

    /// Translated category name, or the raw key when no translation exists
    pub fn category_label(&self, category: &str, locale: Locale) -> String {
        let key = format!("category_{}", category);
        let label = self.store.translations().t(locale, &key);
        if label == key {
            category.to_string()
        } else {
            label.to_string()
        }
    }

    /// Cards for all posts, newest first, optionally limited to one category
    pub fn list(&self, locale: Locale, category: Option<&str>) -> Vec<PostCard> {
        self.store
            .posts()
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .map(|p| self.card(p, locale))
            .collect()
    }

    /// The `limit` newest posts
    pub fn latest(&self, locale: Locale, limit: usize) -> Vec<PostCard> {
        self.store
            .posts()
            .iter()
            .take(limit)
            .map(|p| self.card(p, locale))
            .collect()
    }

    /// Related posts for `post`
    ///
    /// Explicitly listed ids come first in their listed order; remaining
    /// slots are filled with the newest posts of the same category. The post
    /// itself and unknown ids are skipped.
    pub fn related(&self, post: &BlogPost, locale: Locale) -> Vec<PostCard> {
        let mut picked: Vec<&BlogPost> = Vec::with_capacity(self.related_limit);

        let explicit = post.related.iter().filter_map(|id| self.store.get(id));
        let same_category = self
            .store
            .posts()
            .iter()
            .filter(|p| p.category == post.category);

        for candidate in explicit.chain(same_category) {
            if picked.len() >= self.related_limit {
                break;
            }
            if candidate.id == post.id || picked.iter().any(|p| p.id == candidate.id) {
                continue;
            }
            picked.push(candidate);
        }

        picked.into_iter().map(|p| self.card(p, locale)).collect()
    }

    /// Rendered body of `view`, cached per locale and post
    pub async fn rendered(&self, view: &PostView) -> Result<Rendered, BlogServiceError> {
        let key = format!("{}:{}:{}", POST_HTML_PREFIX, view.locale, view.id);

        match self.cache.get::<Rendered>(&key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e),
        }

        let rendered = self.renderer.render_with_toc(&view.content, view.locale);
        self.cache
            .set(&key, &rendered, self.cache.default_ttl())
            .await?;
        Ok(rendered)
    }

    /// Everything the article page at `/{locale}/blog/{id}` needs
    pub async fn article(&self, id: &str, locale: Locale) -> Result<ArticlePage, BlogServiceError> {
        let post = self.get(id)?;
        let view = self.to_view(post, locale);
        let rendered = self.rendered(&view).await?;
        let related = self.related(post, locale);
        let available_locales = Locale::ALL
            .into_iter()
            .filter(|l| post.content.has(*l))
            .collect();

        Ok(ArticlePage {
            post: view,
            content_html: rendered.html,
            toc: rendered.toc,
            related,
            available_locales,
        })
    }
}

/// Canonical article path
pub fn post_url(locale: Locale, id: &str) -> String {
    format!("/{}/blog/{}", locale.code(), urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::content::fixtures;

    fn service() -> BlogService {
        service_with_limit(3)
    }

    fn service_with_limit(limit: usize) -> BlogService {
        BlogService::new(
            Arc::new(fixtures::store()),
            MarkdownRenderer::new(),
            Arc::new(Cache::Memory(MemoryCache::new())),
            limit,
        )
    }

    #[test]
    fn test_view_exact_locale() {
        let view = service().view("value-betting-basics", Locale::Es).unwrap();
        assert_eq!(view.title, "Fundamentos de las apuestas de valor");
        assert!(view.content.contains("¿Qué es el valor?"));
        assert!(view.translated);
        assert_eq!(view.category_label, "Estrategia");
        assert_eq!(view.date_display, "01/03/2024");
    }

    #[test]
    fn test_view_falls_back_to_english() {
        let view = service().view("value-betting-basics", Locale::Ja).unwrap();
        assert_eq!(view.title, "Value Betting Basics");
        assert_eq!(view.excerpt, "Finding prices that beat the market.");
        assert!(!view.translated);
        assert_eq!(view.category_label, "Strategy");
    }

    #[test]
    fn test_view_unknown_id() {
        let err = service().view("nope", Locale::En).unwrap_err();
        assert!(matches!(err, BlogServiceError::NotFound(id) if id == "nope"));
    }

    #[test]
    fn test_every_post_resolves_in_every_locale() {
        let service = service();
        for post in service.store().posts() {
            for locale in Locale::ALL {
                let view = service.view(&post.id, locale).unwrap();
                assert!(!view.title.is_empty(), "{} in {}", post.id, locale);
            }
        }
    }

    #[test]
    fn test_category_label_without_translation() {
        let service = service();
        assert_eq!(service.category_label("education", Locale::Ja), "Education");
        assert_eq!(service.category_label("tennis", Locale::En), "tennis");
    }

    #[test]
    fn test_list_filters_by_category() {
        let service = service();
        let all = service.list(Locale::En, None);
        assert_eq!(all.len(), 4);
        let education = service.list(Locale::En, Some("education"));
        assert_eq!(education.len(), 1);
        assert_eq!(education[0].url, "/en/blog/reading-odds");
        assert!(service.list(Locale::En, Some("none")).is_empty());
    }

    #[test]
    fn test_latest() {
        let latest = service().latest(Locale::En, 2);
        let ids: Vec<&str> = latest.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bankroll-management", "value-betting-basics"]);
    }

    #[test]
    fn test_related_explicit_order_first() {
        let service = service();
        let post = service.get("value-betting-basics").unwrap();
        let ids: Vec<String> = service.related(post, Locale::En).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["reading-odds", "bankroll-management", "live-betting"]);
    }

    #[test]
    fn test_related_filled_from_category() {
        let service = service();
        let post = service.get("bankroll-management").unwrap();
        let ids: Vec<String> = service.related(post, Locale::En).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["value-betting-basics", "live-betting"]);
    }

    #[test]
    fn test_related_respects_limit_and_excludes_self() {
        let limited = service_with_limit(1);
        let post = limited.get("value-betting-basics").unwrap();
        let related = limited.related(post, Locale::En);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, "reading-odds");

        let service = service();
        for post in service.store().posts() {
            let related = service.related(post, Locale::En);
            assert!(related.len() <= 3);
            assert!(related.iter().all(|c| c.id != post.id));
        }
    }

    #[tokio::test]
    async fn test_article_page() {
        let page = service().article("value-betting-basics", Locale::De).await.unwrap();
        assert_eq!(page.post.title, "Value Betting Basics");
        assert!(page.content_html.contains("<h2 id=\"what-is-value\">"));
        assert!(page.content_html.contains("href=\"/de/blog/reading-odds\""));
        assert!(page.content_html.contains("badge-success"));
        assert_eq!(page.toc.len(), 1);
        assert_eq!(page.available_locales, vec![Locale::En, Locale::Es]);
        assert_eq!(page.related.len(), 3);
    }

    #[tokio::test]
    async fn test_article_unknown_id() {
        let err = service().article("missing", Locale::En).await.unwrap_err();
        assert!(matches!(err, BlogServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rendered_is_cached_per_locale() {
        let service = service();
        let en = service.view("value-betting-basics", Locale::En).unwrap();
        let ja = service.view("value-betting-basics", Locale::Ja).unwrap();

        let first = service.rendered(&en).await.unwrap();
        let cached: Option<Rendered> = service
            .cache
            .get("post_html:en:value-betting-basics")
            .await
            .unwrap();
        assert_eq!(cached.unwrap().html, first.html);

        let ja_html = service.rendered(&ja).await.unwrap().html;
        assert!(ja_html.contains("/ja/blog/reading-odds"));
    }

    #[test]
    fn test_post_url_encodes_id() {
        assert_eq!(post_url(Locale::Ja, "over/under"), "/ja/blog/over%2Funder");
    }
}
