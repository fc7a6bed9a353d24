//! Server-rendered HTML pages
//!
//! Every page is rendered through the theme with the shared page shell
//! (navbar, language switcher, mobile menu, footer). HTML routes never return
//! raw errors: a missing locale or post gives the not-found page, a template
//! failure gives a plain 500 page.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::common::category_filter;
use crate::api::middleware::{
    cache_control_private, check_if_none_match, generate_etag, AppState, CurrentUser,
};
use crate::models::Locale;
use crate::services::blog::{post_url, BlogServiceError};
use crate::theme::PageShell;

/// `?category=` on the blog index
#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Category filter entry on the blog index
#[derive(Debug, Serialize)]
struct CategoryLink {
    key: String,
    label: String,
}

/// GET / - redirect to the default locale
pub async fn root_redirect(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&format!("/{}", state.site.default_locale.code()))
}

/// GET /{locale}
pub async fn home(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Extension(user): Extension<CurrentUser>,
    uri: Uri,
) -> Response {
    let Some(locale) = Locale::parse(&locale) else {
        return not_found_page(&state, Locale::DEFAULT, user, uri.path(), false);
    };

    let mut context = TeraContext::new();
    context.insert("posts", &state.blog_service.latest(locale, state.site.home_posts));

    render_page(
        &state,
        "index.html",
        locale,
        user,
        uri.path(),
        |l| format!("/{}", l.code()),
        &context,
        StatusCode::OK,
    )
}

/// GET /{locale}/blog?category=
pub async fn blog_index(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<BlogQuery>,
    Extension(user): Extension<CurrentUser>,
    uri: Uri,
) -> Response {
    let Some(locale) = Locale::parse(&locale) else {
        return not_found_page(&state, Locale::DEFAULT, user, uri.path(), false);
    };

    let blog = &state.blog_service;
    let active_category = category_filter(query.category.as_deref());
    let categories: Vec<CategoryLink> = blog
        .store()
        .categories()
        .into_iter()
        .map(|key| CategoryLink {
            label: blog.category_label(&key, locale),
            key,
        })
        .collect();

    let mut context = TeraContext::new();
    context.insert("posts", &blog.list(locale, active_category));
    context.insert("categories", &categories);
    context.insert("active_category", &active_category);

    let query_suffix = active_category
        .map(|c| format!("?category={}", urlencoding::encode(c)))
        .unwrap_or_default();

    render_page(
        &state,
        "blog.html",
        locale,
        user,
        uri.path(),
        |l| format!("/{}/blog{}", l.code(), query_suffix),
        &context,
        StatusCode::OK,
    )
}

/// GET /{locale}/blog/{id} - the article page
pub async fn article(
    State(state): State<AppState>,
    Path((locale, id)): Path<(String, String)>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let Some(locale) = Locale::parse(&locale) else {
        return not_found_page(&state, Locale::DEFAULT, user, uri.path(), true);
    };

    let page = match state.blog_service.article(&id, locale).await {
        Ok(page) => page,
        Err(BlogServiceError::NotFound(_)) => {
            tracing::debug!("No post '{}' for {}", id, locale);
            return not_found_page(&state, locale, user, uri.path(), true);
        }
        Err(e) => {
            tracing::error!("Failed to load post '{}': {:#}", id, e);
            return server_error();
        }
    };

    let mut context = TeraContext::new();
    context.insert("post", &page.post);
    context.insert("content_html", &page.content_html);
    context.insert("toc", &page.toc);
    context.insert("related", &page.related);
    context.insert("available_locales", &page.available_locales);

    let response = render_page(
        &state,
        "post.html",
        locale,
        user,
        uri.path(),
        |l| post_url(l, &id),
        &context,
        StatusCode::OK,
    );
    with_etag(response, &headers).await
}

/// Fallback for unmatched paths
///
/// The first path segment picks the locale when it is a supported one.
pub async fn fallback(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    uri: Uri,
) -> Response {
    let locale = uri
        .path()
        .trim_start_matches('/')
        .split('/')
        .next()
        .and_then(Locale::parse)
        .unwrap_or(Locale::DEFAULT);
    not_found_page(&state, locale, user, uri.path(), false)
}

/// Localized not-found page with a link home, status 404
///
/// `missing_post` picks the "article not found" wording over the generic one.
pub fn not_found_page(
    state: &AppState,
    locale: Locale,
    user: CurrentUser,
    path: &str,
    missing_post: bool,
) -> Response {
    let mut context = TeraContext::new();
    context.insert("missing_post", &missing_post);
    render_page(
        state,
        "not_found.html",
        locale,
        user,
        path,
        |l| format!("/{}", l.code()),
        &context,
        StatusCode::NOT_FOUND,
    )
}

#[allow(clippy::too_many_arguments)]
fn render_page<F>(
    state: &AppState,
    template: &str,
    locale: Locale,
    user: CurrentUser,
    path: &str,
    url_for: F,
    context: &TeraContext,
    status: StatusCode,
) -> Response
where
    F: Fn(Locale) -> String,
{
    let shell = PageShell::new(
        &state.site.name,
        locale,
        state.blog_service.store().translations(),
        path,
        user.0,
        url_for,
    )
    .with_account_links(&state.auth.login_url, &state.auth.dashboard_url);

    match state.theme_engine.render_page(template, &shell, context) {
        Ok(html) => {
            let mut response = (status, [(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
                .into_response();
            response
                .headers_mut()
                .insert(header::VARY, HeaderValue::from_static("Cookie, Authorization"));
            response
        }
        Err(e) => {
            tracing::error!("Failed to render {}: {}", template, e);
            server_error()
        }
    }
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        crate::theme::ThemeEngine::simple_error_page("The page could not be rendered."),
    )
        .into_response()
}

/// Attach an ETag to a successful page and answer `If-None-Match` with 304
async fn with_etag(response: Response, request_headers: &HeaderMap) -> Response {
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to buffer page body: {}", e);
            return server_error();
        }
    };

    if let Ok(value) = HeaderValue::from_str(&cache_control_private(0)) {
        parts.headers.insert(header::CACHE_CONTROL, value);
    }

    let etag = generate_etag(&bytes);
    if let Some(mut not_modified) = check_if_none_match(request_headers, &etag) {
        // A 304 carries the same caching headers as the 200 it stands for
        for name in [header::VARY, header::CACHE_CONTROL] {
            if let Some(value) = parts.headers.get(&name) {
                not_modified.headers_mut().insert(name, value.clone());
            }
        }
        return not_modified;
    }

    if let Ok(value) = HeaderValue::from_str(&etag) {
        parts.headers.insert(header::ETAG, value);
    }
    Response::from_parts(parts, axum::body::Body::from(bytes))
}
