//! Public site information API

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::parse_locale_param;
use crate::api::middleware::{ApiError, AppState};
use crate::models::Locale;

/// Language entry of the site info
#[derive(Debug, Serialize, Deserialize)]
pub struct LocaleInfo {
    pub code: String,
    pub label: String,
}

/// Category entry of the site info, labelled in English
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub key: String,
    pub label: String,
    pub posts: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestStatsInfo {
    pub total_requests: u64,
    pub avg_response_time_us: f64,
    pub uptime_seconds: u64,
}

/// Response for public site info
#[derive(Debug, Serialize, Deserialize)]
pub struct SiteInfoResponse {
    pub version: String,
    pub site_name: String,
    pub default_locale: Locale,
    pub locales: Vec<LocaleInfo>,
    pub categories: Vec<CategoryInfo>,
    pub total_posts: usize,
    pub stats: RequestStatsInfo,
}

/// Request for rendering markdown content
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub content: String,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(get_site_info))
        .route("/render", post(render_content))
}

/// GET /api/v1/site/info
async fn get_site_info(State(state): State<AppState>) -> Json<SiteInfoResponse> {
    let blog = &state.blog_service;
    let posts = blog.store().posts();

    let categories = blog
        .store()
        .categories()
        .into_iter()
        .map(|key| CategoryInfo {
            label: blog.category_label(&key, Locale::DEFAULT),
            posts: posts.iter().filter(|p| p.category == key).count(),
            key,
        })
        .collect();

    Json(SiteInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        site_name: state.site.name.clone(),
        default_locale: state.site.default_locale,
        locales: Locale::ALL
            .into_iter()
            .map(|l| LocaleInfo {
                code: l.code().to_string(),
                label: l.label().to_string(),
            })
            .collect(),
        categories,
        total_posts: posts.len(),
        stats: RequestStatsInfo {
            total_requests: state.request_stats.total_requests(),
            avg_response_time_us: state.request_stats.avg_response_time_us(),
            uptime_seconds: state.request_stats.uptime_seconds(),
        },
    })
}

/// POST /api/v1/site/render - Markdown preview for a locale
async fn render_content(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let locale = parse_locale_param(req.locale.as_deref(), state.site.default_locale)?;
    let html = state.blog_service.renderer().render(&req.content, locale);
    Ok(Json(RenderResponse { html }))
}
