//! Post API endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::{category_filter, parse_locale_param, LocaleQuery, PostListQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, PostResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(get_post))
}

/// GET /api/v1/posts?locale=&category=
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let locale = parse_locale_param(query.locale.as_deref(), state.site.default_locale)?;
    let category = category_filter(query.category.as_deref());
    let posts = state.blog_service.list(locale, category);

    Ok(Json(PostListResponse {
        locale,
        category: category.map(str::to_string),
        total: posts.len(),
        posts,
    }))
}

/// GET /api/v1/posts/{id}?locale=
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<PostResponse>, ApiError> {
    let locale = parse_locale_param(query.locale.as_deref(), state.site.default_locale)?;
    let page = state.blog_service.article(&id, locale).await?;
    Ok(Json(PostResponse::from(page)))
}
