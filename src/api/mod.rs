//! API layer - HTTP handlers and routing
//!
//! - Server-rendered pages: home, blog index, article, not-found
//! - Post API endpoints
//! - Site info and Markdown preview endpoints
//! - Embedded static assets

pub mod common;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod responses;
pub mod site;
pub mod static_files;

use axum::{
    http::{header, HeaderValue, Method, Uri},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{
    check_if_none_match, extract_session_token, generate_etag, ApiError, AppState, CurrentUser,
    RequestStats,
};

/// Build the JSON API router mounted at `/api/v1`
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/site", site::router())
        .fallback(api_not_found)
}

async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, cross-origin requests disabled", cors_origin);
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/", get(pages::root_redirect))
        .route("/{locale}", get(pages::home))
        .route("/{locale}/blog", get(pages::blog_index))
        .route("/{locale}/blog/{id}", get(pages::article))
        .route("/static/{*path}", get(static_files::serve_static))
        .nest("/api/v1", build_api_router())
        .fallback(pages::fallback)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        // Outermost, runs for all requests
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
