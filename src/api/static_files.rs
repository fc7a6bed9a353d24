//! Embedded static assets under `/static/`

use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use crate::api::middleware::{cache_control_static, check_if_none_match};

/// CSS, scripts and images shipped with the binary
#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>, headers: HeaderMap) -> Response {
    // `..` never resolves outside the embedded folder, but reject it early
    if path.split('/').any(|segment| segment == "..") {
        return not_found();
    }

    let Some(file) = StaticAssets::get(&path) else {
        return not_found();
    };

    let etag = format!("\"{}\"", hex(&file.metadata.sha256_hash()[..8]));
    if let Some(not_modified) = check_if_none_match(&headers, &etag) {
        return not_modified;
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, get_content_type(&path))
        .header(header::CACHE_CONTROL, cache_control_static(3600, false))
        .header(header::ETAG, etag)
        .body(Body::from(file.data.into_owned()))
        .unwrap_or_else(|_| not_found())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
