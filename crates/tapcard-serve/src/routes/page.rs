//! Public card routes: the HTML page and its QR code.
//!
//! These are what a phone lands on after scanning a card, so errors render
//! as HTML pages rather than JSON.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tapcard_core::CardId;
use tapcard_core::render::components::CSP_HEADER;

use crate::error::PageError;
use crate::state::AppState;

/// Browser cache lifetime for card pages. Short, since cards can be edited.
const PAGE_CACHE_CONTROL: &str = "public, max-age=60, must-revalidate";

/// Handle `GET /card/{id}`.
pub async fn card_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request_headers: HeaderMap,
) -> Result<Response, PageError> {
    let card_id = CardId::from(id);
    let html = state.cards.fetch_rendered(&card_id)?;
    Ok(build_response(html, &request_headers))
}

/// Handle `GET /card/{id}/qr.png`.
pub async fn card_qr(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let card_id = CardId::from(id);
    let png = state.cards.fetch_qr(&card_id)?;
    Ok(png_response(png))
}

/// Build an HTTP response with HTML content and security/cache headers.
///
/// Answers `304 Not Modified` when the client already holds this version.
fn build_response(html: String, request_headers: &HeaderMap) -> Response {
    let mut headers = HeaderMap::new();

    // Security headers
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(PAGE_CACHE_CONTROL),
    );

    // ETag (xxHash of content)
    let etag = etag(&html);
    let not_modified = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    if not_modified {
        return (StatusCode::NOT_MODIFIED, headers).into_response();
    }

    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    (StatusCode::OK, headers, html).into_response()
}

/// Quoted xxh3 hash of a page body.
fn etag(html: &str) -> String {
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()))
}

/// Build an HTTP response with PNG content and cache headers.
fn png_response(png_bytes: Vec<u8>) -> Response {
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
    ];

    (StatusCode::OK, headers, png_bytes).into_response()
}
