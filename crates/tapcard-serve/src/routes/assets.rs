//! Built-in static assets.

use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use tapcard_core::render::components::DEFAULT_AVATAR_SVG;

/// Placeholder avatar for cards without a (loadable) profile image.
pub async fn default_avatar() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml")),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            ),
        ],
        DEFAULT_AVATAR_SVG,
    )
}
