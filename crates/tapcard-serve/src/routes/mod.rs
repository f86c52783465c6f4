//! Route definitions for the card service.
//!
//! ## Routes
//!
//! ### Public
//! - `GET /health` - Health check (JSON)
//! - `GET /card/{id}` - Card page (HTML)
//! - `GET /card/{id}/qr.png` - QR code of the card's canonical URL
//! - `GET /static/default-avatar.svg` - Placeholder avatar
//! - `GET /uploads/{file}` - Uploaded profile images
//!
//! ### API
//! - `POST /api/cards` - Publish a card (multipart form)
//! - `GET /api/cards/{id}` - Stored profile and links
//! - `PUT /api/cards/{id}` - Replace a card's profile (multipart form)
//! - `DELETE /api/cards/{id}` - Remove a card

mod assets;
mod cards;
mod health;
mod page;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tapcard_core::render::components::DEFAULT_AVATAR_PATH;
use tower_http::services::ServeDir;

use crate::state::AppState;
use crate::upload::UPLOADS_PREFIX;

/// Room for the text fields and multipart framing around an image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let uploads = ServeDir::new(&state.config.upload_dir);

    let api = Router::new()
        .route("/cards", post(cards::create_card))
        .route(
            "/cards/{id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/card/{id}", get(page::card_page))
        .route("/card/{id}/qr.png", get(page::card_qr))
        .route(DEFAULT_AVATAR_PATH, get(assets::default_avatar))
        .nest_service(UPLOADS_PREFIX, uploads)
        .nest("/api", api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use tapcard_core::MemoryStore;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::upload::tests::PNG_BYTES;

    const BOUNDARY: &str = "tapcard-test-boundary";

    struct TestApp {
        app: Router,
        _uploads: tempfile::TempDir,
        upload_dir: std::path::PathBuf,
    }

    fn test_app() -> TestApp {
        let uploads = tempfile::tempdir().unwrap();
        let config = Config {
            bind_addr: "127.0.0.1:0".to_string(),
            base_origin: "https://cards.example.com".to_string(),
            db_path: ":memory:".to_string(),
            upload_dir: uploads.path().to_path_buf(),
            max_upload_bytes: 1024,
            nfc_capacity: None,
            metrics_port: None,
        };
        let state = AppState::with_store(config, Arc::new(MemoryStore::new()));
        TestApp {
            app: router(state),
            upload_dir: uploads.path().to_path_buf(),
            _uploads: uploads,
        }
    }

    /// A multipart body from text fields and an optional image file.
    fn form(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profile_image\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn form_request(method: &str, uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn create(app: &Router, fields: &[(&str, &str)], image: Option<&[u8]>) -> Response {
        send(app, form_request("POST", "/api/cards", form(fields, image))).await
    }

    const ADA: &[(&str, &str)] = &[("name", "Ada"), ("email", "ada@example.com")];

    #[tokio::test]
    async fn health_is_ok() {
        let t = test_app();
        let response = send(&t.app, get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn publish_then_view() {
        let t = test_app();
        let response = create(&t.app, ADA, None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let id = body["id"].as_str().unwrap().to_string();
        assert_eq!(body["view_url"], format!("/card/{id}"));
        assert_eq!(body["qr_url"], format!("/card/{id}/qr.png"));
        assert_eq!(
            body["canonical_url"],
            format!("https://cards.example.com/card/{id}")
        );

        let response = send(&t.app, get_request(&format!("/card/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert!(response.headers().contains_key(header::ETAG));
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains(r#"<h1 class="name">Ada</h1>"#));
        assert!(html.contains(r#"src="/static/default-avatar.svg""#));
    }

    #[tokio::test]
    async fn qr_route_serves_png() {
        let t = test_app();
        let body = body_json(create(&t.app, ADA, None).await).await;
        let qr_url = body["qr_url"].as_str().unwrap();

        let response = send(&t.app, get_request(qr_url)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert!(body_bytes(response).await.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn invalid_submission_is_unprocessable() {
        let t = test_app();
        let response = create(
            &t.app,
            &[
                ("name", "Ada"),
                ("email", "ada@example.com"),
                ("website", "javascript:alert(1)"),
            ],
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "website");
    }

    #[tokio::test]
    async fn unknown_card_page_is_html_404() {
        let t = test_app();
        let response = send(&t.app, get_request("/card/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("Card Not Found"));

        let response = send(&t.app, get_request("/card/nope/qr.png")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_card_api_is_json_404() {
        let t = test_app();
        let response = send(&t.app, get_request("/api/cards/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "not_found");

        let response = send(&t.app, form_request("PUT", "/api/cards/nope", form(ADA, None))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_get_delete_lifecycle() {
        let t = test_app();
        let id = body_json(create(&t.app, ADA, None).await).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/cards/{id}");

        let response = send(
            &t.app,
            form_request(
                "PUT",
                &uri,
                form(&[("name", "Ada Lovelace"), ("email", "ada@example.com")], None),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], id.as_str());

        let body = body_json(send(&t.app, get_request(&uri)).await).await;
        assert_eq!(body["profile"]["name"], "Ada Lovelace");
        assert_eq!(body["view_url"], format!("/card/{id}"));

        for _ in 0..2 {
            let request = Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap();
            assert_eq!(send(&t.app, request).await.status(), StatusCode::NO_CONTENT);
        }
        let response = send(&t.app, get_request(&format!("/card/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploaded_image_is_served_and_released() {
        let t = test_app();
        let response = create(&t.app, ADA, Some(PNG_BYTES)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let detail = body_json(send(&t.app, get_request(&format!("/api/cards/{id}"))).await).await;
        let image = detail["profile"]["profile_image"].as_str().unwrap().to_string();
        assert!(image.starts_with("/uploads/") && image.ends_with(".png"));

        let response = send(&t.app, get_request(&image)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, PNG_BYTES);

        let html = String::from_utf8(
            body_bytes(send(&t.app, get_request(&format!("/card/{id}"))).await).await,
        )
        .unwrap();
        assert!(html.contains(&format!(r#"src="{image}""#)));

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/cards/{id}"))
            .body(Body::empty())
            .unwrap();
        send(&t.app, request).await;
        assert_eq!(std::fs::read_dir(&t.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let t = test_app();
        let response = create(&t.app, ADA, Some(b"GIF89a....".as_slice())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(&t.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let t = test_app();
        let mut big = PNG_BYTES.to_vec();
        big.resize(4096, 0);
        let response = create(&t.app, ADA, Some(big.as_slice())).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(std::fs::read_dir(&t.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rejected_card_discards_its_upload() {
        let t = test_app();
        let response = create(&t.app, &[("name", "Ada")], Some(PNG_BYTES)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(std::fs::read_dir(&t.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn foreign_upload_reference_is_rejected() {
        let t = test_app();
        let response = create(
            &t.app,
            &[
                ("name", "Ada"),
                ("email", "ada@example.com"),
                ("profile_image", "/uploads/someone-else.png"),
            ],
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn default_avatar_is_svg() {
        let t = test_app();
        let response = send(&t.app, get_request(DEFAULT_AVATAR_PATH)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }
}
