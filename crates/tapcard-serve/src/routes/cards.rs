//! JSON API for publishing and managing cards.
//!
//! Create and update take a `multipart/form-data` body with the profile's
//! text fields and an optional `profile_image` file. Responses carry the
//! card's page URL, QR URL and canonical URL.

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tapcard_core::profile::field;
use tapcard_core::{CardId, Profile, RawFields};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::{self, StoredImage};

/// Links to a published card.
#[derive(Debug, Clone, Serialize)]
pub struct CardLinks {
    /// Card identifier.
    pub id: CardId,
    /// Site-relative page URL.
    pub view_url: String,
    /// Site-relative QR image URL.
    pub qr_url: String,
    /// Absolute URL encoded in the QR code and NFC tag.
    pub canonical_url: String,
}

impl CardLinks {
    fn new(card_id: CardId, canonical_url: String) -> Self {
        Self {
            view_url: format!("/card/{card_id}"),
            qr_url: format!("/card/{card_id}/qr.png"),
            id: card_id,
            canonical_url,
        }
    }
}

/// A stored card with its links.
#[derive(Debug, Clone, Serialize)]
pub struct CardDetail {
    #[serde(flatten)]
    links: CardLinks,
    profile: Profile,
}

/// `POST /api/cards`.
pub async fn create_card(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (mut fields, image_bytes) = read_submission(&state, multipart).await?;
    check_image_reference(&fields, None)?;
    let image = attach_image(&state, &mut fields, image_bytes).await?;

    match state.cards.create(&fields) {
        Ok(published) => Ok((
            StatusCode::CREATED,
            Json(CardLinks::new(published.card_id, published.canonical_url)),
        )),
        Err(e) => {
            if let Some(image) = image {
                image.discard().await;
            }
            Err(e.into())
        }
    }
}

/// `PUT /api/cards/{id}`.
///
/// Replaces every field, including `profile_image`. Omitting the image
/// drops it from the card.
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<CardLinks>, ApiError> {
    let card_id = CardId::from(id);
    let (mut fields, image_bytes) = read_submission(&state, multipart).await?;

    let previous = state.cards.load(&card_id)?.profile_image;
    check_image_reference(&fields, previous.as_deref())?;
    let image = attach_image(&state, &mut fields, image_bytes).await?;

    match state.cards.update(&card_id, &fields) {
        Ok(published) => {
            let current = fields.get(field::PROFILE_IMAGE).map(|s| s.trim());
            if let Some(previous) = previous.as_deref().filter(|p| Some(*p) != current) {
                upload::release(&state.config.upload_dir, previous).await;
            }
            Ok(Json(CardLinks::new(published.card_id, published.canonical_url)))
        }
        Err(e) => {
            if let Some(image) = image {
                image.discard().await;
            }
            Err(e.into())
        }
    }
}

/// `GET /api/cards/{id}`.
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CardDetail>, ApiError> {
    let card_id = CardId::from(id);
    let profile = state.cards.load(&card_id)?;
    let canonical_url = state.cards.locator().canonical_url(&card_id);

    Ok(Json(CardDetail {
        links: CardLinks::new(card_id, canonical_url),
        profile,
    }))
}

/// `DELETE /api/cards/{id}`. Succeeds whether or not the card exists.
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let card_id = CardId::from(id);
    let image = match state.cards.load(&card_id) {
        Ok(profile) => profile.profile_image,
        Err(tapcard_core::Error::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };

    state.cards.remove(&card_id)?;

    if let Some(image) = image {
        upload::release(&state.config.upload_dir, &image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Collect text fields and the optional image bytes from a form.
async fn read_submission(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(RawFields, Option<Bytes>), ApiError> {
    let limit = state.config.max_upload_bytes;
    let mut fields = RawFields::new();
    let mut image_bytes: Option<Bytes> = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let Some(name) = part.name().map(str::to_string) else {
            continue;
        };

        if name == field::PROFILE_IMAGE && part.file_name().is_some() {
            let bytes = part.bytes().await.map_err(|e| multipart_error(e, limit))?;
            // Browsers send an empty file part when nothing was chosen.
            if !bytes.is_empty() {
                image_bytes = Some(bytes);
            }
        } else {
            let value = part.text().await.map_err(|e| multipart_error(e, limit))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, image_bytes))
}

/// Store an uploaded image and point the profile at it.
///
/// Runs only after the whole form was read and checked, so a rejected
/// request leaves nothing behind on disk.
async fn attach_image(
    state: &AppState,
    fields: &mut RawFields,
    bytes: Option<Bytes>,
) -> Result<Option<StoredImage>, ApiError> {
    let Some(bytes) = bytes else {
        return Ok(None);
    };
    let image = upload::save_image(
        &state.config.upload_dir,
        &bytes,
        state.config.max_upload_bytes,
    )
    .await?;
    fields.insert(field::PROFILE_IMAGE.to_string(), image.reference.clone());
    Ok(Some(image))
}

/// Reject text `profile_image` values that point at another card's upload.
/// Only the card's own current image may be kept by reference.
fn check_image_reference(fields: &RawFields, own: Option<&str>) -> Result<(), ApiError> {
    match fields.get(field::PROFILE_IMAGE).map(|s| s.trim()) {
        Some(reference) if upload::is_upload_reference(reference) && Some(reference) != own => {
            Err(ApiError::BadRequest(
                "profile_image must be uploaded as a file".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit, "upload rejected: request body too large");
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
