//! Card lifecycle: publish, update, view, export, remove.
//!
//! [`CardService`] is the only entry point callers need. It validates
//! submissions before anything touches the store, maps missing cards to
//! [`Error::NotFound`], and memoizes rendered pages.
//!
//! A card moves through `Draft -> Published -> (Published | Deleted)`. Drafts
//! exist only as the raw fields of a request; a card is published once `put`
//! succeeds and stays published until removed.

use std::sync::Arc;

use moka::sync::Cache;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{EncodingError, Error, Result, ValidationError};
use crate::locator::{Locator, LocatorArtifacts};
use crate::metrics as m;
use crate::profile::{self, Profile, RawFields};
use crate::render;
use crate::store::{CardId, CardStore};

/// Default number of rendered pages kept in memory.
pub const DEFAULT_RENDER_CACHE_CAPACITY: u64 = 1000;

/// Outcome of a successful publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Identifier of the card.
    pub card_id: CardId,
    /// `{base_origin}/card/{card_id}`.
    pub canonical_url: String,
}

/// Orchestrates validation, storage, rendering and locator encoding.
pub struct CardService {
    store: Arc<dyn CardStore>,
    locator: Locator,
    /// Rendered HTML keyed by card id and a hash of the profile it came
    /// from, so a stale entry can never be served after an update.
    renders: Cache<String, String>,
}

impl CardService {
    /// Create a service over `store` with the default render cache size.
    pub fn new(store: Arc<dyn CardStore>, locator: Locator) -> Self {
        Self::with_cache_capacity(store, locator, DEFAULT_RENDER_CACHE_CAPACITY)
    }

    /// Create a service whose render cache holds at most `capacity` pages.
    pub fn with_cache_capacity(store: Arc<dyn CardStore>, locator: Locator, capacity: u64) -> Self {
        Self {
            store,
            locator,
            renders: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// The locator used for canonical URLs.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Validate `raw` and publish it under a fresh identifier.
    ///
    /// Nothing is written when validation fails.
    pub fn create(&self, raw: &RawFields) -> Result<Published> {
        let profile = checked(raw)?;
        let card_id = CardId::generate();
        self.store.put(&card_id, &profile)?;

        metrics::counter!(m::CARDS_CREATED).increment(1);
        tracing::info!(card_id = %card_id, "card published");

        let canonical_url = self.locator.canonical_url(&card_id);
        Ok(Published {
            card_id,
            canonical_url,
        })
    }

    /// Replace the profile of an existing card. The identifier is kept.
    pub fn update(&self, card_id: &CardId, raw: &RawFields) -> Result<Published> {
        self.ensure_exists(card_id)?;
        let profile = checked(raw)?;
        if !self.store.replace(card_id, &profile)? {
            return Err(not_found(card_id));
        }

        metrics::counter!(m::CARDS_UPDATED).increment(1);
        tracing::info!(card_id = %card_id, "card updated");

        Ok(Published {
            card_id: card_id.clone(),
            canonical_url: self.locator.canonical_url(card_id),
        })
    }

    /// Load the stored profile of a card.
    pub fn load(&self, card_id: &CardId) -> Result<Profile> {
        self.store.get(card_id)?.ok_or_else(|| not_found(card_id))
    }

    /// The card's HTML page.
    pub fn fetch_rendered(&self, card_id: &CardId) -> Result<String> {
        let profile = self.load(card_id)?;

        let Some(key) = cache_key(card_id, &profile) else {
            return Ok(render::render(&profile).into_string());
        };

        if let Some(html) = self.renders.get(&key) {
            metrics::counter!(m::RENDER_CACHE_HITS).increment(1);
            tracing::debug!(card_id = %card_id, "render cache hit");
            return Ok(html);
        }

        metrics::counter!(m::RENDER_CACHE_MISSES).increment(1);
        tracing::debug!(card_id = %card_id, "render cache miss, rendering");
        let html = render::render(&profile).into_string();
        self.renders.insert(key, html.clone());
        Ok(html)
    }

    /// The canonical URL of a card with its QR image and NDEF message.
    pub fn fetch_artifacts(&self, card_id: &CardId) -> Result<LocatorArtifacts> {
        self.ensure_exists(card_id)?;
        self.locator
            .artifacts(card_id)
            .map_err(|e| encoding_failed(card_id, e))
    }

    /// PNG QR code of the card's canonical URL.
    pub fn fetch_qr(&self, card_id: &CardId) -> Result<Vec<u8>> {
        self.ensure_exists(card_id)?;
        let url = self.locator.canonical_url(card_id);
        self.locator
            .encode_qr(&url)
            .map_err(|e| encoding_failed(card_id, e))
    }

    /// Remove a card. Removing a card that does not exist succeeds.
    pub fn remove(&self, card_id: &CardId) -> Result<()> {
        self.store.delete(card_id)?;

        metrics::counter!(m::CARDS_REMOVED).increment(1);
        tracing::info!(card_id = %card_id, "card removed");
        Ok(())
    }

    fn ensure_exists(&self, card_id: &CardId) -> Result<()> {
        if self.store.exists(card_id)? {
            Ok(())
        } else {
            Err(not_found(card_id))
        }
    }
}

fn checked(raw: &RawFields) -> std::result::Result<Profile, ValidationError> {
    profile::validate(raw).inspect_err(|e| {
        metrics::counter!(m::VALIDATION_FAILURES, "field" => e.field).increment(1);
        tracing::info!(field = e.field, reason = e.reason, "profile rejected");
    })
}

fn not_found(card_id: &CardId) -> Error {
    Error::NotFound {
        card_id: card_id.to_string(),
    }
}

fn encoding_failed(card_id: &CardId, e: EncodingError) -> Error {
    metrics::counter!(m::ENCODING_FAILURES, "encoding" => e.encoding().as_str()).increment(1);
    tracing::warn!(card_id = %card_id, error = %e, "canonical URL could not be encoded");
    Error::from(e)
}

fn cache_key(card_id: &CardId, profile: &Profile) -> Option<String> {
    match serde_json::to_vec(profile) {
        Ok(bytes) => Some(format!("{card_id}:{:016x}", xxh3_64(&bytes))),
        Err(e) => {
            tracing::warn!(card_id = %card_id, error = %e, "failed to serialize profile for cache");
            None
        }
    }
}
