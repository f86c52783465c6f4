//! Core of the tapcard digital business card service.
//!
//! This crate provides:
//! - Profile validation of untrusted form fields
//! - Card persistence behind the [`CardStore`] trait (in-memory and SQLite)
//! - HTML rendering of card pages with maud
//! - Canonical URLs and their QR (PNG) and NFC (NDEF) encodings
//! - [`CardService`], which ties the above together
//! - Prometheus metrics helpers
//! - Shared error types

mod error;
pub mod locator;
pub mod metrics;
pub mod profile;
pub mod render;
mod service;
pub mod store;

pub use error::{EncodingError, Error, Result, StoreError, ValidationError};
pub use locator::{Encoding, Locator, LocatorArtifacts};
pub use profile::{Profile, RawFields, validate};
pub use service::{CardService, DEFAULT_RENDER_CACHE_CAPACITY, Published};
pub use store::{CardId, CardStore, MemoryStore, SqliteStore};
