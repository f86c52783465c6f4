//! Canonical card URLs and their physical encodings.
//!
//! A card is reachable at exactly one URL, `{base_origin}/card/{card_id}`.
//! The QR image and the NFC payload both carry that same string, so scanning
//! either lands on the page served for the card.

pub mod ndef;
pub mod qr;

use std::fmt;

use crate::error::EncodingError;
use crate::store::CardId;

/// Physical encodings a canonical URL is exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// QR code image.
    Qr,
    /// NFC Data Exchange Format message.
    Ndef,
}

impl Encoding {
    /// Short lowercase label, used in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Ndef => "ndef",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Qr => "QR",
            Self::Ndef => "NDEF",
        })
    }
}

/// Everything needed to reach a card from the physical world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorArtifacts {
    /// The canonical page URL.
    pub canonical_url: String,
    /// PNG image of the QR symbol encoding `canonical_url`.
    pub qr_png: Vec<u8>,
    /// NDEF message with a single URI record for `canonical_url`.
    pub ndef_message: Vec<u8>,
}

/// Derives canonical URLs from a configured origin and encodes them.
#[derive(Debug, Clone)]
pub struct Locator {
    base_origin: String,
    nfc_capacity: Option<usize>,
}

impl Locator {
    /// Create a locator for `base_origin` (e.g. `https://cards.example.com`).
    ///
    /// Trailing slashes are stripped so URLs never contain `//card`.
    pub fn new(base_origin: impl Into<String>) -> Self {
        let base_origin = base_origin.into().trim_end_matches('/').to_string();
        Self {
            base_origin,
            nfc_capacity: None,
        }
    }

    /// Limit NDEF messages to `bytes` (the user memory of the target tag).
    pub fn with_nfc_capacity(mut self, bytes: usize) -> Self {
        self.nfc_capacity = Some(bytes);
        self
    }

    /// The configured origin, without trailing slash.
    pub fn base_origin(&self) -> &str {
        &self.base_origin
    }

    /// `{base_origin}/card/{card_id}`.
    pub fn canonical_url(&self, card_id: &CardId) -> String {
        format!("{}/card/{}", self.base_origin, card_id)
    }

    /// Encode `url` as a PNG QR code.
    pub fn encode_qr(&self, url: &str) -> Result<Vec<u8>, EncodingError> {
        qr::encode_qr(url)
    }

    /// Encode `url` as an NDEF URI message, honouring the tag capacity.
    pub fn encode_nfc(&self, url: &str) -> Result<Vec<u8>, EncodingError> {
        ndef::encode_nfc(url, self.nfc_capacity)
    }

    /// Compute the canonical URL of `card_id` and both encodings of it.
    pub fn artifacts(&self, card_id: &CardId) -> Result<LocatorArtifacts, EncodingError> {
        let canonical_url = self.canonical_url(card_id);
        let qr_png = self.encode_qr(&canonical_url)?;
        let ndef_message = self.encode_nfc(&canonical_url)?;
        Ok(LocatorArtifacts {
            canonical_url,
            qr_png,
            ndef_message,
        })
    }
}
