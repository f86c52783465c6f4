//! Error types for the card publication pipeline.
//!
//! Every operation returns one of these as a tagged variant so callers have
//! to handle each outcome explicitly. Nothing is retried internally.

use thiserror::Error;

use crate::locator::Encoding;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`CardService`](crate::CardService) operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Submitted profile was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced card does not exist.
    #[error("card not found: {card_id}")]
    NotFound {
        /// The identifier that was looked up.
        card_id: String,
    },

    /// The canonical URL did not fit the physical encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single rejected profile field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field '{field}': {reason}")]
pub struct ValidationError {
    /// Name of the offending field, as submitted (e.g. `"website"`).
    pub field: &'static str,
    /// Human readable explanation, safe to show to the submitter.
    pub reason: &'static str,
}

impl ValidationError {
    pub(crate) const fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Failures while producing or decoding QR / NFC artifacts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The URL exceeds what the encoding can carry.
    #[error("{encoding} payload of {len} bytes exceeds capacity of {max} bytes")]
    CapacityExceeded {
        /// Which encoding rejected the payload.
        encoding: Encoding,
        /// Payload size that was attempted.
        len: usize,
        /// Largest payload the encoding accepts.
        max: usize,
    },

    /// QR symbol generation failed for a reason other than capacity.
    #[error("QR code generation failed: {0}")]
    Qr(String),

    /// Rasterizing the QR symbol failed.
    #[error("image rendering failed: {0}")]
    Image(String),

    /// The bytes are not a single well-known URI record.
    #[error("malformed NDEF message: {0}")]
    MalformedNdef(String),
}

impl EncodingError {
    /// The encoding responsible for the failure.
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::CapacityExceeded { encoding, .. } => *encoding,
            Self::Qr(_) | Self::Image(_) => Encoding::Qr,
            Self::MalformedNdef(_) => Encoding::Ndef,
        }
    }
}

/// Card store failures. Propagated to callers unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error (e.g. creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The database was written by a newer schema than this build reads.
    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema {
        /// Version stamped in the database.
        found: i32,
        /// Highest version this build understands.
        supported: i32,
    },

    /// A stored row could not be turned back into a profile.
    #[error("corrupt record for card {card_id}: {reason}")]
    Corrupt {
        /// The card whose row is unreadable.
        card_id: String,
        /// What was wrong with it.
        reason: String,
    },
}
