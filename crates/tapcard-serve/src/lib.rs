//! tapcard-serve - HTTP front end for digital business cards.
//!
//! Publishes cards from form submissions and serves the page every card's
//! QR code and NFC tag point to.
//!
//! # Architecture
//!
//! - **AppState**: Shared [`tapcard_core::CardService`] and configuration
//! - **Routes**: JSON API under `/api`, public card pages under `/card`
//! - **Upload**: Profile image intake (JPEG/PNG only)
//!
//! # Security
//!
//! - All profile text is HTML-escaped by maud
//! - Links are restricted to http(s) at validation and again at render time
//! - Card pages carry a restrictive Content-Security-Policy
//! - X-Frame-Options: DENY prevents clickjacking

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::Config;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
