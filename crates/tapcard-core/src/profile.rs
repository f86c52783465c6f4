//! Profile model and validation of submitted form fields.
//!
//! [`validate`] is the only way to build a [`Profile`] from user input. It
//! trims every field, enforces the required fields, and only admits
//! `http`/`https` URLs for the link fields, so stored profiles never carry
//! `javascript:` or other unsafe schemes.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Raw submitted form fields (field name → text).
///
/// The uploaded image reference, when present, travels under `profile_image`.
pub type RawFields = HashMap<String, String>;

/// Form field names understood by [`validate`].
pub mod field {
    /// Full name (required).
    pub const NAME: &str = "name";
    /// Job title.
    pub const TITLE: &str = "title";
    /// Company.
    pub const COMPANY: &str = "company";
    /// Phone number.
    pub const PHONE: &str = "phone";
    /// Email address (required).
    pub const EMAIL: &str = "email";
    /// Reference to an already-stored uploaded image.
    pub const PROFILE_IMAGE: &str = "profile_image";
    /// Personal or company website.
    pub const WEBSITE: &str = "website";
    /// LinkedIn profile URL.
    pub const LINKEDIN: &str = "linkedin";
    /// Twitter / X profile URL.
    pub const TWITTER: &str = "twitter";
}

const MAX_TEXT_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;
const MAX_URL_LEN: usize = 2048;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap()
});

/// A validated business card profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Full name, never empty.
    pub name: String,
    /// Job title.
    pub title: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Phone number as typed.
    pub phone: Option<String>,
    /// Email address, never empty.
    pub email: String,
    /// Stored image reference. `None` means the default avatar.
    pub profile_image: Option<String>,
    /// Website URL (http/https).
    pub website: Option<String>,
    /// LinkedIn URL (http/https).
    pub linkedin: Option<String>,
    /// Twitter URL (http/https).
    pub twitter: Option<String>,
}

impl Profile {
    /// The twitter handle: whatever follows the last `/` of the twitter URL.
    ///
    /// Returns `None` when there is no twitter URL or the segment is empty.
    pub fn twitter_handle(&self) -> Option<&str> {
        self.twitter.as_deref().and_then(twitter_handle)
    }
}

/// Extract the handle from a twitter URL (the text after the final `/`).
pub fn twitter_handle(url: &str) -> Option<&str> {
    let handle = url.rsplit('/').next().unwrap_or("").trim();
    (!handle.is_empty()).then_some(handle)
}

/// Check that `value` is an absolute `http`/`https` URL with a host.
pub fn is_web_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Validate and normalize submitted fields into a [`Profile`].
///
/// Pure: performs no I/O and never mutates `raw`.
pub fn validate(raw: &RawFields) -> Result<Profile, ValidationError> {
    let name = optional(raw, field::NAME, MAX_TEXT_LEN)?
        .ok_or(ValidationError::new(field::NAME, "is required"))?;

    let email = optional(raw, field::EMAIL, MAX_EMAIL_LEN)?
        .filter(|email| EMAIL_RE.is_match(email))
        .ok_or(ValidationError::new(
            field::EMAIL,
            "must be a valid email address",
        ))?;

    Ok(Profile {
        name,
        title: optional(raw, field::TITLE, MAX_TEXT_LEN)?,
        company: optional(raw, field::COMPANY, MAX_TEXT_LEN)?,
        phone: optional(raw, field::PHONE, MAX_PHONE_LEN)?,
        email,
        profile_image: optional(raw, field::PROFILE_IMAGE, MAX_URL_LEN)?,
        website: web_url(raw, field::WEBSITE)?,
        linkedin: web_url(raw, field::LINKEDIN)?,
        twitter: web_url(raw, field::TWITTER)?,
    })
}

/// Trimmed value of `key`; empty or missing values are `None`.
fn optional(
    raw: &RawFields,
    key: &'static str,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = raw.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_len {
        return Err(ValidationError::new(key, "is too long"));
    }
    Ok(Some(value.to_string()))
}

fn web_url(raw: &RawFields, key: &'static str) -> Result<Option<String>, ValidationError> {
    match optional(raw, key, MAX_URL_LEN)? {
        Some(value) if !is_web_url(&value) => Err(ValidationError::new(
            key,
            "must be an absolute http or https URL",
        )),
        other => Ok(other),
    }
}
