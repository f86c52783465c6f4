//! NDEF URI record encoding.
//!
//! A card's NFC tag carries one NDEF message holding a single well-known URI
//! record (NFC Forum URI RTD):
//!
//! ```text
//! byte 0      MB | ME | SR? | TNF=0x01
//! byte 1      type length (1)
//! byte 2..    payload length (1 byte if SR, else 4 bytes big-endian)
//! ...         type "U"
//! ...         payload = [URI identifier code] [URI remainder, UTF-8]
//! ```
//!
//! The identifier code abbreviates a well-known prefix such as `https://`.
//! Code `0x00` means no abbreviation and the full URI follows.

use crate::error::EncodingError;
use crate::locator::Encoding;

/// Message begin flag.
const FLAG_MB: u8 = 0x80;
/// Message end flag.
const FLAG_ME: u8 = 0x40;
/// Chunk flag (unsupported).
const FLAG_CF: u8 = 0x20;
/// Short record flag: payload length fits in one byte.
const FLAG_SR: u8 = 0x10;
/// ID length present flag.
const FLAG_IL: u8 = 0x08;
/// Type name format mask.
const TNF_MASK: u8 = 0x07;
/// NFC Forum well-known type.
const TNF_WELL_KNOWN: u8 = 0x01;
/// Record type of a URI record.
const URI_TYPE: u8 = b'U';

/// Largest payload a long record's 32-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize;

/// URI identifier codes, indexed by code (NFC Forum URI RTD, table 3).
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Pick the identifier code with the longest prefix matching `uri`.
fn abbreviate(uri: &str) -> (u8, &str) {
    URI_PREFIXES
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, prefix)| uri.starts_with(**prefix))
        .max_by_key(|(_, prefix)| prefix.len())
        .map(|(code, prefix)| (code as u8, &uri[prefix.len()..]))
        .unwrap_or((0, uri))
}

/// Encode `uri` as a single-record NDEF message.
///
/// `capacity` bounds the whole message in bytes (e.g. the user memory of
/// the target tag). `None` only enforces the record length field range.
pub fn encode_nfc(uri: &str, capacity: Option<usize>) -> Result<Vec<u8>, EncodingError> {
    let (code, rest) = abbreviate(uri);
    let payload_len = 1 + rest.len();

    if payload_len > MAX_PAYLOAD_LEN {
        return Err(EncodingError::CapacityExceeded {
            encoding: Encoding::Ndef,
            len: payload_len,
            max: MAX_PAYLOAD_LEN,
        });
    }

    let short = payload_len <= usize::from(u8::MAX);
    // header byte, type length, payload length field, type
    let header_len = if short { 4 } else { 7 };
    let message_len = header_len + payload_len;

    if let Some(max) = capacity.filter(|max| message_len > *max) {
        return Err(EncodingError::CapacityExceeded {
            encoding: Encoding::Ndef,
            len: message_len,
            max,
        });
    }

    let mut message = Vec::with_capacity(message_len);
    if short {
        message.push(FLAG_MB | FLAG_ME | FLAG_SR | TNF_WELL_KNOWN);
        message.push(1);
        message.push(payload_len as u8);
    } else {
        message.push(FLAG_MB | FLAG_ME | TNF_WELL_KNOWN);
        message.push(1);
        message.extend_from_slice(&(payload_len as u32).to_be_bytes());
    }
    message.push(URI_TYPE);
    message.push(code);
    message.extend_from_slice(rest.as_bytes());

    Ok(message)
}

/// Decode a message produced by [`encode_nfc`] back into the full URI.
pub fn decode_nfc(message: &[u8]) -> Result<String, EncodingError> {
    let malformed = |reason: &str| EncodingError::MalformedNdef(reason.to_string());

    let (&header, rest) = message.split_first().ok_or_else(|| malformed("empty message"))?;
    if header & (FLAG_MB | FLAG_ME) != (FLAG_MB | FLAG_ME) {
        return Err(malformed("expected a single-record message"));
    }
    if header & FLAG_CF != 0 {
        return Err(malformed("chunked records are not supported"));
    }
    if header & TNF_MASK != TNF_WELL_KNOWN {
        return Err(malformed("record is not a well-known type"));
    }

    let (&type_len, rest) = rest.split_first().ok_or_else(|| malformed("truncated header"))?;

    let (payload_len, rest) = if header & FLAG_SR != 0 {
        let (&len, rest) = rest.split_first().ok_or_else(|| malformed("truncated header"))?;
        (usize::from(len), rest)
    } else {
        let (len, rest) = rest
            .split_first_chunk::<4>()
            .ok_or_else(|| malformed("truncated header"))?;
        (u32::from_be_bytes(*len) as usize, rest)
    };

    let (id_len, rest) = if header & FLAG_IL != 0 {
        let (&len, rest) = rest.split_first().ok_or_else(|| malformed("truncated header"))?;
        (usize::from(len), rest)
    } else {
        (0, rest)
    };

    let record_type = rest
        .get(..usize::from(type_len))
        .ok_or_else(|| malformed("truncated record type"))?;
    if record_type != [URI_TYPE] {
        return Err(malformed("record is not a URI record"));
    }
    let rest = &rest[usize::from(type_len)..];
    let rest = rest.get(id_len..).ok_or_else(|| malformed("truncated record id"))?;

    if rest.len() != payload_len {
        return Err(malformed("payload length does not match message size"));
    }
    let (&code, remainder) = rest.split_first().ok_or_else(|| malformed("empty URI payload"))?;
    let prefix = URI_PREFIXES
        .get(usize::from(code))
        .ok_or_else(|| malformed("reserved URI identifier code"))?;
    let remainder =
        std::str::from_utf8(remainder).map_err(|_| malformed("URI is not valid UTF-8"))?;

    Ok(format!("{prefix}{remainder}"))
}
