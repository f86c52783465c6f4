//! Shared page assets: stylesheet, icons, the default avatar, and the small
//! formatting helpers used by the card template.

use maud::{Markup, PreEscaped, html};

use crate::profile::is_web_url;

/// Site-relative path of the placeholder avatar.
pub const DEFAULT_AVATAR_PATH: &str = "/static/default-avatar.svg";

/// Client-side fallback: a broken image swaps itself for the placeholder.
pub const AVATAR_FALLBACK: &str =
    "this.onerror=null;this.src='/static/default-avatar.svg'";

/// Placeholder avatar served at [`DEFAULT_AVATAR_PATH`].
pub const DEFAULT_AVATAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 256 256" width="256" height="256"><rect width="256" height="256" fill="#e4e4ed"/><circle cx="128" cy="100" r="48" fill="#a3a3b8"/><path d="M40 232c8-52 44-84 88-84s80 32 88 84z" fill="#a3a3b8"/></svg>"##;

/// Content-Security-Policy header value for card pages.
///
/// Inline styles plus the inline `onerror` avatar fallback; images may come
/// from this origin or any http(s) host.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; script-src 'unsafe-inline'; img-src 'self' https: http: data:; form-action 'none'; frame-ancestors 'none'";

/// Inline CSS for card pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#f4f4f8;--fg:#15151f;--fg2:#55556a;--accent:#2d5be3;--surface:#fff;--border:rgba(45,91,227,.15)}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.5;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;justify-content:center;align-items:flex-start;padding:2rem 1rem}
main{max-width:420px;width:100%}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
svg.icon{width:20px;height:20px;fill:none;stroke:currentColor;stroke-width:16;stroke-linecap:round;stroke-linejoin:round;vertical-align:-4px;flex-shrink:0}
.card{background:var(--surface);border:1px solid var(--border);border-radius:16px;padding:2rem 1.5rem;text-align:center}
.avatar{width:120px;height:120px;border-radius:50%;object-fit:cover;background:#e4e4ed;margin-bottom:1rem}
.name{font-size:1.6rem;font-weight:700;letter-spacing:-.02em;word-break:break-word}
.title{color:var(--fg2);font-size:1rem}
.company{color:var(--fg2);font-size:1rem;font-weight:600}
.contacts{list-style:none;margin-top:1.5rem;display:flex;flex-direction:column;gap:.6rem;text-align:left}
.contact a,.contact span.plain{display:flex;align-items:center;gap:.75rem;padding:.65rem .9rem;border-radius:10px;background:var(--bg);word-break:break-all}
.handle::before{content:"@"}
@media(prefers-color-scheme:dark){
:root{--bg:#0f0f17;--fg:#e6e6ef;--fg2:#a0a0b8;--accent:#7c9cff;--surface:#181824;--border:rgba(124,156,255,.2)}
}
"#;

/// Inline CSS for error pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#f4f4f8;color:#15151f;padding:1rem}
.error-page{text-align:center;max-width:400px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#666;line-height:1.5}
@media(prefers-color-scheme:dark){
body{background:#0f0f17;color:#e6e6ef}
.error-page p{color:#aaa}
}
"#;

// -- Line icons (256 unit grid, stroked) --

/// Envelope icon.
pub const ICON_EMAIL: &str = r#"<svg class="icon" viewBox="0 0 256 256"><rect x="32" y="56" width="192" height="144" rx="8"/><path d="M32 64l96 80 96-80"/></svg>"#;

/// Phone handset icon.
pub const ICON_PHONE: &str = r#"<svg class="icon" viewBox="0 0 256 256"><path d="M92 40H60a20 20 0 0 0-20 22c10 84 70 144 154 154a20 20 0 0 0 22-20v-32l-44-20-24 24c-24-12-44-32-56-56l24-24z"/></svg>"#;

/// Globe icon.
pub const ICON_GLOBE: &str = r#"<svg class="icon" viewBox="0 0 256 256"><circle cx="128" cy="128" r="96"/><path d="M32 128h192M128 32c-32 32-32 160 0 192M128 32c32 32 32 160 0 192"/></svg>"#;

/// LinkedIn mark icon.
pub const ICON_LINKEDIN: &str = r#"<svg class="icon" viewBox="0 0 256 256"><rect x="32" y="32" width="192" height="192" rx="16"/><path d="M88 112v64M88 80v1M124 176v-64M124 140c0-16 12-28 28-28s28 12 28 28v36"/></svg>"#;

/// Bird / X mark icon.
pub const ICON_TWITTER: &str = r#"<svg class="icon" viewBox="0 0 256 256"><path d="M48 48l160 160M208 48L48 208"/></svg>"#;

/// Check whether a URL may go into an `href`: absolute `http`/`https` only.
///
/// Stored profiles are validated on write, but rows may predate stricter
/// rules, so the template checks again.
pub fn is_safe_url(url: &str) -> bool {
    is_web_url(url)
}

/// Check whether an image reference may go into an `img src`.
///
/// Accepts site-relative paths (uploads) and absolute `http`/`https` URLs.
/// Browsers read `\` as `/`, so references containing it are refused.
pub fn is_safe_image_ref(reference: &str) -> bool {
    if reference.contains('\\') {
        return false;
    }
    (reference.starts_with('/') && !reference.starts_with("//")) || is_web_url(reference)
}

/// `mailto:` href for an address, with URI delimiters percent-encoded.
///
/// Characters such as `?`, `&` and `=` are legal in an address but would
/// otherwise start header fields in the mail client.
pub fn mailto_href(email: &str) -> String {
    let mut href = String::with_capacity("mailto:".len() + email.len());
    href.push_str("mailto:");
    for byte in email.bytes() {
        if byte.is_ascii_alphanumeric() || b"@.-_~!$'*+".contains(&byte) {
            href.push(byte as char);
        } else {
            href.push_str(&format!("%{byte:02X}"));
        }
    }
    href
}

/// Digits and a leading `+` from a phone number, for a `tel:` href.
///
/// Returns `None` when nothing dialable remains.
pub fn tel_href(phone: &str) -> Option<String> {
    let dialable: String = phone
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect();
    dialable
        .chars()
        .any(|c| c.is_ascii_digit())
        .then(|| format!("tel:{dialable}"))
}

/// URL text without its scheme, for display.
pub fn display_url(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
        .trim_end_matches('/')
}

/// Truncate a string to a maximum length, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// One contact row: icon plus text, linked when `href` is given.
pub fn contact_item(class: &str, icon: &str, href: Option<&str>, text: Markup) -> Markup {
    html! {
        li class={"contact " (class)} {
            @if let Some(href) = href {
                a href=(href) rel="me nofollow noopener" target="_blank" {
                    (PreEscaped(icon)) (text)
                }
            } @else {
                span class="plain" { (PreEscaped(icon)) (text) }
            }
        }
    }
}
