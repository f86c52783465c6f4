//! HTML rendering of business cards.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/), which escapes every
//! interpolated value (`<`, `>`, `&`, `"`), so user text can never become
//! markup. Link targets are additionally restricted to `http`/`https`.
//!
//! Output is a pure function of the [`Profile`]: no clocks, no randomness.

pub mod components;

use maud::{DOCTYPE, Markup, PreEscaped, html};

use self::components::{
    AVATAR_FALLBACK, DEFAULT_AVATAR_PATH, ICON_EMAIL, ICON_GLOBE, ICON_LINKEDIN, ICON_PHONE,
    ICON_TWITTER, PAGE_CSS, contact_item, display_url, is_safe_image_ref, is_safe_url, mailto_href,
    tel_href, truncate,
};
use crate::profile::Profile;

/// Render a profile into a complete, self-contained HTML document.
pub fn render(profile: &Profile) -> Markup {
    let name = profile.name.as_str();
    let image_src = profile
        .profile_image
        .as_deref()
        .filter(|r| is_safe_image_ref(r))
        .unwrap_or(DEFAULT_AVATAR_PATH);
    let description = describe(profile);
    let mailto = mailto_href(&profile.email);

    let website = profile.website.as_deref().filter(|u| is_safe_url(u));
    let linkedin = profile.linkedin.as_deref().filter(|u| is_safe_url(u));
    let twitter = profile.twitter.as_deref().filter(|u| is_safe_url(u));

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (name) }
                meta name="description" content=(description);
                meta property="og:title" content=(name);
                meta property="og:description" content=(description);
                meta property="og:type" content="profile";
                style { (PreEscaped(PAGE_CSS)) }
            }
            body {
                main {
                    article class="card" {
                        header class="card-header" {
                            img class="avatar" src=(image_src) alt=(name) onerror=(AVATAR_FALLBACK);
                            h1 class="name" { (name) }
                            @if let Some(title) = profile.title.as_deref() {
                                p class="title" { (title) }
                            }
                            @if let Some(company) = profile.company.as_deref() {
                                p class="company" { (company) }
                            }
                        }

                        ul class="contacts" {
                            (contact_item(
                                "contact-email",
                                ICON_EMAIL,
                                Some(mailto.as_str()),
                                html! { span { (profile.email) } },
                            ))

                            @if let Some(phone) = profile.phone.as_deref() {
                                (contact_item(
                                    "contact-phone",
                                    ICON_PHONE,
                                    tel_href(phone).as_deref(),
                                    html! { span { (phone) } },
                                ))
                            }

                            @if let Some(url) = website {
                                (contact_item(
                                    "contact-website",
                                    ICON_GLOBE,
                                    Some(url),
                                    html! { span { (truncate(display_url(url), 48)) } },
                                ))
                            }

                            @if let Some(url) = linkedin {
                                (contact_item(
                                    "contact-linkedin",
                                    ICON_LINKEDIN,
                                    Some(url),
                                    html! { span { "LinkedIn" } },
                                ))
                            }

                            @if let Some(url) = twitter {
                                (contact_item(
                                    "contact-twitter",
                                    ICON_TWITTER,
                                    Some(url),
                                    html! {
                                        @if let Some(handle) = profile.twitter_handle() {
                                            span class="handle" { (handle) }
                                        } @else {
                                            span { "Twitter" }
                                        }
                                    },
                                ))
                            }
                        }
                    }
                }
            }
        }
    }
}

/// One-line summary used for the description meta tags.
fn describe(profile: &Profile) -> String {
    match (profile.title.as_deref(), profile.company.as_deref()) {
        (Some(title), Some(company)) => format!("{} · {title} at {company}", profile.name),
        (Some(title), None) => format!("{} · {title}", profile.name),
        (None, Some(company)) => format!("{} · {company}", profile.name),
        (None, None) => format!("{}'s business card", profile.name),
    }
}
