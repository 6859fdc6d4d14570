//! Metadata extraction from decoded HTML
//!
//! Each field is driven by an ordered probe table: CSS selectors evaluated
//! until one yields a non-empty trimmed value. Relative image and favicon
//! URLs are resolved against the final (post-redirect) document URL.

use crate::types::PageMetadata;
use chrono::Utc;
use scraper::{Html, Selector};
use url::Url;

const TITLE_PROBES: &[&str] = &[
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
];

const DESCRIPTION_PROBES: &[&str] = &[
    r#"meta[property="og:description"]"#,
    r#"meta[name="twitter:description"]"#,
    r#"meta[name="description"]"#,
];

const IMAGE_PROBES: &[&str] = &[
    r#"meta[property="og:image:secure_url"]"#,
    r#"meta[property="og:image:url"]"#,
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
];

const SITE_NAME_PROBES: &[&str] = &[r#"meta[property="og:site_name"]"#];

const TYPE_PROBES: &[&str] = &[r#"meta[property="og:type"]"#];

const LOCALE_PROBES: &[&str] = &[r#"meta[property="og:locale"]"#];

const FAVICON_PROBES: &[&str] = &[
    r#"link[rel~="icon"]"#,
    r#"link[rel="shortcut icon"]"#,
];

/// Extract link preview metadata from a decoded document
pub fn extract_metadata(html: &str, requested_url: &str, final_url: &Url) -> PageMetadata {
    let doc = Html::parse_document(html);

    let title = pick(&doc, TITLE_PROBES).or_else(|| title_text(&doc));
    let description = pick(&doc, DESCRIPTION_PROBES);
    let image = pick(&doc, IMAGE_PROBES).and_then(|v| absolutize(final_url, &v));
    let site_name = pick(&doc, SITE_NAME_PROBES);
    let kind = pick(&doc, TYPE_PROBES);
    let lang = root_lang(&doc).or_else(|| pick(&doc, LOCALE_PROBES));

    let favicon_href =
        pick_attrs(&doc, FAVICON_PROBES, &["href"]).unwrap_or_else(|| "/favicon.ico".to_string());
    let favicon = absolutize(final_url, &favicon_href);

    PageMetadata {
        url: requested_url.to_string(),
        final_url: final_url.to_string(),
        title,
        description,
        image,
        site_name,
        kind,
        lang,
        favicon,
        fetched_at: Utc::now(),
    }
}

/// First non-empty `content` or `value` attribute across the probe chain
fn pick(doc: &Html, probes: &[&str]) -> Option<String> {
    pick_attrs(doc, probes, &["content", "value"])
}

fn pick_attrs(doc: &Html, probes: &[&str], attrs: &[&str]) -> Option<String> {
    for probe in probes {
        let Ok(selector) = Selector::parse(probe) else {
            continue;
        };
        let Some(element) = doc.select(&selector).next() else {
            continue;
        };
        for attr in attrs {
            if let Some(value) = element.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Document `<title>` text, trimmed
fn title_text(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let element = doc.select(&selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// `lang` attribute on the document root
fn root_lang(doc: &Html) -> Option<String> {
    let selector = Selector::parse("html").ok()?;
    let element = doc.select(&selector).next()?;
    let lang = element.value().attr("lang")?.trim();
    if lang.is_empty() {
        None
    } else {
        Some(lang.to_string())
    }
}

/// Resolve a candidate against the base, absent on failure
fn absolutize(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    base.join(candidate).ok().map(|u| u.to_string())
}
