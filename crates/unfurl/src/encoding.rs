//! Character encoding resolution for fetched HTML
//!
//! Resolution order, first match wins: `charset=` in the Content-Type
//! header, a `<meta charset=...>` declaration in the document prefix,
//! statistical detection, then a UTF-8 default. Decoding never fails;
//! unknown labels and malformed bytes fall back to lossy UTF-8.

use encoding_rs::{Encoding, UTF_8};

/// Bytes of the document prefix scanned for a meta charset declaration
const META_SCAN_BYTES: usize = 2048;

/// Minimum detector confidence required to trust a statistical guess
const DETECT_CONFIDENCE: f32 = 0.8;

/// Where the resolved encoding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    /// `charset=` parameter of the Content-Type header
    Header,
    /// `<meta charset=...>` declaration in the document prefix
    MetaTag,
    /// Statistical detection over the full buffer
    Detected,
    /// No signal; UTF-8 assumed
    Default,
}

/// Resolved encoding and the signal that chose it
#[derive(Debug, Clone, Copy)]
pub struct EncodingDecision {
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
}

/// Resolve the best-guess encoding for a response body
pub fn resolve_encoding(buffer: &[u8], content_type: Option<&str>) -> EncodingDecision {
    if let Some(label) = content_type.and_then(charset_from_content_type) {
        // An unrecognized header label still wins the resolution; the
        // decode simply falls back to UTF-8.
        return EncodingDecision {
            encoding: encoding_for_label(&label),
            source: EncodingSource::Header,
        };
    }

    if let Some(label) = charset_from_meta_prefix(buffer) {
        return EncodingDecision {
            encoding: encoding_for_label(&label),
            source: EncodingSource::MetaTag,
        };
    }

    let (charset, confidence, _language) = chardet::detect(buffer);
    if confidence > DETECT_CONFIDENCE {
        let label = chardet::charset2encoding(&charset);
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return EncodingDecision {
                encoding,
                source: EncodingSource::Detected,
            };
        }
    }

    EncodingDecision {
        encoding: UTF_8,
        source: EncodingSource::Default,
    }
}

/// Decode a response body to text, never failing
pub fn decode_html(buffer: &[u8], content_type: Option<&str>) -> (String, EncodingDecision) {
    let decision = resolve_encoding(buffer, content_type);
    let (text, _, _) = decision.encoding.decode(buffer);
    (text.into_owned(), decision)
}

fn encoding_for_label(label: &str) -> &'static Encoding {
    Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8)
}

/// Extract the charset parameter from a Content-Type header value
fn charset_from_content_type(content_type: &str) -> Option<String> {
    for part in content_type.split(';').skip(1) {
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("charset") {
            continue;
        }

        let label = value.trim().trim_matches('"').trim_matches('\'');
        if !label.is_empty() {
            return Some(label.to_owned());
        }
    }

    None
}

/// Scan the document prefix for a `<meta ... charset=...>` declaration
///
/// The prefix is interpreted as ASCII for this scan only; real pages
/// declare their charset in plain ASCII markup.
fn charset_from_meta_prefix(buffer: &[u8]) -> Option<String> {
    let prefix_len = buffer.len().min(META_SCAN_BYTES);
    let prefix = String::from_utf8_lossy(&buffer[..prefix_len]);
    let lower = prefix.to_ascii_lowercase();

    let mut search = 0_usize;
    while let Some(relative) = lower[search..].find("<meta") {
        let tag_start = search + relative;
        let tag_end = lower[tag_start..]
            .find('>')
            .map(|i| tag_start + i)
            .unwrap_or(lower.len());

        let tag = &lower[tag_start..tag_end];
        if let Some(pos) = tag.find("charset") {
            if let Some(label) = parse_charset_label(&tag[pos + "charset".len()..]) {
                return Some(label);
            }
        }

        if tag_end >= lower.len() {
            break;
        }
        search = tag_end;
    }

    None
}

/// Parse `= label`, `="label"` or `='label'` after a `charset` token
fn parse_charset_label(input: &str) -> Option<String> {
    let rest = input.trim_start().strip_prefix('=')?;
    let rest = rest.trim_start();
    let rest = rest.trim_start_matches(['"', '\'']);

    let end = rest
        .find(|ch: char| ch.is_whitespace() || matches!(ch, '"' | '\'' | ';' | '>' | '/'))
        .unwrap_or(rest.len());
    let label = rest[..end].trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_owned())
    }
}
