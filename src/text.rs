//! Character encoding handling.
//!
//! Catalog texts are distributed in Shift_JIS; everything inside the crate is
//! UTF-8. Decoding is strict in both directions of use: archive members and
//! fetched pages either decode cleanly or are rejected.

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use regex::bytes::Regex;
use std::sync::LazyLock;

/// How far into a document to look for a `<meta>` charset declaration
const META_SNIFF_LEN: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*charset\s*=\s*["']?([A-Za-z0-9_.:\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Decode Shift_JIS bytes to UTF-8.
///
/// Returns `None` if any byte sequence is invalid for the encoding.
pub fn decode_shift_jis(bytes: &[u8]) -> Option<String> {
    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Decode a fetched markup document.
///
/// `content_type` is the raw `Content-Type` header, if the server sent one.
/// The error is a human-readable reason.
pub fn decode_document(body: &[u8], content_type: Option<&str>) -> Result<String, String> {
    let mut declared = None;
    if let Some(content_type) = content_type {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if !mime.is_empty() && !mime.contains("html") && !mime.contains("xml") {
            return Err(format!("unexpected content type {mime}"));
        }
        declared = charset_param(content_type);
    }

    let (encoding, body) = match Encoding::for_bom(body) {
        Some((encoding, bom_len)) => (encoding, &body[bom_len..]),
        None => {
            let label = declared.or_else(|| sniff_meta_charset(body));
            let encoding = match label {
                Some(label) => Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| format!("unknown charset {label}"))?,
                None => UTF_8,
            };
            (encoding, body)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("malformed {} byte sequence", encoding.name()))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn sniff_meta_charset(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(META_SNIFF_LEN)];
    let caps = META_CHARSET.captures(head)?;
    let label = caps.get(1)?;
    Some(String::from_utf8_lossy(label.as_bytes()).into_owned())
}
