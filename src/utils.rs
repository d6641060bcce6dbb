//! Utility functions for uploads and downloads

use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use std::path::Path;

/// Extract the suggested filename from a `Content-Disposition` header
///
/// Handles both `filename="report.pdf"` and the RFC 5987 form
/// `filename*=UTF-8''report%20final.pdf`. The encoded form wins when both are
/// present. Any directory components are stripped.
///
/// # Examples
///
/// ```
/// use batscope::utils::filename_from_headers;
/// use reqwest::header::{CONTENT_DISPOSITION, HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(
///     CONTENT_DISPOSITION,
///     HeaderValue::from_static(r#"attachment; filename="bat_report_f1.pdf""#),
/// );
/// assert_eq!(filename_from_headers(&headers).as_deref(), Some("bat_report_f1.pdf"));
/// ```
pub fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    let mut encoded = None;

    for part in value.split(';') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("filename*=") {
            // charset'lang'percent-encoded
            if let Some(idx) = rest.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&rest[idx + 1..])
            {
                encoded = Some(decoded.into_owned());
            }
        } else if let Some(rest) = part.strip_prefix("filename=") {
            plain = Some(rest.trim_matches('"').to_string());
        }
    }

    let name = encoded.or(plain)?;
    let name = Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)?;

    (!name.is_empty()).then_some(name)
}

/// Guess a MIME type for an upload from its file extension
///
/// Covers the formats the backend accepts; anything else is sent as
/// `application/octet-stream`.
pub fn guess_content_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Truncate `text` to at most `max_chars` characters
///
/// Works on characters, not bytes, so multi-byte species names are never cut
/// mid-character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
