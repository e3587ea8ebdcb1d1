//! Header helpers: download annotations, content-type guessing and the
//! externally visible base URL.

use axum::http::{header, HeaderMap, HeaderName};

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// `Content-Disposition` value for a download named `filename`.
///
/// Names made only of printable ASCII (minus `\` and `"`) use the quoted
/// `filename=` form that every client understands; anything else falls back
/// to the RFC 8187 `filename*=UTF-8''...` form.
pub fn content_disposition(filename: &str) -> String {
    let legacy_safe = filename
        .chars()
        .all(|c| (' '..='~').contains(&c) && c != '\\' && c != '"');
    if legacy_safe {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}

/// Guess a media type from a filename's extension.
pub fn guess_content_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// The media type of a `Content-Type` value without parameters, lowercased.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Scheme and authority clients used to reach us, e.g. `https://files.example`.
///
/// Honours `X-Forwarded-Proto` and `X-Forwarded-Host` from a reverse proxy,
/// then `Host`, then `fallback_host`.
pub fn external_base_url(headers: &HeaderMap, fallback_host: &str) -> String {
    let proto = first_value(headers, &X_FORWARDED_PROTO).unwrap_or_else(|| "http".to_string());
    let host = first_value(headers, &X_FORWARDED_HOST)
        .or_else(|| first_value(headers, &header::HOST))
        .unwrap_or_else(|| fallback_host.to_string());
    format!("{proto}://{host}")
}

/// First comma-separated element of a header, trimmed.
fn first_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
