//! Content-type lookup for `type()` tokens.
//!
//! Tokens that already look like a MIME type (contain `/`) pass through
//! untouched; anything else is treated as a file-extension token and
//! resolved through the MIME database.

/// Resolve a content-type token (`"json"`, `"html"`, `"text/plain"`, ...).
pub fn lookup(token: &str) -> String {
    if token.contains('/') {
        return token.to_string();
    }
    mime_guess::from_ext(token)
        .first_or_octet_stream()
        .to_string()
}
