//! URL and path manipulation utilities shared by the storage collaborator.

use url::Url;

/// Whether a resolved, absolute URL is worth submitting to the Admission
/// Gate: skips `data:`/`javascript:`/`mailto:` and any scheme the crawler
/// does not speak. Callers must resolve a discovered `href` against its
/// page's URL first — this takes the resolved absolute form, not the raw
/// (possibly relative) attribute value.
#[must_use]
pub fn is_crawlable_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
