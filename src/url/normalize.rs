use crate::UrlError;
use url::Url;

/// Schemes an anchor can carry that never lead to a crawlable page
const NON_PAGE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "sms:", "ftp:", "data:"];

/// Normalizes a URL for deduplication and scope checks
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host (the parser already lowercases it)
/// 4. Remove the query string
/// 5. Remove the fragment
///
/// Trailing slashes are kept: `/a` and `/a/` may be different resources on
/// the server, so both are rendered if both are linked.
///
/// # Examples
///
/// ```
/// use site_harvest::url::normalize_url;
///
/// let url = normalize_url("https://Example.COM/visas/work?tab=2#costs").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/visas/work");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(strip_query_and_fragment(&url))
}

/// Returns a copy of `url` without its query string and fragment
pub fn strip_query_and_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped
}

/// Resolves an anchor's `href` against the URL of the page it appears on
///
/// The fragment is preserved so callers can still tell same-page anchors
/// apart; strip it with [`strip_query_and_fragment`] before comparing URLs.
///
/// Returns `None` when the link cannot lead to a page:
/// - empty or placeholder (`#`) hrefs
/// - `javascript:`, `mailto:`, `tel:`, `sms:`, `ftp:` and `data:` targets
/// - hrefs that fail to resolve
/// - anything that is not HTTP(S) after resolution
pub fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href == "#" {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_PAGE_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = page_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
