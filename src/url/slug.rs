use sha2::{Digest, Sha256};
use url::Url;

/// Longest readable prefix kept in a slug, before the hash suffix
const MAX_READABLE_LEN: usize = 60;

/// Hex characters of the path digest appended to every slug
const HASH_LEN: usize = 12;

/// Derives a filesystem-safe identifier from a URL
///
/// The slug has a readable part built from the URL path and a short SHA-256
/// suffix over host and path. Query string, fragment and a trailing slash do
/// not change the slug; any other difference in host or path does.
///
/// Strings that do not parse as URLs are hashed as-is, so the function never
/// fails.
///
/// # Examples
///
/// ```
/// use site_harvest::url::url_to_slug;
///
/// let a = url_to_slug("https://example.com/visas/work/");
/// let b = url_to_slug("https://example.com/visas/work?tab=1#fees");
/// assert_eq!(a, b);
/// assert!(a.starts_with("visas-work-"));
/// ```
pub fn url_to_slug(url_str: &str) -> String {
    let (readable_source, hash_source) = match Url::parse(url_str.trim()) {
        Ok(url) => {
            let path = url.path().trim_end_matches('/').to_string();
            let host = url.host_str().unwrap_or_default().to_lowercase();
            let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
            (path.clone(), format!("{}{}{}", host, port, path))
        }
        Err(_) => (url_str.to_string(), url_str.to_string()),
    };

    let mut readable = sanitize_component(&readable_source);
    if readable.is_empty() {
        readable = "index".to_string();
    }
    if readable.len() > MAX_READABLE_LEN {
        readable.truncate(MAX_READABLE_LEN);
        while readable.ends_with('-') {
            readable.pop();
        }
    }

    let digest = hex::encode(Sha256::digest(hash_source.as_bytes()));
    format!("{}-{}", readable, &digest[..HASH_LEN])
}

/// Reduces arbitrary text to lowercase ASCII alphanumerics joined by `-`
///
/// Runs of any other character collapse into one separator; leading and
/// trailing separators are dropped.
pub fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}
