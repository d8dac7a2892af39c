use crate::url::RelativeLinks;
use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Scheme given to protocol-relative (`//host/...`) links
pub const DEFAULT_SCHEME: &str = "http";

/// Parses a URL the crawler is willing to fetch
///
/// The URL must parse, use the `http` or `https` scheme and name a host.
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::parse_crawl_url;
///
/// assert!(parse_crawl_url("https://example.com/").is_ok());
/// assert!(parse_crawl_url("mailto:someone@example.com").is_err());
/// ```
pub fn parse_crawl_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Trims whitespace and the fragment suffix from a raw link
///
/// An empty return value means the link carries no destination of its own
/// (for example `"#top"`) and should be discarded.
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::trim_link;
///
/// assert_eq!(trim_link("  /pkg/ "), "/pkg/");
/// assert_eq!(trim_link("page.html#section"), "page.html");
/// assert_eq!(trim_link("#top"), "");
/// ```
pub fn trim_link(link: &str) -> String {
    let link = link.trim();
    let link = link.split('#').next().unwrap_or_default();
    link.trim().to_string()
}

/// Rewrites an already-trimmed, non-empty link into an absolute URL string
///
/// # Rules
///
/// 1. `//host/path` becomes `http://host/path`
/// 2. `/path` is joined to the origin of `base_url` with any trailing slash
///    removed from the path (the bare root `/` stays `/`); the rest of the
///    path and the query are kept as written
/// 3. Anything else is returned unchanged
///
/// # Examples
///
/// ```
/// use ripple_crawl::url::fix_link;
///
/// assert_eq!(fix_link("https://golang.org/", "/pkg/"), "https://golang.org/pkg");
/// assert_eq!(fix_link("https://golang.org/", "//example.com/x"), "http://example.com/x");
/// assert_eq!(fix_link("https://golang.org/", "https://other.org/y"), "https://other.org/y");
/// ```
pub fn fix_link(base_url: &str, link: &str) -> String {
    if let Some(rest) = link.strip_prefix("//") {
        return format!("{}://{}", DEFAULT_SCHEME, rest.trim_start_matches('/'));
    }

    if link.starts_with('/') {
        let (path, query) = match link.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (link, None),
        };

        let mut fixed = format!("{}{}", origin_of(base_url), trim_trailing_slash(path));
        if let Some(query) = query {
            fixed.push('?');
            fixed.push_str(query);
        }
        return fixed;
    }

    link.to_string()
}

/// Trims and fixes a raw `href` value found on the page at `base_url`
///
/// Returns `None` when nothing is left after trimming.
///
/// With [`RelativeLinks::Resolve`], links without a scheme that are not
/// `/`-prefixed (such as `"foo.html"` or `"../up"`) are resolved against
/// `base_url`. With [`RelativeLinks::Passthrough`] they are returned as-is.
pub fn resolve_link(base_url: &str, href: &str, relative: RelativeLinks) -> Option<String> {
    let link = trim_link(href);
    if link.is_empty() {
        return None;
    }

    if relative == RelativeLinks::Resolve && !link.starts_with('/') {
        if let Some(resolved) = resolve_relative(base_url, &link) {
            return Some(resolved);
        }
    }

    Some(fix_link(base_url, &link))
}

/// Resolves a scheme-less relative reference with RFC 3986 rules
fn resolve_relative(base_url: &str, link: &str) -> Option<String> {
    match Url::parse(link) {
        // Already absolute
        Ok(_) => None,
        Err(ParseError::RelativeUrlWithoutBase) => {
            let mut joined = Url::parse(base_url).ok()?.join(link).ok()?;
            joined.set_fragment(None);
            Some(joined.to_string())
        }
        Err(_) => None,
    }
}

/// Returns `scheme://host[:port]` for `base_url`
///
/// Falls back to the base string without trailing slashes when it does not
/// parse as an absolute URL with a host.
fn origin_of(base_url: &str) -> String {
    match Url::parse(base_url) {
        Ok(url) if url.host_str().is_some() => url.origin().ascii_serialization(),
        _ => base_url.trim_end_matches('/').to_string(),
    }
}

/// Drops trailing slashes from a `/`-prefixed path, keeping the bare root
fn trim_trailing_slash(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
