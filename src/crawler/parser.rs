//! HTML link extraction
//!
//! Scans a page body for anchor elements and turns each `href` into an
//! absolute URL string using the rules in [`crate::url`].

use crate::url::{resolve_link, RelativeLinks};
use scraper::{Html, Selector};

/// Extracts every anchor destination from `body`, resolved against `base_url`
///
/// Links are returned in document order. Duplicates are kept; deduplication
/// happens when candidates are submitted for admission. Destinations that are
/// empty after whitespace and fragment trimming are dropped.
///
/// # Arguments
///
/// * `base_url` - URL of the page the body was fetched from
/// * `body` - The HTML content
/// * `relative` - Policy for bare relative links
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::extract_links;
/// use ripple_crawl::url::RelativeLinks;
///
/// let html = r##"<a href="/pkg/">Packages</a><a href="#top">Top</a>"##;
/// let links = extract_links("https://golang.org/", html, RelativeLinks::Passthrough);
/// assert_eq!(links, vec!["https://golang.org/pkg".to_string()]);
/// ```
pub fn extract_links(base_url: &str, body: &str, relative: RelativeLinks) -> Vec<String> {
    let document = Html::parse_document(body);

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base_url, href, relative))
        .collect()
}
