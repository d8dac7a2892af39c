//! URL handling module for Ripple-Crawl
//!
//! This module turns raw `href` values into the absolute URL strings the
//! crawler submits for admission: whitespace and fragment trimming,
//! protocol-relative and root-relative fixing, and an optional policy for
//! bare relative links.

mod normalize;

use serde::Deserialize;

// Re-export main functions
pub use normalize::{fix_link, parse_crawl_url, resolve_link, trim_link, DEFAULT_SCHEME};

/// Policy for links that are neither `//`- nor `/`-prefixed and carry no scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelativeLinks {
    /// Emit the link unchanged (`"foo.html"` stays `"foo.html"`)
    #[default]
    Passthrough,
    /// Resolve the link against the page URL
    Resolve,
}
