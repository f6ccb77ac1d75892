// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

use crate::error::Result;
use std::fmt::{self, Display};
use url::Url;

/// The target of a link, as written between `<` and `>`.
///
/// It is kept verbatim: it may be relative and it may contain URI template
/// expressions (`{var}`).
#[derive(Clone, Debug, PartialEq)]
pub struct UriRef(String);

impl From<String> for UriRef {
    fn from(s: String) -> Self {
        UriRef(s)
    }
}

impl From<&str> for UriRef {
    fn from(s: &str) -> Self {
        UriRef(s.to_string())
    }
}

impl Display for UriRef {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl AsRef<str> for UriRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl UriRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The fragment without the leading `#`, if any.
    pub fn fragment(&self) -> Option<&str> {
        split_fragment(&self.0).1
    }

    /// The fragment with its leading `#`, if any.
    pub fn hash(&self) -> Option<&str> {
        self.0.find('#').map(|position| &self.0[position..])
    }

    pub fn without_fragment(&self) -> &str {
        split_fragment(&self.0).0
    }
}

/// Splits a URI reference into the part before `#` and the fragment.
///
/// No `#` may appear before the fragment in a URI reference, so the first one
/// starts it.
pub fn split_fragment(uri: &str) -> (&str, Option<&str>) {
    match uri.find('#') {
        Some(position) => (&uri[..position], Some(&uri[position + 1..])),
        None => (uri, None),
    }
}

/// Checks whether `check` addresses a fragment inside `compare`.
///
/// `check` must have a non-empty fragment and point at the same resource as
/// `compare` (a fragment-only reference always does). When `compare` has a
/// fragment, the fragment of `check` must start with it.
///
/// The fragment test is a plain string prefix: `#/foo1` counts as a fragment
/// of `#/foo`.
///
/// ```
/// use linkheader_fragment::uri::is_fragment_of;
///
/// assert!(is_fragment_of("http://x/#/foo/1", "http://x/#/foo/"));
/// assert!(is_fragment_of("http://x/#/foo", "http://x/"));
/// assert!(!is_fragment_of("http://x/#/foo/1", "http://x/#/bar/1"));
/// ```
pub fn is_fragment_of(check: &str, compare: &str) -> bool {
    let (check_base, check_fragment) = split_fragment(check);
    let check_fragment = match check_fragment {
        Some(fragment) if !fragment.is_empty() => fragment,
        _ => return false,
    };

    let (compare_base, compare_fragment) = split_fragment(compare);

    if !check_base.is_empty() && !same_resource(check_base, compare_base) {
        return false;
    }

    match compare_fragment {
        None | Some("") => true,
        Some(compare_fragment) => check_fragment.starts_with(compare_fragment),
    }
}

fn same_resource(check: &str, compare: &str) -> bool {
    if check == compare {
        return true;
    }

    match Url::parse(compare) {
        Ok(compare_url) => match compare_url.join(check) {
            Ok(check_url) => check_url == compare_url,
            Err(_) => false,
        },
        Err(_) => false,
    }
}

/// Resolves `url` against `base` (RFC3986 section 5).
///
/// An empty base leaves `url` untouched. URI template braces, which the URL
/// serialiser percent-encodes, are restored.
///
/// ```
/// use linkheader_fragment::uri::resolve_url;
///
/// let resolved = resolve_url("/items/{id}", "https://example.com/api/").unwrap();
///
/// assert_eq!(resolved, "https://example.com/items/{id}");
/// ```
pub fn resolve_url(url: &str, base: &str) -> Result<String> {
    if base.is_empty() {
        return Ok(url.to_string());
    }

    let resolved = Url::parse(base)?.join(url)?;

    Ok(resolved
        .as_str()
        .replace("%7B", "{")
        .replace("%7D", "}"))
}
