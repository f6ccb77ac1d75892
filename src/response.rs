// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! Links of an HTTP response.
//!
//! [`LinkedResponse`] collects the `Link` and `Link-Template` headers of a
//! response and, for JSON bodies, expands links whose fragment is a template
//! over the body (`</books#/items/{index}>` becomes one link per item).
//!
//! [`fragment_response`] narrows a JSON response to the fragment its URL
//! addresses.

use crate::error::{PointerError, Result};
use crate::fragment::{find_matching_fragments, match_to_link, FragmentLink};
use crate::header::{format, LinkHeader};
use crate::link::Link;
use crate::pointer;
use crate::template::{self, TemplateParams};
use crate::uri::{is_fragment_of, resolve_url, split_fragment};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LINK};
use http::response::Parts;
use http::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Header carrying links with URI template targets.
pub const LINK_TEMPLATE: &str = "link-template";

/// Whether the media type is `application/json` or a `+json` suffix type.
pub fn is_json_content(headers: &HeaderMap) -> bool {
    let content_type = match headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) {
        Some(value) => value,
        None => return false,
    };

    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    media_type == "application/json" || media_type.ends_with("+json")
}

/// Parses every `Link` header value, then every `Link-Template` value, into
/// one collection.
pub fn header_links(headers: &HeaderMap) -> Result<LinkHeader> {
    let mut header = LinkHeader::default();

    for value in headers.get_all(LINK) {
        header.parse_into(value.to_str()?)?;
    }

    for value in headers.get_all(LINK_TEMPLATE) {
        header.parse_into(value.to_str()?)?;
    }

    Ok(header)
}

/// Selects links.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Links with exactly this relation type.
    Rel(String),
    /// Links where every attribute has the given value. `uri` addresses the
    /// target.
    Attributes(Vec<(String, String)>),
}

impl Filter {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Filter::Rel(rel) => link.rel() == rel,
            Filter::Attributes(pairs) => pairs
                .iter()
                .all(|(name, value)| link.attribute(name) == Some(value.as_str())),
        }
    }
}

impl From<&str> for Filter {
    fn from(rel: &str) -> Self {
        Filter::Rel(rel.into())
    }
}

/// A response together with its links.
///
/// ```
/// use http::Response;
/// use linkheader_fragment::response::{Filter, LinkedResponse};
///
/// let response = Response::builder()
///     .header("link", r#"</books#/items/{index}>; rel="item""#)
///     .header("content-type", "application/json")
///     .body(r#"{"items": [{"title": "one"}, {"title": "two"}]}"#)
///     .unwrap();
///
/// let linked = LinkedResponse::new("https://example.com/books", response).unwrap();
/// let items = linked.links(Some(&Filter::from("item")), None).unwrap();
///
/// assert_eq!(items[1].link.target().as_str(), "https://example.com/books#/items/1");
/// ```
#[derive(Debug)]
pub struct LinkedResponse<B> {
    response: Response<B>,
    url: String,
    links: Vec<FragmentLink>,
}

impl<B: AsRef<[u8]>> LinkedResponse<B> {
    /// Collects the links of a response fetched from `url`.
    ///
    /// The body is only parsed when the response is JSON and some link has a
    /// templated fragment of `url`. A templated link that matches nothing in
    /// the body is dropped.
    pub fn new(url: impl Into<String>, response: Response<B>) -> Result<LinkedResponse<B>> {
        let url = url.into();
        let header = header_links(response.headers())?;

        if !is_json_content(response.headers()) {
            return Ok(LinkedResponse {
                links: header.into_iter().map(FragmentLink::from).collect(),
                response,
                url,
            });
        }

        let hashed: Vec<(Link, Option<String>)> = header
            .into_iter()
            .map(|link| {
                let hash = templated_hash(&link, &url);
                (link, hash)
            })
            .collect();

        let body: Value = if hashed.iter().any(|(_, hash)| hash.is_some()) {
            serde_json::from_slice(response.body().as_ref())?
        } else {
            Value::Null
        };

        let mut links = vec![];

        for (link, hash) in hashed {
            match hash {
                Some(hash) => {
                    let matches = find_matching_fragments(&body, &hash)?;
                    debug!(template = %hash, matches = matches.len(), "expanded fragment link");

                    for fragment in matches {
                        links.push(match_to_link(&link, &hash, fragment)?);
                    }
                }
                None => links.push(link.into()),
            }
        }

        Ok(LinkedResponse {
            response,
            url,
            links,
        })
    }

    /// The links that pass the filter, with their targets resolved against the
    /// response URL and, when params are given, their URI templates expanded.
    pub fn links(
        &self,
        filter: Option<&Filter>,
        params: Option<&TemplateParams>,
    ) -> Result<Vec<FragmentLink>> {
        let mut links = vec![];

        for fragment_link in &self.links {
            if let Some(filter) = filter {
                if !filter.matches(&fragment_link.link) {
                    continue;
                }
            }

            let mut target = resolve_url(fragment_link.link.target().as_str(), &self.url)?;
            if let Some(params) = params {
                target = template::expand(&target, params)?;
            }

            let mut fragment_link = fragment_link.clone();
            fragment_link.link.set_target(target);
            links.push(fragment_link);
        }

        Ok(links)
    }

    pub fn response(&self) -> &Response<B> {
        &self.response
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn into_inner(self) -> Response<B> {
        self.response
    }
}

/// The fragment of the link target when it is a template addressing the
/// resource at `url`.
fn templated_hash(link: &Link, url: &str) -> Option<String> {
    let target = link.target();
    let hash = target.hash()?;

    if is_fragment_of(target.as_str(), url) && template::is_templated(hash) {
        Some(hash.to_string())
    } else {
        None
    }
}

/// Narrows a response fetched from `url` to the JSON value its fragment
/// addresses.
///
/// A URL without a fragment leaves the response as it is. Otherwise:
///
/// * a non-JSON response becomes `415 Unsupported Media Type`;
/// * an empty body, or a pointer that addresses nothing, becomes
///   `404 Not Found`;
/// * a malformed pointer becomes `400 Bad Request` with the error message as
///   a JSON string body;
/// * a match keeps the status, serialises the value as `application/json`
///   and keeps only the `Link`/`Link-Template` links anchored inside the
///   fragment, with their anchors rebased onto it.
///
/// Invalid JSON is an error.
///
/// ```
/// use http::Response;
/// use linkheader_fragment::response::fragment_response;
///
/// let response = Response::builder()
///     .header("content-type", "application/json")
///     .header("link", r##"</authors/1>; rel="author"; anchor="#/items/1""##)
///     .body(r#"{"items": [{"title": "one"}, {"title": "two"}]}"#)
///     .unwrap();
///
/// let fragment = fragment_response("https://example.com/books#/items/1", response).unwrap();
///
/// assert_eq!(fragment.body(), br#"{"title":"two"}"#);
/// assert_eq!(fragment.headers()["link"], "</authors/1>; rel=author");
/// ```
pub fn fragment_response<B: AsRef<[u8]>>(url: &str, response: Response<B>) -> Result<Response<Vec<u8>>> {
    let (mut parts, body) = response.into_parts();
    let body = body.as_ref().to_vec();

    let hash = match split_fragment(url).1 {
        Some(fragment) if !fragment.is_empty() => format!("#{}", fragment),
        _ => return Ok(Response::from_parts(parts, body)),
    };

    if !is_json_content(&parts.headers) {
        parts.status = StatusCode::UNSUPPORTED_MEDIA_TYPE;
        return Ok(with_body(parts, vec![]));
    }

    if body.is_empty() {
        parts.status = StatusCode::NOT_FOUND;
        return Ok(with_body(parts, vec![]));
    }

    let json: Value = serde_json::from_slice(&body)?;

    let value = match pointer::resolve(&json, &hash) {
        Ok(Some(value)) => value,

        Ok(None) => {
            debug!(fragment = %hash, "fragment not found");
            parts.status = StatusCode::NOT_FOUND;
            return Ok(with_body(parts, vec![]));
        }

        Err(error) => {
            let invalid = error.downcast::<PointerError>()?;
            parts.status = StatusCode::BAD_REQUEST;
            return Ok(with_body(parts, serde_json::to_vec(&invalid.to_string())?));
        }
    };

    let fragment = serde_json::to_vec(value)?;

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    rebase_links(&mut parts.headers, LINK, &hash)?;
    rebase_links(&mut parts.headers, HeaderName::from_static(LINK_TEMPLATE), &hash)?;

    Ok(with_body(parts, fragment))
}

fn with_body(mut parts: Parts, body: Vec<u8>) -> Response<Vec<u8>> {
    parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    Response::from_parts(parts, body)
}

/// Keeps the links anchored at or below `hash`, re-anchored relative to it
/// (`#/items/1/title` under `#/items/1` becomes `#/title`; `#/items/1` itself
/// loses its anchor). The header is removed when no link is left.
fn rebase_links(headers: &mut HeaderMap, name: HeaderName, hash: &str) -> Result<()> {
    let mut header = LinkHeader::default();
    for value in headers.get_all(&name) {
        header.parse_into(value.to_str()?)?;
    }

    headers.remove(&name);

    let links: Vec<Link> = header
        .into_iter()
        .filter_map(|mut link| {
            let rest = link.anchor()?.strip_prefix(hash)?.to_string();

            if rest.is_empty() {
                link.remove("anchor");
            } else {
                link.set("anchor", format!("#{}", rest));
            }

            Some(link)
        })
        .collect();

    if !links.is_empty() {
        headers.insert(name, HeaderValue::from_bytes(format(&links).as_bytes())?);
    }

    Ok(())
}
