// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! Templated JSON fragment identifiers.
//!
//! A link target like `/books#/items/{index}` names one fragment per entry of
//! `items`. [`find_matching_fragments`] walks a JSON document and returns every
//! concrete fragment such a template addresses; [`match_to_link`] turns each
//! one into a concrete link.

use crate::error::Result;
use crate::link::Link;
use crate::pointer::{self, variable_name};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// A concrete fragment addressed by a templated pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    /// URI fragment identifier of the value, e.g. `#/foo/0/bar`.
    pub path: String,
    pub value: Value,
    /// Template variable bound to each unescaped key, e.g. `index => "0"`.
    pub variables: BTreeMap<String, String>,
}

/// A link, with the fragment it was built from when it came out of a
/// templated fragment identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentLink {
    pub link: Link,
    pub fragment: Option<Fragment>,
}

impl From<Link> for FragmentLink {
    fn from(link: Link) -> FragmentLink {
        FragmentLink {
            link,
            fragment: None,
        }
    }
}

/// Finds every value in `root` addressed by `template`, a pointer whose
/// segments may be `{name}` wildcards.
///
/// A literal segment descends into the member (or array index) of that name.
/// A wildcard descends into every member of an object, in document order, or
/// every element of an array, in index order, binding the key to the
/// variable. Scalars have no members. Matches come out depth first.
///
/// ```
/// use linkheader_fragment::fragment::find_matching_fragments;
/// use serde_json::json;
///
/// let body = json!({ "foo": [{ "bar": 1 }, { "bar": 2 }] });
/// let matches = find_matching_fragments(&body, "#/foo/{index}/bar").unwrap();
///
/// assert_eq!(matches.len(), 2);
/// assert_eq!(matches[1].path, "#/foo/1/bar");
/// assert_eq!(matches[1].value, json!(2));
/// assert_eq!(matches[1].variables["index"], "1");
/// ```
pub fn find_matching_fragments(root: &Value, template: &str) -> Result<Vec<Fragment>> {
    let segments = pointer::decode(template)?;
    let mut matches = vec![];

    walk(
        root,
        &segments,
        &mut Vec::new(),
        &BTreeMap::new(),
        &mut matches,
    );

    trace!(template, matches = matches.len(), "matched fragments");

    Ok(matches)
}

fn walk(
    value: &Value,
    segments: &[String],
    path: &mut Vec<String>,
    variables: &BTreeMap<String, String>,
    matches: &mut Vec<Fragment>,
) {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            matches.push(Fragment {
                path: pointer::encode_fragment(path),
                value: value.clone(),
                variables: variables.clone(),
            });
            return;
        }
    };

    match variable_name(segment) {
        Some(name) => {
            for (key, child) in members(value) {
                let mut bound = variables.clone();
                bound.insert(name.to_string(), key.clone());

                path.push(key);
                walk(child, rest, path, &bound, matches);
                path.pop();
            }
        }

        None => {
            if let Some(child) = member(value, segment) {
                path.push(segment.clone());
                walk(child, rest, path, variables, matches);
                path.pop();
            }
        }
    }
}

/// Own members of a value: object entries or array elements keyed by index.
fn members(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(key, child)| (key.clone(), child)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (index.to_string(), child))
            .collect(),
        _ => vec![],
    }
}

fn member<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => array_index(key).and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Canonical array index: digits without leading zeros.
fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    if key.len() > 1 && key.starts_with('0') {
        return None;
    }

    key.parse().ok()
}

/// Replaces the `{name}` segments of an anchor pointer with the values the
/// fragment bound. Unbound variables stay as they are.
///
/// ```
/// use linkheader_fragment::fragment::{interpolate_anchor, Fragment};
///
/// let fragment = Fragment {
///     path: "#/foo/0".into(),
///     value: serde_json::Value::Null,
///     variables: vec![("key".to_string(), "foo".to_string()), ("index".to_string(), "0".to_string())]
///         .into_iter()
///         .collect(),
/// };
///
/// assert_eq!(interpolate_anchor("#/{key}/{index}", &fragment).unwrap(), "#/foo/0");
/// ```
pub fn interpolate_anchor(anchor: &str, fragment: &Fragment) -> Result<String> {
    let segments: Vec<String> = pointer::decode(anchor)?
        .into_iter()
        .map(|segment| {
            let bound = variable_name(&segment).and_then(|name| fragment.variables.get(name));
            bound.cloned().unwrap_or(segment)
        })
        .collect();

    Ok(pointer::encode_fragment(&segments))
}

/// Builds the concrete link for one fragment of a templated link: the
/// templated hash in the target becomes the fragment path and the anchor,
/// if any, is interpolated.
pub fn match_to_link(link: &Link, templated_hash: &str, fragment: Fragment) -> Result<FragmentLink> {
    let mut concrete = link.clone();

    let target = link
        .target()
        .as_str()
        .replacen(templated_hash, &fragment.path, 1);
    concrete.set_target(target);

    if let Some(anchor) = link.anchor() {
        concrete.set("anchor", interpolate_anchor(anchor, &fragment)?);
    }

    Ok(FragmentLink {
        link: concrete,
        fragment: Some(fragment),
    })
}
