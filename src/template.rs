// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! URI templates (RFC6570) in link targets.

use crate::error::{Error, Result, TemplateError};
use iri_string::spec::UriSpec;
use iri_string::template::simple_context::{SimpleContext, Value as ContextValue};
use iri_string::template::UriTemplateStr;
use std::collections::BTreeMap;

/// A value for a template variable.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    String(String),
    List(Vec<String>),
    Assoc(Vec<(String, String)>),
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.into())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<Vec<String>> for TemplateValue {
    fn from(list: Vec<String>) -> Self {
        TemplateValue::List(list)
    }
}

impl From<Vec<(String, String)>> for TemplateValue {
    fn from(pairs: Vec<(String, String)>) -> Self {
        TemplateValue::Assoc(pairs)
    }
}

pub type TemplateParams = BTreeMap<String, TemplateValue>;

/// Names of the variables in a template, in order of first appearance.
///
/// ```
/// use linkheader_fragment::template::variables;
///
/// assert_eq!(variables("/search{?q,page}{&lang:2}"), vec!["q", "page", "lang"]);
/// assert_eq!(variables("#/items/{index}/{index}"), vec!["index"]);
/// ```
pub fn variables(template: &str) -> Vec<String> {
    let mut names: Vec<String> = vec![];
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = match after.find('}') {
            Some(close) => close,
            None => break,
        };

        let expression = after[..close].trim_start_matches(is_operator);

        for varspec in expression.split(',') {
            let name = varspec_name(varspec);
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }

        rest = &after[close + 1..];
    }

    names
}

/// Operators, including those reserved for future extension.
fn is_operator(c: char) -> bool {
    matches!(
        c,
        '+' | '#' | '.' | '/' | ';' | '?' | '&' | '=' | ',' | '!' | '@' | '|'
    )
}

/// Strips the explode (`*`) or prefix (`:n`) modifier.
fn varspec_name(varspec: &str) -> &str {
    let varspec = varspec.trim();

    if let Some(name) = varspec.strip_suffix('*') {
        return name;
    }

    match varspec.find(':') {
        Some(position) => &varspec[..position],
        None => varspec,
    }
}

pub fn is_templated(text: &str) -> bool {
    !variables(text).is_empty()
}

/// Expands a template. Variables without a value expand to nothing.
///
/// ```
/// use linkheader_fragment::template::{expand, TemplateParams};
///
/// let mut params = TemplateParams::new();
/// params.insert("id".into(), "42".into());
///
/// assert_eq!(expand("https://example.com/items/{id}{?q}", &params).unwrap(), "https://example.com/items/42");
/// ```
pub fn expand(template: &str, params: &TemplateParams) -> Result<String> {
    let invalid = |reason: String| {
        Error::from(TemplateError::Invalid {
            template: template.into(),
            reason,
        })
    };

    let parsed = UriTemplateStr::new(template).map_err(|error| invalid(error.to_string()))?;

    let mut context = SimpleContext::new();
    for (name, value) in params {
        let value = match value {
            TemplateValue::String(s) => ContextValue::String(s.clone()),
            TemplateValue::List(list) => ContextValue::List(list.clone()),
            TemplateValue::Assoc(pairs) => ContextValue::Assoc(pairs.clone()),
        };
        context.insert(name.as_str(), value);
    }

    let expanded = parsed
        .expand::<UriSpec, _>(&context)
        .map_err(|error| invalid(error.to_string()))?;

    Ok(expanded.to_string())
}
