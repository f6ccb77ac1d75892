// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

use crate::error::{ParserError, Result};
use crate::param::{is_single_occurrence, Param, Value};
use crate::parser::Rule;
use crate::uri::UriRef;
use pest::iterators::Pair;
use std::fmt::{self, Display};

/// An RFC8288 link: a target URI, a relation type and the remaining target
/// attributes ("anchor", "hreflang", "title*", ...).
///
/// A link always has a `rel` param and it holds exactly one relation type.
/// Params keep the order they were added in, which is the order they are
/// serialised in.
///
/// ```
/// use linkheader_fragment::link::Link;
///
/// let link = Link::new("/TheBook/chapter4", "next").with("title", "next chapter");
///
/// assert_eq!(link.rel(), "next");
/// assert_eq!(link.to_string(), r#"</TheBook/chapter4>; rel=next; title="next chapter""#);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    target: UriRef,
    params: Vec<Param>,
}

impl Link {
    pub fn new(target: impl Into<UriRef>, rel: impl Into<String>) -> Link {
        Link {
            target: target.into(),
            params: vec![Param::new("rel", rel.into())],
        }
    }

    pub fn target(&self) -> &UriRef {
        &self.target
    }

    pub fn set_target(&mut self, target: impl Into<UriRef>) {
        self.target = target.into();
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The relation type.
    pub fn rel(&self) -> &str {
        self.attribute("rel").unwrap_or_default()
    }

    pub fn anchor(&self) -> Option<&str> {
        self.attribute("anchor")
    }

    /// Looks up a param by name, case-insensitively.
    pub fn param(&self, name: &str) -> Option<&Param> {
        let name = name.to_lowercase();

        self.params.iter().find(|param| param.name() == name)
    }

    /// The text of a param that appeared once with a simple value.
    ///
    /// `uri` addresses the link target.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("uri") {
            return Some(self.target.as_str());
        }

        self.param(name)
            .and_then(Param::single)
            .and_then(Value::as_simple)
    }

    /// Adds a param following the parser's occurrence policy: a repeated
    /// single-occurrence param is ignored, any other repeated param
    /// accumulates values.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Link {
        self.push(Param::new(name, value));
        self
    }

    /// Replaces every value of a param, adding it if missing.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let param = Param::new(name, value);

        match self.params.iter_mut().find(|p| p.name() == param.name()) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
    }

    /// Removes a param. The `rel` param can not be removed.
    pub fn remove(&mut self, name: &str) -> Option<Param> {
        let name = name.to_lowercase();
        if name == "rel" {
            return None;
        }

        let position = self.params.iter().position(|param| param.name() == name)?;

        Some(self.params.remove(position))
    }

    fn push(&mut self, param: Param) {
        match self.params.iter_mut().find(|p| p.name() == param.name()) {
            Some(_) if is_single_occurrence(param.name()) => (),
            Some(existing) => existing.extend(param),
            None => self.params.push(param),
        }
    }

    /// Splits a link with a multi-relation `rel` (RFC8288 section 3.3) into
    /// one link per relation type, each with the same target and params.
    pub fn expand_relations(self) -> Vec<Link> {
        let relations: Vec<String> = self.rel().split_whitespace().map(String::from).collect();

        if relations.is_empty() {
            return vec![self];
        }

        relations
            .into_iter()
            .map(|relation| {
                let mut link = self.clone();
                link.set("rel", relation);
                link
            })
            .collect()
    }

    /// Builds a link from a `link` pair. Fails when the link has no `rel`.
    ///
    /// The result may still hold several relation types; see
    /// [`Link::expand_relations`].
    pub fn from_rule(pair: Pair<Rule>) -> Result<Link> {
        ensure!(
            pair.as_rule() == Rule::link,
            ParserError::InvalidRule(Rule::link, pair.as_rule())
        );

        let mut target = String::new();
        let mut params = vec![];

        for inner_pair in pair.into_inner() {
            match inner_pair.as_rule() {
                Rule::target => {
                    target.push_str(inner_pair.as_str());
                }

                Rule::close => (),

                Rule::param => {
                    params.push(Param::from_rule(inner_pair)?);
                }

                rule => return Err(ParserError::InvalidRule(Rule::link, rule).into()),
            }
        }

        let mut link = Link {
            target: target.into(),
            params: vec![],
        };

        for param in params {
            link.push(param);
        }

        if link.param("rel").is_none() {
            return Err(ParserError::MissingRel.into());
        }

        Ok(link)
    }
}

impl Display for Link {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "<{}>", self.target)?;

        for param in &self.params {
            write!(formatter, "; {}", param)?;
        }

        Ok(())
    }
}
