// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

use crate::error::{ParserError, Result};
use crate::link::Link;
use crate::parser::{self, Rule};
use pest::iterators::Pair;
use std::fmt::{self, Display};

/// A collection of links, in the order they appear in the header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkHeader {
    pub links: Vec<Link>,
}

impl LinkHeader {
    pub fn parse(input: &str) -> Result<LinkHeader> {
        parser::parse(input)
    }

    /// Parses another header value and appends its links, e.g. to merge the
    /// `Link` and `Link-Template` fields of a response.
    pub fn parse_into(&mut self, input: &str) -> Result<&mut LinkHeader> {
        let other = parser::parse(input)?;
        self.links.extend(other.links);

        Ok(self)
    }

    pub fn from_rule(pair: Pair<Rule>) -> Result<LinkHeader> {
        ensure!(
            pair.as_rule() == Rule::header,
            ParserError::InvalidRule(Rule::header, pair.as_rule())
        );

        let mut links = vec![];

        for inner_pair in pair.into_inner() {
            match inner_pair.as_rule() {
                Rule::link => {
                    let link = Link::from_rule(inner_pair)?;
                    links.extend(link.expand_relations());
                }

                Rule::EOI => (),

                rule => return Err(ParserError::InvalidRule(Rule::header, rule).into()),
            }
        }

        Ok(LinkHeader { links })
    }

    /// Links with the given relation type. Relation types compare
    /// case-insensitively (RFC8288 section 2.1.1).
    pub fn rel(&self, value: &str) -> Vec<&Link> {
        let value = value.to_lowercase();

        self.links
            .iter()
            .filter(|link| link.rel().to_lowercase() == value)
            .collect()
    }

    /// Links where the attribute has exactly the given value.
    pub fn get(&self, attribute: &str, value: &str) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|link| link.attribute(attribute) == Some(value))
            .collect()
    }

    pub fn has(&self, attribute: &str, value: &str) -> bool {
        self.links
            .iter()
            .any(|link| link.attribute(attribute) == Some(value))
    }

    pub fn push(&mut self, link: Link) -> &mut LinkHeader {
        self.links.push(link);
        self
    }

    /// Adds the link unless an equal link is already present.
    pub fn push_unique(&mut self, link: Link) -> &mut LinkHeader {
        if !self.links.contains(&link) {
            self.links.push(link);
        }

        self
    }

    pub fn iter(&self) -> std::slice::Iter<Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl From<Vec<Link>> for LinkHeader {
    fn from(links: Vec<Link>) -> LinkHeader {
        LinkHeader { links }
    }
}

impl IntoIterator for LinkHeader {
    type Item = Link;
    type IntoIter = std::vec::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

impl<'a> IntoIterator for &'a LinkHeader {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

impl Display for LinkHeader {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{}", format(&self.links))
    }
}

/// Serialises links as a `Link` header field value.
///
/// ```
/// use linkheader_fragment::{format, link::Link};
///
/// let links = vec![
///     Link::new("https://example.org/3", "next"),
///     Link::new("https://example.org/1", "prev").with("type", "text/html"),
/// ];
///
/// assert_eq!(
///     format(&links),
///     r#"<https://example.org/3>; rel=next, <https://example.org/1>; rel=prev; type="text/html""#
/// );
/// ```
pub fn format(links: &[Link]) -> String {
    links
        .iter()
        .map(Link::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
