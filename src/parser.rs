// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

use crate::error::{ParserError, Result};
use crate::header::LinkHeader;
pub use pest::Parser;
use pest::error::InputLocation;
use std::fmt::{self, Display};
use tracing::debug;

#[derive(Parser)]
#[grammar = "rfc8288.pest"]
pub struct Rfc8288Parser;

impl Display for Rule {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{:?}", self)
    }
}

/// Parses a `Link` (or `Link-Template`) header field value.
///
/// Surrounding whitespace is trimmed and folded lines are unfolded first, so
/// error offsets refer to the unfolded text. Links with several relation
/// types are expanded into one link per relation type.
///
/// ```
/// use linkheader_fragment::parse;
///
/// let header = parse(r#"<https://example.org/3>; rel="next", <https://example.org/1>; rel="prev""#).unwrap();
///
/// assert_eq!(header.links.len(), 2);
/// assert_eq!(header.links[0].rel(), "next");
/// ```
pub fn parse(input: &str) -> Result<LinkHeader> {
    let text = unfold(trim(input));

    let rule = Rfc8288Parser::parse(Rule::header, &text)
        .map_err(|error| syntax_error(&text, &error.location))?
        .next()
        .ok_or_else(|| ParserError::UnexpectedEnd { offset: 0 })?;

    let header = LinkHeader::from_rule(rule)?;

    debug!(links = header.links.len(), "parsed link header");

    Ok(header)
}

fn trim(input: &str) -> &str {
    input.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Removes RFC822 folds: a line break followed by spaces or tabs.
fn unfold(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut start = 0;
    let mut offset = 0;

    while offset < bytes.len() {
        let newline = match bytes[offset] {
            b'\r' if bytes.get(offset + 1) == Some(&b'\n') => 2,
            b'\n' => 1,
            _ => 0,
        };

        if newline > 0 {
            let mut end = offset + newline;
            while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
                end += 1;
            }

            if end > offset + newline {
                result.push_str(&input[start..offset]);
                start = end;
                offset = end;
                continue;
            }
        }

        offset += 1;
    }

    result.push_str(&input[start..]);
    result
}

fn syntax_error(text: &str, location: &InputLocation) -> ParserError {
    let position = match location {
        InputLocation::Pos(position) => *position,
        InputLocation::Span((start, _)) => *start,
    };

    let offset = text[..position].chars().count();

    match text[position..].chars().next() {
        Some(character) => ParserError::UnexpectedCharacter { character, offset },
        None => ParserError::UnexpectedEnd { offset },
    }
}
