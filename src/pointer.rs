// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! JSON Pointer (RFC6901) codec for plain pointers (`/a/b`) and URI fragment
//! identifiers (`#/a/b`, RFC6901 section 6).

use crate::error::{Error, PointerError, Result};
use jsonptr::{Pointer, Token};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

/// Characters escaped in a fragment segment. Braces are left alone so
/// template variables read as `{name}`.
const FRAGMENT_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Decodes a plain pointer or a URI fragment identifier into its unescaped
/// segments.
///
/// ```
/// use linkheader_fragment::pointer::decode;
///
/// assert_eq!(decode("#/foo/{index}/a~1b").unwrap(), vec!["foo", "{index}", "a/b"]);
/// assert_eq!(decode("/foo/0").unwrap(), vec!["foo", "0"]);
/// assert!(decode("#").unwrap().is_empty());
/// ```
pub fn decode(pointer: &str) -> Result<Vec<String>> {
    if let Some(fragment) = pointer.strip_prefix('#') {
        return parse(pointer, fragment)?
            .tokens()
            .map(|token| {
                percent_decode_str(&token.decoded())
                    .decode_utf8()
                    .map(|segment| segment.into_owned())
                    .map_err(|_| {
                        Error::from(PointerError::InvalidEncoding {
                            pointer: pointer.into(),
                        })
                    })
            })
            .collect();
    }

    Ok(parse(pointer, pointer)?
        .tokens()
        .map(|token| token.decoded().into_owned())
        .collect())
}

fn parse<'a>(input: &str, pointer: &'a str) -> Result<&'a Pointer> {
    Pointer::parse(pointer).map_err(|error| {
        Error::from(PointerError::InvalidSyntax {
            pointer: input.into(),
            reason: error.to_string(),
        })
    })
}

/// Resolves a pointer in either form against a document. Nothing at the
/// location is `None`; a malformed pointer is an error.
///
/// ```
/// use linkheader_fragment::pointer::resolve;
/// use serde_json::json;
///
/// let body = json!({ "items": [{ "title": "a/b" }] });
///
/// assert_eq!(resolve(&body, "#/items/0/title").unwrap(), Some(&json!("a/b")));
/// assert_eq!(resolve(&body, "/items/1").unwrap(), None);
/// ```
pub fn resolve<'v>(root: &'v Value, pointer: &str) -> Result<Option<&'v Value>> {
    let plain = encode(&decode(pointer)?);

    Ok(parse(pointer, &plain)?.resolve(root).ok())
}

/// Encodes segments as a plain pointer, e.g. `/foo/a~1b`.
pub fn encode<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|segment| format!("/{}", Token::new(segment.as_ref()).encoded()))
        .collect()
}

/// Encodes segments as a URI fragment identifier, e.g. `#/foo/a~1b`.
///
/// ```
/// use linkheader_fragment::pointer::encode_fragment;
///
/// assert_eq!(encode_fragment(&["foo", "a/b", "{index}"]), "#/foo/a~1b/{index}");
/// assert_eq!(encode_fragment::<&str>(&[]), "#");
/// ```
pub fn encode_fragment<S: AsRef<str>>(segments: &[S]) -> String {
    let mut fragment = String::from("#");

    for segment in segments {
        let token = Token::new(segment.as_ref());
        fragment.push('/');
        fragment.extend(utf8_percent_encode(token.encoded(), FRAGMENT_SEGMENT));
    }

    fragment
}

/// The variable name of a `{name}` template segment.
pub fn variable_name(segment: &str) -> Option<&str> {
    if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
        Some(&segment[1..segment.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_root() {
        assert!(decode("").expect("Expect a valid pointer").is_empty());
        assert!(decode("#").expect("Expect a valid pointer").is_empty());
    }

    #[test]
    fn decode_escapes() {
        assert_eq!(
            decode("#/foo~0bar/foo~1baz").expect("Expect a valid pointer"),
            vec!["foo~bar", "foo/baz"]
        );
    }

    #[test]
    fn decode_percent_encoded_fragment() {
        assert_eq!(
            decode("#/Ln%2C%3DIfe/%C3%BC").expect("Expect a valid pointer"),
            vec!["Ln,=Ife", "ü"]
        );
    }

    #[test]
    fn decode_empty_segments() {
        assert_eq!(decode("/").expect("Expect a valid pointer"), vec![""]);
        assert_eq!(decode("#/foo/").expect("Expect a valid pointer"), vec!["foo", ""]);
    }

    #[test]
    fn decode_missing_leading_slash() {
        let error = decode("#foo").unwrap_err();

        match error.downcast_ref::<PointerError>() {
            Some(PointerError::InvalidSyntax { pointer, .. }) => assert_eq!(pointer, "#foo"),
            other => panic!("unexpected error {:?}", other),
        }

        assert!(decode("foo").is_err());
    }

    #[test]
    fn decode_invalid_escape() {
        assert!(decode("/foo~2").is_err());
    }

    #[test]
    fn decode_invalid_utf8() {
        let error = decode("#/%FF").unwrap_err();

        assert_eq!(
            error.downcast_ref::<PointerError>(),
            Some(&PointerError::InvalidEncoding {
                pointer: "#/%FF".into()
            })
        );
    }

    #[test]
    fn encode_plain() {
        assert_eq!(encode(&["foo", "a/b", "m~n"]), "/foo/a~1b/m~0n");
        assert_eq!(encode::<&str>(&[]), "");
    }

    #[test]
    fn encode_fragment_percent_encodes() {
        assert_eq!(encode_fragment(&["a b", "100%", "ü"]), "#/a%20b/100%25/%C3%BC");
    }

    #[test]
    fn resolve_fragment_form() {
        let body = serde_json::json!({ "a b": { "c/d": [10, 20] } });

        assert_eq!(
            resolve(&body, "#/a%20b/c~1d/1").expect("Expect a valid pointer"),
            Some(&serde_json::json!(20))
        );
        assert_eq!(resolve(&body, "#").expect("Expect a valid pointer"), Some(&body));
    }

    #[test]
    fn resolve_missing() {
        let body = serde_json::json!({ "items": [1] });

        assert_eq!(resolve(&body, "#/items/1").expect("Expect a valid pointer"), None);
        assert_eq!(resolve(&body, "#/other").expect("Expect a valid pointer"), None);
        assert_eq!(resolve(&body, "#/items/0/deeper").expect("Expect a valid pointer"), None);
        assert!(resolve(&body, "#items").is_err());
    }

    #[test]
    fn variable_names() {
        assert_eq!(variable_name("{index}"), Some("index"));
        assert_eq!(variable_name("{}"), Some(""));
        assert_eq!(variable_name("index"), None);
        assert_eq!(variable_name("{index"), None);
        assert_eq!(variable_name("}"), None);
    }
}
