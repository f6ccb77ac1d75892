// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

use crate::error::{ParserError, Result};
use crate::parser::Rule;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pest::iterators::Pair;
use std::fmt::{self, Display};

/// Characters RFC8187 allows unencoded in an extended value (`attr-char`).
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// URI component encoding, except for space, comma and semicolon which are
/// safe inside a quoted string.
const QUOTED_TEXT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b' ')
    .remove(b',')
    .remove(b';');

/// A link param.
///
/// A param has a name and one or more values. The parser only keeps more
/// than one value when the param is repeated in the same link-value and is
/// not a single-occurrence param (see [`is_single_occurrence`]).
///
/// A value is either a token, quoted text or compound (RFC8187). The first
/// two are represented by `Value::Simple` and the latter by
/// `Value::Compound`.
///
/// A "token param", for example, `rel=next` is represented as:
///
/// ```norun
/// Param {
///     name: "rel".into(),
///     values: vec![Value::Simple("next".into())],
/// };
/// ```
///
/// A "star param", for example, `title*=utf-8'ca'%C3%A0bac` is represented as:
///
/// ```norun
/// Param {
///     name: "title*".into(),
///     values: vec![Value::Compound {
///         encoding: Encoding::Utf8,
///         language: "ca".into(),
///         value: "àbac".into(),
///     }],
/// };
/// ```
///
/// ## Examples
///
/// ```
/// use linkheader_fragment::param::{Param, Value};
///
/// let param = Param::new("rel", "next");
///
/// assert_eq!(param.name(), "rel");
/// assert_eq!(param.value(), &Value::Simple("next".into()));
/// assert_eq!(param.to_string(), "rel=next");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    values: Vec<Value>,
}

impl Param {
    /// Creates a param, lowercasing its name.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Param {
        Param {
            name: name.into().to_lowercase(),
            values: vec![value.into()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first value of the param.
    pub fn value(&self) -> &Value {
        &self.values[0]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the param and returns its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// The value of a param that appeared once.
    pub fn single(&self) -> Option<&Value> {
        match self.values.as_slice() {
            [value] => Some(value),
            _ => None,
        }
    }

    /// True when the param was repeated in its link-value.
    pub fn is_repeated(&self) -> bool {
        self.values.len() > 1
    }

    /// A star param e.g. "title*" is a param marked to identify that its value
    /// is a compound value.
    pub fn is_star(&self) -> bool {
        self.name.ends_with('*')
    }

    pub(crate) fn extend(&mut self, other: Param) {
        self.values.extend(other.values);
    }

    pub fn from_rule(pair: Pair<Rule>) -> Result<Param> {
        ensure!(
            pair.as_rule() == Rule::param,
            ParserError::InvalidRule(Rule::param, pair.as_rule())
        );

        let mut name = String::new();
        let mut raw = String::new();

        for inner_pair in pair.into_inner() {
            match inner_pair.as_rule() {
                Rule::name => name.push_str(&inner_pair.as_str().to_lowercase()),

                Rule::quoted => {
                    for text in inner_pair.into_inner() {
                        raw.push_str(&unescape(text.as_str()));
                    }
                }

                Rule::token => raw.push_str(inner_pair.as_str().trim()),

                rule => return Err(ParserError::InvalidRule(Rule::param, rule).into()),
            }
        }

        let value = if name.ends_with('*') {
            Value::parse_extended(&raw)?
        } else if name == "type" {
            Value::Simple(raw.to_lowercase())
        } else {
            Value::Simple(raw)
        };

        Ok(Param {
            name,
            values: vec![value],
        })
    }
}

impl Display for Param {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                write!(formatter, "; ")?;
            }

            write!(formatter, "{}={}", self.name, value.format_for(&self.name))?;
        }

        Ok(())
    }
}

/// Params that may only occur once per link-value. Later occurrences are
/// ignored.
pub fn is_single_occurrence(name: &str) -> bool {
    match name {
        "rel" | "type" | "media" | "title" | "title*" => true,
        _ => false,
    }
}

/// Params whose values are tokens and must never be percent-encoded.
pub fn is_token_attribute(name: &str) -> bool {
    match name {
        "rel" | "type" | "anchor" => true,
        _ => false,
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// True when the value is not a plain RFC7230 token.
pub fn needs_quotes(value: &str) -> bool {
    value.is_empty() || !value.chars().all(is_token_char)
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => result.extend(chars.next()),
            _ => result.push(c),
        }
    }

    result
}

/// The character encoding of a compound value.
///
/// RFC8187 Section 3.2.1 names it as "charset" and defines it as:
///
/// ```abnf
/// charset = "UTF-8" / mime-charset
/// ```
///
/// It also says:
///
/// > Producers MUST use the "UTF-8" ([RFC3629]) character encoding.
/// > Extension character encodings (mime-charset) are reserved for future
/// > use.
#[derive(Clone, Debug, PartialEq)]
pub enum Encoding {
    Utf8,
    Extension(String),
}

impl Default for Encoding {
    fn default() -> Encoding {
        Encoding::Utf8
    }
}

impl From<&str> for Encoding {
    fn from(s: &str) -> Encoding {
        let sl = s.to_lowercase();

        match &sl[..] {
            "" | "utf-8" | "utf8" => Encoding::Utf8,
            _ => Encoding::Extension(sl),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(formatter, "UTF-8"),
            Encoding::Extension(ext) => write!(formatter, "{}", ext.to_uppercase()),
        }
    }
}

/// A value, either a simple text or a compound of text, character encoding and
/// a language tag.
///
/// Note that RFC8187 names a compound value as "extended value".
///
/// When the encoding of a compound value is not UTF-8, the value will be kept
/// untouched, that is percent-encoded.
///
/// ```
/// use linkheader_fragment::param::Value;
///
/// let value = Value::Simple("next".into());
///
/// assert_eq!(value.to_string(), "next".to_string());
/// ```
///
/// ```
/// use linkheader_fragment::param::{Value, Encoding};
///
/// let value = Value::Compound {
///     encoding: Encoding::Utf8,
///     language: "en".into(),
///     value: "GBP (£)".into(),
/// };
///
/// assert_eq!(value.to_string(), "UTF-8'en'GBP%20%28%C2%A3%29".to_string());
/// ```
///
/// ```
/// use linkheader_fragment::param::{Value, Encoding};
///
/// let value = Value::Compound {
///     encoding: Encoding::Extension("gib".into()),
///     language: "".into(),
///     value: "%C0%FF%EE".into(),
/// };
///
/// assert_eq!(value.to_string(), "GIB''%C0%FF%EE".to_string());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Simple(String),
    Compound {
        encoding: Encoding,
        language: String,
        value: String,
    },
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Simple(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Simple(s)
    }
}

impl Value {
    /// Parses an RFC8187 extended value `charset'language'value-chars`.
    ///
    /// Without the quote-delimited prefix the charset defaults to UTF-8 and
    /// the language to `en`. UTF-8 values are percent-decoded; values in any
    /// other charset are kept percent-encoded.
    ///
    /// ```
    /// use linkheader_fragment::param::{Encoding, Value};
    ///
    /// let value = Value::parse_extended("UTF-8'en'hello%20world").unwrap();
    ///
    /// assert_eq!(
    ///     value,
    ///     Value::Compound {
    ///         encoding: Encoding::Utf8,
    ///         language: "en".into(),
    ///         value: "hello world".into(),
    ///     }
    /// );
    /// ```
    pub fn parse_extended(input: &str) -> Result<Value> {
        let mut parts = input.splitn(3, '\'');

        let (charset, language, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(charset), Some(language), Some(raw)) => (charset, language, raw),
            _ => ("UTF-8", "en", input),
        };

        let encoding = Encoding::from(charset);
        let value = match encoding {
            Encoding::Utf8 => percent_decode_str(raw)
                .decode_utf8()
                .map_err(|_| ParserError::InvalidExtendedValue(input.into()))?
                .into_owned(),
            Encoding::Extension(_) => raw.to_string(),
        };

        Ok(Value::Compound {
            encoding,
            language: language.to_lowercase(),
            value,
        })
    }

    /// Returns the text value from either simple or compound values.
    pub fn text(&self) -> &str {
        match self {
            Value::Simple(value) => &value,
            Value::Compound { value, .. } => &value,
        }
    }

    pub fn as_simple(&self) -> Option<&str> {
        match self {
            Value::Simple(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        match self {
            Value::Compound { .. } => true,
            _ => false,
        }
    }

    pub fn is_simple(&self) -> bool {
        match self {
            Value::Simple(_) => true,
            _ => false,
        }
    }

    /// Serialises the value as it goes on the wire after `name=`.
    ///
    /// Token params (`rel`, `type`, `anchor`) are quoted when needed but
    /// never percent-encoded. Any other simple value that needs quoting is
    /// percent-encoded and quoted. Star params always use the extended form.
    pub fn format_for(&self, name: &str) -> String {
        match self {
            Value::Compound { .. } => self.to_string(),

            Value::Simple(value) if name.ends_with('*') => format!(
                "{}'en'{}",
                Encoding::Utf8,
                utf8_percent_encode(value, ATTR_CHAR)
            ),

            Value::Simple(value) if !needs_quotes(value) => value.clone(),

            Value::Simple(value) if is_token_attribute(name) => {
                format!("\"{}\"", escape_quotes(value))
            }

            Value::Simple(value) => format!("\"{}\"", utf8_percent_encode(value, QUOTED_TEXT)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Simple(val) => write!(formatter, "{}", val),
            Value::Compound {
                encoding,
                language,
                value,
            } => {
                let val = match encoding {
                    Encoding::Utf8 => utf8_percent_encode(value, ATTR_CHAR).to_string(),
                    _ => value.to_string(),
                };

                write!(formatter, "{}'{}'{}", encoding, language, val)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, Rfc8288Parser};
    use pretty_assertions::assert_eq;

    fn parse_param(input: &str) -> Result<Param> {
        let pair = Rfc8288Parser::parse(Rule::param, input)
            .expect("unsuccessful parse")
            .next()
            .unwrap();

        Param::from_rule(pair)
    }

    #[test]
    fn token_value() {
        let actual = parse_param("rel=next").expect("Expect a valid param");

        assert_eq!(actual, Param::new("rel", "next"));
    }

    #[test]
    fn quoted_value_with_escapes() {
        let actual =
            parse_param(r#"title="Something of \"importance\"""#).expect("Expect a valid param");

        assert_eq!(actual.value().text(), r#"Something of "importance""#);
    }

    #[test]
    fn name_is_lowercased() {
        let actual = parse_param("REL=next").expect("Expect a valid param");

        assert_eq!(actual.name(), "rel");
    }

    #[test]
    fn type_value_is_lowercased() {
        let actual = parse_param(r#"type="Text/HTML""#).expect("Expect a valid param");

        assert_eq!(actual.value(), &Value::Simple("text/html".into()));
    }

    #[test]
    fn param_without_value() {
        let actual = parse_param("foo").expect("Expect a valid param");

        assert_eq!(actual, Param::new("foo", ""));
    }

    #[test]
    fn wrong_rule_type() {
        let pair = Rfc8288Parser::parse(Rule::token, "next")
            .expect("unsuccessful parse")
            .next()
            .unwrap();

        assert!(Param::from_rule(pair).is_err());
    }

    #[test]
    fn extended_value_defaults() {
        let actual = Value::parse_extended("hello%20world").expect("Expect a valid value");

        assert_eq!(
            actual,
            Value::Compound {
                encoding: Encoding::Utf8,
                language: "en".into(),
                value: "hello world".into(),
            }
        );
    }

    #[test]
    fn extended_value_empty_language() {
        let actual = Value::parse_extended("UTF-8''%CE%BB").expect("Expect a valid value");

        assert_eq!(
            actual,
            Value::Compound {
                encoding: Encoding::Utf8,
                language: "".into(),
                value: "λ".into(),
            }
        );
    }

    #[test]
    fn extended_value_other_charset_stays_encoded() {
        let actual = Value::parse_extended("GB2312'cn'%C6%F3%20%D2%B5").expect("Expect a valid value");

        assert_eq!(
            actual,
            Value::Compound {
                encoding: Encoding::Extension("gb2312".into()),
                language: "cn".into(),
                value: "%C6%F3%20%D2%B5".into(),
            }
        );
    }

    #[test]
    fn extended_value_invalid_utf8() {
        let error = Value::parse_extended("UTF-8'en'%FF").unwrap_err();

        assert_eq!(
            error.downcast_ref::<ParserError>(),
            Some(&ParserError::InvalidExtendedValue("UTF-8'en'%FF".into()))
        );
    }

    #[test]
    fn needs_quotes_examples() {
        assert!(!needs_quotes("next"));
        assert!(!needs_quotes("en-US"));
        assert!(needs_quotes(""));
        assert!(needs_quotes("a b"));
        assert!(needs_quotes("a,b"));
        assert!(needs_quotes("text/html"));
        assert!(needs_quotes("\"quoted\""));
    }

    #[test]
    fn format_token_param_with_quote() {
        let param = Param::new("anchor", "/#anch\"00\"");

        assert_eq!(param.to_string(), r#"anchor="/#anch\"00\"""#);
    }

    #[test]
    fn format_token_param_keeps_single_quote() {
        let param = Param::new("rel", "example' the single quote");

        assert_eq!(param.to_string(), r#"rel="example' the single quote""#);
    }

    #[test]
    fn format_text_param_percent_encodes() {
        assert_eq!(
            Param::new("title", "example\" the double quote").to_string(),
            r#"title="example%22 the double quote""#
        );
        assert_eq!(
            Param::new("title", "example with ⅓").to_string(),
            r#"title="example with %E2%85%93""#
        );
        assert_eq!(
            Param::new("title", "previous; chapter, two").to_string(),
            r#"title="previous; chapter, two""#
        );
    }

    #[test]
    fn format_repeated_param() {
        let mut param = Param::new("hreflang", "en-US");
        param.extend(Param::new("hreflang", "de"));

        assert!(param.is_repeated());
        assert_eq!(param.to_string(), "hreflang=en-US; hreflang=de");
    }

    #[test]
    fn format_star_param() {
        let param = Param::new(
            "title*",
            Value::Compound {
                encoding: Encoding::Utf8,
                language: "en".into(),
                value: "①⓫⅓㏨♳𝄞λ".into(),
            },
        );

        assert_eq!(
            param.to_string(),
            "title*=UTF-8'en'%E2%91%A0%E2%93%AB%E2%85%93%E3%8F%A8%E2%99%B3%F0%9D%84%9E%CE%BB"
        );
    }

    #[test]
    fn format_star_param_from_simple_value() {
        let param = Param::new("title*", "hello world");

        assert_eq!(param.to_string(), "title*=UTF-8'en'hello%20world");
    }

    #[test]
    fn value_kinds() {
        let simple = Param::new("hreflang", "de");
        let star = Param::new("title*", Value::parse_extended("UTF-8'de'Kapitel").expect("Expect a valid value"));

        assert!(!simple.is_star());
        assert!(simple.value().is_simple());
        assert!(star.is_star());
        assert!(star.value().is_compound());
        assert!(!star.value().is_simple());
        assert_eq!(star.into_values().len(), 1);
    }
}
