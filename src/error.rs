// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! Error types and utilities.

use crate::parser::Rule;
pub use failure::Error;
use failure::*;

/// Either `Ok(T)` or `Err(failure::Error)`.
pub type Result<T> = ::std::result::Result<T, failure::Error>;

/// A Link header parser error.
///
/// The whole parse fails on the first error; there is no partial result.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ParserError {
    /// Given invalid `Rule` variant to `from_rule`
    #[fail(display = "Expected a rule of type {} but given {} instead", _0, _1)]
    InvalidRule(Rule, Rule),

    #[fail(
        display = "Unexpected character \"{}\" at offset {}",
        character, offset
    )]
    UnexpectedCharacter { character: char, offset: usize },

    #[fail(display = "Unexpected end of input at offset {}", offset)]
    UnexpectedEnd { offset: usize },

    /// A link-value without a `rel` param.
    #[fail(display = "Unexpected null rel")]
    MissingRel,

    /// An extended value declared as UTF-8 that does not percent-decode to UTF-8.
    #[fail(display = "Invalid extended value {}", _0)]
    InvalidExtendedValue(String),
}

/// A JSON Pointer (RFC6901) error, either in plain or URI fragment form.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum PointerError {
    #[fail(display = "Invalid JSON pointer {:?}: {}", pointer, reason)]
    InvalidSyntax { pointer: String, reason: String },

    #[fail(display = "Invalid percent-encoding in JSON pointer {:?}", pointer)]
    InvalidEncoding { pointer: String },
}

/// A URI template (RFC6570) error.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum TemplateError {
    #[fail(display = "Invalid URI template {:?}: {}", template, reason)]
    Invalid { template: String, reason: String },
}
