// Copyright 2019 Arnau Siches
//
// Licensed under the MIT license <LICENSE or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed except
// according to those terms.

//! RFC8288 `Link` headers with templated JSON fragment links.
//!
//! [`parse`] and [`format`] convert between `Link` header values and
//! [`Link`]s. A link whose target fragment is a JSON Pointer template, e.g.
//! `</books#/items/{index}>; rel="item"`, can be expanded over a JSON
//! document with [`fragment::find_matching_fragments`], or over a whole HTTP
//! response with [`response::LinkedResponse`].
//!
//! ```
//! use linkheader_fragment::{format, parse};
//!
//! let header = parse(r#"</TheBook/chapter2>; rel="previous"; title="previous chapter""#).unwrap();
//!
//! assert_eq!(header.links[0].rel(), "previous");
//! assert_eq!(format(&header.links), r#"</TheBook/chapter2>; rel=previous; title="previous chapter""#);
//! ```

#[macro_use]
extern crate failure;

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod error;
pub mod fragment;
pub mod header;
pub mod link;
pub mod param;
pub mod parser;
pub mod pointer;
pub mod response;
pub mod template;
pub mod uri;

pub use error::{Error, ParserError, PointerError, Result, TemplateError};
pub use fragment::{find_matching_fragments, interpolate_anchor, Fragment, FragmentLink};
pub use header::{format, LinkHeader};
pub use link::Link;
pub use parser::parse;
pub use uri::is_fragment_of;
