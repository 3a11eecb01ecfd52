// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between XML documents and dynamically-shaped [`Value`]s.
//!
//! [`Decoder`] turns an XML tree into nested maps, lists, and scalars;
//! [`Encoder`] does the reverse. XML has no list type and doesn't distinguish
//! attributes from children the way a map does, so both directions share a
//! few conventions: list members can be named by an index key (`<item>`) or
//! by the singular of their parent (`<tags><tag>`), attributes are grouped
//! under `@attributes`, and strings that would otherwise read back as numbers
//! or booleans are written with `type="string"`.
//!
//! Arbitrary Rust values reach the encoder through the [`Normalizer`], which
//! walks anything implementing [`Introspect`] (usually via
//! `#[derive(dyn_xml_derive::Introspect)]`).

mod error;
pub mod de;
pub mod inflect;
pub mod loader;
pub mod normalize;
pub mod ser;
pub mod text;
pub mod tree;
mod value;

pub use de::{DecodeOptions, Decoder};
pub use error::{Diagnostic, Error, ErrorKind, Severity};
pub use inflect::SimpleInflector;
pub use loader::{LoadOptions, Loader, Source};
pub use normalize::{IntoProperty, Introspect, Normalizer, Property, ToProperty};
pub use ser::{EncodeOptions, Encoder};
pub use tree::{Document, Element, Node, QName, WriteOptions};
pub use value::{Map, Value};

pub use xml::common::TextPosition;
