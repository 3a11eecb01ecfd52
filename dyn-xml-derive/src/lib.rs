// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

mod common;
mod introspect;

use common::Errors;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn derive(
    input: proc_macro::TokenStream,
    f: fn(&Errors, syn::DeriveInput) -> Result<proc_macro2::TokenStream, ()>,
) -> proc_macro::TokenStream {
    let errors = Errors::new();
    let input = parse_macro_input!(input as DeriveInput);
    let out = f(&errors, input).unwrap_or_default();
    let errors = errors.take_compile_errors();
    proc_macro::TokenStream::from(quote! {
        const _: () = {
            #errors
            #out
        };
    })
}

/// Derives `dyn_xml::Introspect`, `dyn_xml::ToProperty`, and
/// `dyn_xml::IntoProperty` for a struct with named fields.
///
/// Every field is reported by `fields()` and must implement
/// `dyn_xml::ToProperty`. Field attributes:
///
/// *   `#[dyn_xml(skip)]` leaves the field out.
/// *   `#[dyn_xml(rename = "name")]` reports it under another key.
///
/// Container attributes:
///
/// *   `#[dyn_xml(getter = "get_name")]`, repeatable, reports the result of
///     calling `self.get_name()` under the key `name`. The result must
///     implement `dyn_xml::IntoProperty`.
/// *   `#[dyn_xml(to_value = "path")]` calls `path(&self) -> dyn_xml::Value`
///     to produce the whole value instead.
/// *   `#[dyn_xml(parent = "Type")]` checks `Type` rather than this type
///     against the normalizer's ignored types.
#[proc_macro_derive(Introspect, attributes(dyn_xml))]
pub fn derive_introspect(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    derive(input, introspect::derive)
}
