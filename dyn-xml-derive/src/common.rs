// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cell::RefCell;

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{Lit, LitStr, Meta, MetaNameValue, NestedMeta};

// See serde/serde_derive/src/internals/attr.rs.

const DYN_XML: &str = "dyn_xml";

/// Accumulates compiler errors. Similar to `serde_derive`'s `Ctxt`.
pub(crate) struct Errors(RefCell<Option<Vec<syn::Error>>>);

impl Errors {
    pub(crate) fn new() -> Self {
        Errors(RefCell::new(Some(Vec::new())))
    }

    pub(crate) fn push(&self, err: syn::Error) {
        self.0.borrow_mut().as_mut().unwrap().push(err);
    }

    pub(crate) fn take_compile_errors(&self) -> TokenStream {
        let errors = self
            .0
            .borrow_mut()
            .take()
            .unwrap()
            .into_iter()
            .map(syn::Error::into_compile_error);
        quote! {
            #(#errors)*
        }
    }
}

impl Drop for Errors {
    fn drop(&mut self) {
        if self.0.borrow().is_some() {
            panic!("Errors dropped without take_compile_errors call");
        }
    }
}

/// Returns the items within all `#[dyn_xml(...)]` attributes.
pub(crate) fn get_meta_items(errors: &Errors, attrs: &[syn::Attribute]) -> Vec<NestedMeta> {
    let mut out = Vec::new();
    for attr in attrs {
        if !attr.path.is_ident(DYN_XML) {
            continue;
        }

        match attr.parse_meta() {
            Ok(Meta::List(meta)) => out.extend(meta.nested.into_iter()),
            Ok(other) => errors.push(syn::Error::new_spanned(other, "expected #[dyn_xml(...)]")),
            Err(err) => errors.push(err),
        }
    }
    out
}

pub(crate) fn with_lit_str(errors: &Errors, name_value: &MetaNameValue, f: &mut dyn FnMut(&LitStr)) {
    if let Lit::Str(s) = &name_value.lit {
        f(s);
    } else {
        errors.push(syn::Error::new_spanned(
            &name_value.lit,
            format!(
                "{:?} expects a string literal",
                name_value.path.to_token_stream()
            ),
        ));
    }
}

/// Parses a string literal's contents as `T`, as in `to_value = "Self::value"`.
pub(crate) fn parse_lit_str<T: syn::parse::Parse>(
    errors: &Errors,
    name_value: &MetaNameValue,
) -> Option<T> {
    let mut out = None;
    with_lit_str(errors, name_value, &mut |l| match l.parse::<T>() {
        Ok(t) => out = Some(t),
        Err(e) => errors.push(e),
    });
    out
}
