// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logic to derive the [`dyn_xml::Introspect`] trait.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{ext::IdentExt, Data, DeriveInput, Fields, Meta, MetaNameValue, NestedMeta};

use crate::common::{get_meta_items, parse_lit_str, with_lit_str, Errors};

/// A zero-argument method whose result is reported by `accessors`.
struct Getter {
    method: syn::Ident,
    key: String,
}

/// Parsed top-level attributes.
#[derive(Default)]
struct ContainerAttr {
    getters: Vec<Getter>,
    to_value: Option<syn::ExprPath>,
    parent: Option<syn::Type>,
}

/// The key a getter is reported under: its name without `get_`, `is_`, or
/// `has_`.
fn accessor_key(method: &str) -> &str {
    for prefix in ["get_", "is_", "has_"] {
        match method.strip_prefix(prefix) {
            Some(rest) if !rest.is_empty() => return rest,
            _ => {}
        }
    }
    method
}

impl ContainerAttr {
    fn new(errors: &Errors, input: &DeriveInput) -> Self {
        let mut attr = ContainerAttr::default();
        for item in get_meta_items(errors, &input.attrs) {
            match &item {
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("getter") =>
                {
                    if let Some(method) = parse_lit_str::<syn::Ident>(errors, nv) {
                        let key = accessor_key(&method.unraw().to_string()).to_owned();
                        attr.getters.push(Getter { method, key });
                    }
                }
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("to_value") =>
                {
                    if attr.to_value.is_some() {
                        errors.push(syn::Error::new_spanned(nv, "duplicate to_value"));
                    }
                    attr.to_value = parse_lit_str(errors, nv);
                }
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("parent") =>
                {
                    if attr.parent.is_some() {
                        errors.push(syn::Error::new_spanned(nv, "duplicate parent"));
                    }
                    attr.parent = parse_lit_str(errors, nv);
                }
                i => errors.push(syn::Error::new_spanned(i, "item not understood")),
            }
        }
        attr
    }
}

struct Field<'a> {
    ident: &'a syn::Ident,
    key: String,
}

fn parse_fields<'a>(errors: &Errors, input: &'a DeriveInput) -> Result<Vec<Field<'a>>, ()> {
    let struct_ = match &input.data {
        Data::Struct(s) => s,
        _ => {
            errors.push(syn::Error::new_spanned(
                &input.ident,
                "only structs are supported",
            ));
            return Err(());
        }
    };
    let named = match &struct_.fields {
        Fields::Named(n) => &n.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(_) => {
            errors.push(syn::Error::new_spanned(
                &input.ident,
                "tuple structs are not supported",
            ));
            return Err(());
        }
    };
    let mut out = Vec::with_capacity(named.len());
    for f in named {
        let ident = f.ident.as_ref().unwrap();
        let mut skip = false;
        let mut key = None;
        for item in get_meta_items(errors, &f.attrs) {
            match &item {
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("skip") => skip = true,
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("rename") =>
                {
                    with_lit_str(errors, nv, &mut |l| key = Some(l.value()));
                }
                i => errors.push(syn::Error::new_spanned(i, "item not understood")),
            }
        }
        if skip {
            if key.is_some() {
                errors.push(syn::Error::new_spanned(
                    ident,
                    "skip and rename are mutually exclusive",
                ));
            }
            continue;
        }
        out.push(Field {
            ident,
            key: key.unwrap_or_else(|| ident.unraw().to_string()),
        });
    }
    Ok(out)
}

pub(crate) fn derive(errors: &Errors, input: DeriveInput) -> Result<TokenStream, ()> {
    if !input.generics.params.is_empty() {
        errors.push(syn::Error::new_spanned(
            &input.generics,
            "generic types are not supported",
        ));
        return Err(());
    }
    let attr = ContainerAttr::new(errors, &input);
    let fields = parse_fields(errors, &input)?;
    let ident = &input.ident;

    let fields_fn = if fields.is_empty() {
        quote! {}
    } else {
        let entries = fields.iter().map(|f| {
            let ident = f.ident;
            let key = &f.key;
            quote_spanned! {
                ident.span() =>
                (
                    ::std::string::String::from(#key),
                    ::dyn_xml::ToProperty::to_property(&self.#ident),
                ),
            }
        });
        quote! {
            fn fields(&self) -> ::std::vec::Vec<(::std::string::String, ::dyn_xml::Property<'_>)> {
                ::std::vec![#(#entries)*]
            }
        }
    };

    let accessors_fn = if attr.getters.is_empty() {
        quote! {}
    } else {
        let entries = attr.getters.iter().map(|g| {
            let method = &g.method;
            let key = &g.key;
            quote_spanned! {
                method.span() =>
                (
                    ::std::string::String::from(#key),
                    ::dyn_xml::IntoProperty::into_property(self.#method()),
                ),
            }
        });
        quote! {
            fn accessors(&self) -> ::std::vec::Vec<(::std::string::String, ::dyn_xml::Property<'_>)> {
                ::std::vec![#(#entries)*]
            }
        }
    };

    let to_value_fn = attr.to_value.as_ref().map(|path| {
        quote! {
            fn to_value(&self) -> ::std::option::Option<::dyn_xml::Value> {
                ::std::option::Option::Some(#path(self))
            }
        }
    });

    let parent_type_fn = attr.parent.as_ref().map(|ty| {
        quote! {
            fn parent_type(&self) -> ::std::option::Option<::std::any::TypeId> {
                ::std::option::Option::Some(::std::any::TypeId::of::<#ty>())
            }
        }
    });

    Ok(quote! {
        impl ::dyn_xml::Introspect for #ident {
            #accessors_fn
            #fields_fn
            #to_value_fn
            #parent_type_fn
        }

        impl ::dyn_xml::ToProperty for #ident {
            fn to_property(&self) -> ::dyn_xml::Property<'_> {
                ::dyn_xml::Property::Object(self)
            }
        }

        impl<'a> ::dyn_xml::IntoProperty<'a> for #ident {
            fn into_property(self) -> ::dyn_xml::Property<'a> {
                ::dyn_xml::Property::Shared(::std::rc::Rc::new(self))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_keys() {
        assert_eq!(accessor_key("get_full_name"), "full_name");
        assert_eq!(accessor_key("is_active"), "active");
        assert_eq!(accessor_key("has_children"), "children");
        assert_eq!(accessor_key("get_"), "get_");
        assert_eq!(accessor_key("total"), "total");
    }

    fn expand(input: DeriveInput) -> (Result<TokenStream, ()>, String) {
        let errors = Errors::new();
        let out = derive(&errors, input);
        (out, errors.take_compile_errors().to_string())
    }

    #[test]
    fn skip_and_rename() {
        let (out, errors) = expand(syn::parse_quote! {
            #[dyn_xml(getter = "get_label")]
            struct Foo {
                #[dyn_xml(rename = "userId")]
                id: u32,
                #[dyn_xml(skip)]
                secret: String,
                r#type: String,
            }
        });
        assert_eq!(errors, "");
        let out = out.unwrap().to_string();
        assert!(out.contains("\"userId\""), "{}", out);
        assert!(out.contains("\"type\""), "{}", out);
        assert!(out.contains("\"label\""), "{}", out);
        assert!(!out.contains("secret"), "{}", out);
    }

    #[test]
    fn rejects_unknown_items() {
        let (_, errors) = expand(syn::parse_quote! {
            #[dyn_xml(flatten)]
            struct Foo {
                #[dyn_xml(skip, rename = "x")]
                a: u32,
            }
        });
        assert!(errors.contains("item not understood"), "{}", errors);
        assert!(errors.contains("mutually exclusive"), "{}", errors);
    }

    #[test]
    fn rejects_enums_and_generics() {
        let (out, errors) = expand(syn::parse_quote! {
            enum Foo { A }
        });
        assert!(out.is_err());
        assert!(errors.contains("only structs are supported"), "{}", errors);

        let (out, errors) = expand(syn::parse_quote! {
            struct Foo<T> { a: T }
        });
        assert!(out.is_err());
        assert!(errors.contains("generic types are not supported"), "{}", errors);
    }
}
