// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding from XML trees to [`Value`]s.

use std::path::Path;
use std::sync::Arc;

use log::{debug, trace};

use crate::inflect::SimpleInflector;
use crate::loader::Loader;
use crate::text::{coerce_scalar, fix_node_name, is_index_key};
use crate::tree::{Document, Element, QName};
use crate::value::keys_are_positions;
use crate::{Error, ErrorKind, Map, Value};

/// A function from one name to another: key normalizers and pluralizers.
pub type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Options for [`Decoder`].
///
/// Built with chained setters from [`DecodeOptions::default`]:
///
/// ```
/// # use dyn_xml::{Decoder, DecodeOptions};
/// let decoder = Decoder::new(
///     DecodeOptions::default()
///         .merge_attributes(true)
///         .index_key(Some("item")),
/// );
/// ```
#[derive(Clone)]
pub struct DecodeOptions {
    attribute_key: String,
    merge_attributes: bool,
    value_key: String,
    index_key: Option<String>,
    index_attribute_key: String,
    key_normalizer: NameFn,
    pluralizer: Option<NameFn>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            attribute_key: "@attributes".to_owned(),
            merge_attributes: false,
            value_key: "value".to_owned(),
            index_key: None,
            index_attribute_key: "index".to_owned(),
            key_normalizer: Arc::new(fix_node_name),
            pluralizer: None,
        }
    }
}

impl std::fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("attribute_key", &self.attribute_key)
            .field("merge_attributes", &self.merge_attributes)
            .field("value_key", &self.value_key)
            .field("index_key", &self.index_key)
            .field("index_attribute_key", &self.index_attribute_key)
            .field("pluralizer", &self.pluralizer.is_some())
            .finish()
    }
}

impl DecodeOptions {
    /// The key attributes are grouped under, unless merged. Defaults to
    /// `@attributes`.
    pub fn attribute_key(mut self, key: impl Into<String>) -> Self {
        self.attribute_key = key.into();
        self
    }

    /// Places attributes directly in the element's map. Child elements with
    /// the same key win.
    pub fn merge_attributes(mut self, merge: bool) -> Self {
        self.merge_attributes = merge;
        self
    }

    /// The key an element's own text is stored under when the element also
    /// has attributes or children. Defaults to `value`.
    pub fn value_key(mut self, key: impl Into<String>) -> Self {
        self.value_key = key.into();
        self
    }

    /// Element name that always marks a list member, such as `item`.
    pub fn index_key(mut self, key: Option<&str>) -> Self {
        self.index_key = key.map(str::to_owned);
        self
    }

    /// Attribute holding a list member's explicit key. Defaults to `index`.
    pub fn index_attribute_key(mut self, key: impl Into<String>) -> Self {
        self.index_attribute_key = key.into();
        self
    }

    /// Maps element and attribute local names to keys. Defaults to
    /// [`fix_node_name`].
    pub fn key_normalizer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.key_normalizer = Arc::new(f);
        self
    }

    /// Pluralizes a child key to compare it with its parent's: with `|s|
    /// format!("{}s", s)`, the `<aa>`s within `<aas>` are a list.
    pub fn pluralizer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.pluralizer = Some(Arc::new(f));
        self
    }

    pub fn pluralizer_from(self, inflector: Arc<SimpleInflector>) -> Self {
        self.pluralizer(move |s| inflector.pluralize(s))
    }
}

/// Result entries of one element, accumulated like an ordered associative
/// array: appended members take the next integer key after the largest one
/// so far.
#[derive(Default)]
struct Entries {
    map: Map,
    next_index: i64,
}

impl Entries {
    fn insert(&mut self, key: String, value: Value) {
        if is_index_key(&key) {
            if let Ok(i) = key.parse::<i64>() {
                if i >= self.next_index {
                    self.next_index = i.saturating_add(1);
                }
            }
        }
        self.map.insert(key, value);
    }

    fn push(&mut self, value: Value) {
        let key = self.next_index.to_string();
        self.insert(key, value);
    }

    fn into_value(self) -> Value {
        if keys_are_positions(self.map.keys().map(String::as_str)) {
            Value::List(self.map.into_values().collect())
        } else {
            Value::Map(self.map)
        }
    }
}

/// Decodes XML into [`Value`]s.
///
/// Conversion is total over elements: anything well-formed decodes, with
/// these rules per element:
///
/// *   Attributes become a map under the attribute key (or merged into the
///     element's map), with values converted by [`coerce_scalar`].
/// *   A child is a list member if it's named by the index key, or if its
///     key (or its pluralized key) equals its parent's. List members carrying
///     the index attribute are stored under that key instead of the next
///     position.
/// *   Other children are stored under their key; if the same name appears
///     more than once among the siblings, the key holds a list.
/// *   Text is converted by [`coerce_scalar`] unless the element has
///     `type="string"` or `type="text"`. It's the element's whole value if
///     there are no attributes or children, and otherwise is stored under
///     the value key.
/// *   An element with none of these is `Null`.
///
/// The tree is never modified, so decoding the same tree twice gives the
/// same result.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    options: DecodeOptions,
    loader: Loader,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            loader: Loader::default(),
        }
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Returns a decoder sharing this one's loader but using `options`.
    pub fn with_options(&self, options: DecodeOptions) -> Self {
        Self {
            options,
            loader: self.loader.clone(),
        }
    }

    /// Decodes a document into a single-entry map from the root element's
    /// qualified name to its value.
    pub fn decode_document(&self, doc: &Document) -> Result<Value, Error> {
        let root = doc.root().ok_or_else(|| Error::new(ErrorKind::EmptyDocument))?;
        let mut out = Map::new();
        out.insert(root.name.to_string(), self.decode_element(root));
        Ok(Value::Map(out))
    }

    /// Decodes the contents of `element`, ignoring its name.
    pub fn decode_element(&self, element: &Element) -> Value {
        self.element(element, None)
    }

    pub fn parse_str(&self, xml: &str) -> Result<Value, Error> {
        self.decode_document(&self.loader.load_str(xml)?)
    }

    pub fn parse_reader<R: std::io::Read>(&self, source: R) -> Result<Value, Error> {
        self.decode_document(&self.loader.load_reader(source)?)
    }

    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> Result<Value, Error> {
        self.decode_document(&self.loader.load_path(path)?)
    }

    fn key(&self, name: &QName) -> String {
        prefixed(&(self.options.key_normalizer)(&name.local), name.prefix.as_deref())
    }

    fn pluralize(&self, key: &str) -> String {
        match &self.options.pluralizer {
            Some(p) => p(key),
            None => key.to_owned(),
        }
    }

    /// Decodes `element`, leaving out the attribute `skip_attribute` (an
    /// index attribute already used as the element's key).
    fn element(&self, element: &Element, skip_attribute: Option<&str>) -> Value {
        trace!("decoding <{}>", element.name);
        let parent_key = self.key(&element.name);
        let mut entries = Entries::default();
        for (position, child) in element.child_elements() {
            self.child(element, position, child, &parent_key, &mut entries);
        }

        let mut attributes = Map::new();
        let mut uncoerced = false;
        for a in &element.attributes {
            if skip_attribute.map_or(false, |s| a.name.matches(s)) {
                continue;
            }
            if a.name.prefix.is_none()
                && a.name.local == "type"
                && matches!(a.value.as_str(), "string" | "text")
            {
                uncoerced = true;
                continue;
            }
            attributes.insert(self.key(&a.name), coerce_scalar(&a.value, Value::Null));
        }

        let raw = element.text();
        let text = match (uncoerced, raw.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::Text(raw),
            (false, _) => coerce_scalar(&raw, Value::Null),
        };

        if !attributes.is_empty() {
            if !text.is_null() {
                entries.insert(self.options.value_key.clone(), text);
            }
            let mut out = if self.options.merge_attributes {
                attributes
            } else {
                let mut out = Map::new();
                out.insert(self.options.attribute_key.clone(), Value::Map(attributes));
                out
            };
            for (k, v) in entries.map {
                out.insert(k, v);
            }
            return Value::Map(out);
        }
        if !text.is_null() {
            if entries.map.is_empty() {
                return text;
            }
            entries.insert(self.options.value_key.clone(), text);
        }
        if entries.map.is_empty() {
            return Value::Null;
        }
        entries.into_value()
    }

    fn child(
        &self,
        parent: &Element,
        position: usize,
        child: &Element,
        parent_key: &str,
        entries: &mut Entries,
    ) {
        let prefix = child.name.prefix.as_deref();
        let local = (self.options.key_normalizer)(&child.name.local);
        let key = prefixed(&local, prefix);

        if let Some(existing) = entries.map.get_mut(&key) {
            match existing {
                Value::List(members) => members.push(self.element(child, None)),
                _ => debug!(
                    "dropping <{}> at {}: key {:?} already holds a single value",
                    child.name, position, key
                ),
            }
            return;
        }

        let is_member = self
            .options
            .index_key
            .as_deref()
            .map_or(false, |k| prefixed(k, prefix) == key)
            || parent_key == key
            || parent_key == prefixed(&self.pluralize(&local), prefix);
        if is_member {
            let index_attribute = self.options.index_attribute_key.as_str();
            match child.attribute(index_attribute).filter(|i| !i.is_empty()) {
                Some(index) => {
                    let value = self.element(child, Some(index_attribute));
                    match coerce_scalar(index, Value::Null) {
                        Value::Int(i) => entries.insert(i.to_string(), value),
                        _ => entries.insert(index.to_owned(), value),
                    }
                }
                None => entries.push(self.element(child, None)),
            }
            return;
        }

        let value = self.element(child, None);
        if parent.equal_siblings(position) > 1 {
            entries.insert(key, Value::List(vec![value]));
        } else {
            entries.insert(key, value);
        }
    }
}

fn prefixed(key: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, key),
        None => key.to_owned(),
    }
}
