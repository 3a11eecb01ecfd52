// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encoding from [`Value`]s to XML trees.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace};

use crate::de::NameFn;
use crate::inflect::SimpleInflector;
use crate::normalize::{Introspect, Normalizer, Property};
use crate::text::{coerce_scalar, is_index_key, is_valid_node_name};
use crate::tree::{Document, Element, QName};
use crate::{Error, Map, Value};

/// Options for [`Encoder`].
///
/// The name setters validate immediately, so a bad name is reported where
/// it's configured rather than on the first encode.
#[derive(Clone)]
pub struct EncodeOptions {
    index_key: Option<String>,
    index_attribute_key: Option<String>,
    value_key: Option<String>,
    inflector: Option<NameFn>,
    attribute_map: HashMap<String, Vec<String>>,
    encoding: String,
    normalizer: Normalizer,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            index_key: Some("item".to_owned()),
            index_attribute_key: None,
            value_key: None,
            inflector: None,
            attribute_map: HashMap::new(),
            encoding: "UTF-8".to_owned(),
            normalizer: Normalizer::default(),
        }
    }
}

impl std::fmt::Debug for EncodeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("index_key", &self.index_key)
            .field("index_attribute_key", &self.index_attribute_key)
            .field("value_key", &self.value_key)
            .field("inflector", &self.inflector.is_some())
            .field("attribute_map", &self.attribute_map)
            .field("encoding", &self.encoding)
            .field("normalizer", &self.normalizer)
            .finish()
    }
}

fn valid_name(name: Option<&str>) -> Result<Option<String>, Error> {
    match name {
        Some(n) if !is_valid_node_name(n) => Err(Error::invalid_node_name(n)),
        n => Ok(n.map(str::to_owned)),
    }
}

impl EncodeOptions {
    /// Element name for list members and keys that aren't valid names.
    /// Defaults to `item`. With `None`, list members are written as repeated
    /// siblings named after their container instead.
    pub fn index_key(mut self, key: Option<&str>) -> Result<Self, Error> {
        self.index_key = valid_name(key)?;
        Ok(self)
    }

    /// Attribute preserving the key of a member of a sparse integer-keyed
    /// map. `None` means `index`.
    pub fn index_attribute_key(mut self, key: Option<&str>) -> Result<Self, Error> {
        self.index_attribute_key = valid_name(key)?;
        Ok(self)
    }

    /// Map entry written as its element's own text when the element has
    /// attributes.
    pub fn value_key(mut self, key: Option<&str>) -> Result<Self, Error> {
        self.value_key = valid_name(key)?;
        Ok(self)
    }

    /// Singularizes a list's key to name its members: with a function mapping
    /// `tags` to `tag`, `{"tags": ["a"]}` is written as
    /// `<tags><tag>a</tag></tags>`.
    pub fn inflector<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.inflector = Some(Arc::new(f));
        self
    }

    pub fn inflector_from(self, inflector: Arc<SimpleInflector>) -> Self {
        self.inflector(move |s| inflector.singularize(s))
    }

    /// Writes scalar entries `key` of elements named `element` as attributes.
    /// `element` may be `*` to match any element.
    pub fn add_mapped_attribute(mut self, element: &str, key: &str) -> Self {
        self.attribute_map
            .entry(element.to_owned())
            .or_default()
            .push(key.to_owned());
        self
    }

    /// Replaces the whole attribute map; see [`Self::add_mapped_attribute`].
    pub fn attribute_map(mut self, map: HashMap<String, Vec<String>>) -> Self {
        self.attribute_map = map;
        self
    }

    /// The encoding named in the output's XML declaration.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// Encodes [`Value`]s (and, through the [`Normalizer`], arbitrary
/// [`Introspect`] objects) as XML.
///
/// Encoding never fails on content. Entries that have no XML form, such as a
/// list member when there's no index key, are logged and left out.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn with_options(&self, options: EncodeOptions) -> Self {
        Self::new(options)
    }

    /// Encodes `value` as the contents of a root element named `root_name`.
    pub fn encode(&self, value: &Value, root_name: &str) -> Result<Document, Error> {
        let root = root_element(root_name)?;
        Ok(self.document(root, self.options.normalizer.normalize_value(value)))
    }

    pub fn encode_object(&self, object: &dyn Introspect, root_name: &str) -> Result<Document, Error> {
        let root = root_element(root_name)?;
        Ok(self.document(root, self.options.normalizer.normalize_object(object)))
    }

    pub fn encode_property(&self, property: &Property<'_>, root_name: &str) -> Result<Document, Error> {
        let root = root_element(root_name)?;
        Ok(self.document(root, self.options.normalizer.normalize(property)))
    }

    /// Encodes `value` and serializes the result.
    pub fn dump(&self, value: &Value, root_name: &str) -> Result<String, Error> {
        self.encode(value, root_name)?.to_xml_string()
    }

    fn document(&self, mut root: Element, value: Option<Value>) -> Document {
        trace!("encoding <{}>", root.name);
        if let Some(v) = &value {
            self.write_value(&mut root, v);
        }
        let mut doc = Document::with_root(root);
        doc.encoding = self.options.encoding.clone();
        doc
    }

    fn write_value(&self, node: &mut Element, value: &Value) {
        match value {
            Value::Null => {}
            Value::List(_) | Value::Map(_) => self.write_entries(node, value),
            Value::Xml(e) => {
                node.import(e);
            }
            leaf => write_leaf(node, leaf),
        }
    }

    fn write_entries(&self, node: &mut Element, data: &Value) {
        let is_list = data.looks_like_list();
        let mut has_attributes = false;
        for (key, value) in data.entries() {
            let key: &str = &key;
            if value.is_empty_aggregate() {
                trace!("skipping empty {:?} in <{}>", key, node.name);
                continue;
            }
            if key.strip_prefix('@').map_or(false, is_valid_node_name) {
                write_attributes(node, key, value);
                has_attributes = true;
                continue;
            }
            if value.is_scalar() && is_valid_node_name(key) && self.is_mapped_attribute(&node.name, key) {
                node.set_attribute(key, value.to_string());
                has_attributes = true;
                continue;
            }

            let mut value = self.value_last(value);
            let mut name = Some(key);
            if is_index_key(key) || !is_valid_node_name(key) {
                name = self.options.index_key.as_deref();
                if is_index_key(key) && !is_list {
                    value = Cow::Owned(self.indexed(key, value.into_owned()));
                }
            }
            let name = match name {
                Some(n) => n,
                None => {
                    unsupported(format!("{:?} in <{}> has no element name", key, node.name));
                    continue;
                }
            };

            if value.looks_like_list() {
                self.append_list(node, name, &value);
            } else if let Value::Xml(e) = &*value {
                node.append_child(Element::new(name)).import(e);
            } else if is_valid_node_name(name) {
                self.append_node(node, name, &value, has_attributes);
            } else {
                unsupported(format!("{:?} in <{}> is not a valid element name", name, node.name));
            }
        }
    }

    fn is_mapped_attribute(&self, element: &QName, key: &str) -> bool {
        let element = element.to_string();
        [element.as_str(), "*"].iter().any(|e| {
            self.options
                .attribute_map
                .get(*e)
                .map_or(false, |keys| keys.iter().any(|k| k == key))
        })
    }

    /// Moves the value key of a map to its end, so that attributes are set
    /// before the element's own text is written.
    fn value_last<'v>(&self, value: &'v Value) -> Cow<'v, Value> {
        let (vk, m) = match (&self.options.value_key, value) {
            (Some(vk), Value::Map(m)) if m.contains_key(vk) => (vk, m),
            _ => return Cow::Borrowed(value),
        };
        let mut m = m.clone();
        if let Some((k, v)) = m.shift_remove_entry(vk) {
            m.insert(k, v);
        }
        Cow::Owned(Value::Map(m))
    }

    /// Wraps a member of a sparse integer-keyed map so its key survives as
    /// the index attribute.
    fn indexed(&self, key: &str, value: Value) -> Value {
        let attribute = self.options.index_attribute_key.as_deref().unwrap_or("index");
        let index = key.parse::<i64>().map_or_else(|_| Value::from(key), Value::Int);
        let mut attributes = Map::new();
        attributes.insert(attribute.to_owned(), index);
        let mut wrapped = Map::new();
        wrapped.insert("@attributes".to_owned(), Value::Map(attributes));
        wrapped.insert(
            self.options.value_key.clone().unwrap_or_else(|| "value".to_owned()),
            value,
        );
        Value::Map(wrapped)
    }

    fn singular(&self, key: &str) -> String {
        match &self.options.inflector {
            Some(i) => i(key),
            None => key.to_owned(),
        }
    }

    fn append_list(&self, node: &mut Element, key: &str, list: &Value) {
        let singular = self.singular(key);
        if singular != key && is_valid_node_name(&singular) {
            let container = node.append_child(Element::new(key));
            for (_, item) in list.entries() {
                self.append_node(container, &singular, item, false);
            }
        } else if self.options.index_key.is_some() {
            let container = node.append_child(Element::new(key));
            self.write_entries(container, list);
        } else {
            for (_, item) in list.entries() {
                self.append_node(node, &singular, item, false);
            }
        }
    }

    fn append_node(&self, node: &mut Element, name: &str, value: &Value, has_attributes: bool) {
        if has_attributes && self.options.value_key.as_deref() == Some(name) {
            self.write_value(node, value);
            return;
        }
        trace!("encoding <{}> in <{}>", name, node.name);
        let child = node.append_child(Element::new(name));
        self.write_value(child, value);
    }
}

fn root_element(name: &str) -> Result<Element, Error> {
    if !is_valid_node_name(name) {
        return Err(Error::invalid_node_name(name));
    }
    Ok(Element::new(QName::new(name)))
}

fn unsupported(what: String) {
    debug!("omitting: {}", Error::unsupported(what));
}

/// Sets each scalar entry of an `@name` map as an attribute of `node`.
fn write_attributes(node: &mut Element, key: &str, value: &Value) {
    let attributes = match value {
        Value::Map(m) => m,
        _ => {
            unsupported(format!("{} in <{}> must hold a map", key, node.name));
            return;
        }
    };
    for (name, v) in attributes {
        if v.is_scalar() && is_valid_node_name(name) {
            node.set_attribute(name.as_str(), v.to_string());
        } else {
            unsupported(format!("attribute {:?} of <{}>", name, node.name));
        }
    }
}

fn write_leaf(node: &mut Element, leaf: &Value) {
    let text = match leaf {
        Value::Text(t) => t,
        other => {
            node.append_text(other.to_string());
            return;
        }
    };
    if !matches!(coerce_scalar(text, Value::Null), Value::Text(_) | Value::Null) {
        // Would decode as a number or boolean.
        node.set_attribute("type", "string");
        node.append_text(text.as_str());
    } else if text.contains(|c| matches!(c, '<' | '>' | '&')) {
        node.append_cdata(text.as_str());
    } else {
        node.append_text(text.as_str());
    }
}
