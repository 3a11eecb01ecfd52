// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A small owned XML tree: what the decoder reads and the encoder builds.
//!
//! Parsing lives in [`crate::loader`]; this module handles construction,
//! navigation, and serialization via `xml-rs`.

use std::borrow::Cow;
use std::io::Write;

use log::trace;
use xml::writer::{EmitterConfig, XmlEvent};

use crate::Error;

/// A qualified name: optional namespace prefix and local name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    /// Splits `prefix:local`.
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((p, l)) if !p.is_empty() => Self {
                prefix: Some(p.to_owned()),
                local: l.to_owned(),
            },
            _ => Self::new(name),
        }
    }

    /// Returns true if this name, printed, equals `name`.
    pub fn matches(&self, name: &str) -> bool {
        match &self.prefix {
            None => self.local == name,
            Some(p) => {
                name.len() == p.len() + 1 + self.local.len()
                    && name.starts_with(p.as_str())
                    && name[p.len()..].starts_with(':')
                    && name.ends_with(self.local.as_str())
            }
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => f.write_str(&self.local),
        }
    }
}

impl From<&str> for QName {
    fn from(name: &str) -> Self {
        QName::parse(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

/// Selects which nodes [`Element::select`] walks, relative to a child position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    /// Element children of the context node; the position is ignored.
    Child,

    /// Element siblings after the child at the position.
    FollowingSibling,

    /// Element siblings before the child at the position, nearest first.
    PrecedingSibling,

    /// Attributes of the child at the position.
    Attribute,
}

/// What [`Element::select`] returns.
#[derive(Copy, Clone, Debug)]
pub enum Selected<'a> {
    Element(usize, &'a Element),
    Attribute(&'a Attribute),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: QName,

    /// Namespace declarations made on this element: `(prefix, uri)`, with an
    /// empty prefix for the default namespace.
    pub namespaces: Vec<(String, String)>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<QName>) -> Self {
        Self {
            name: name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute, replacing the value in place if it exists.
    pub fn set_attribute(&mut self, name: impl Into<QName>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(name))
            .map(|a| a.value.as_str())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let i = self.attributes.iter().position(|a| a.name.matches(name))?;
        Some(self.attributes.remove(i).value)
    }

    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.push((prefix.into(), uri.into()));
    }

    /// Appends `child`, returning a reference to it for further building.
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!(),
        }
    }

    /// Appends a text node. Empty text is dropped.
    pub fn append_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    pub fn append_cdata(&mut self, text: impl Into<String>) {
        self.children.push(Node::CData(text.into()));
    }

    /// Deep-copies `foreign` (and its subtree) into this element's children.
    pub fn import(&mut self, foreign: &Element) -> &mut Element {
        trace!("importing <{}> into <{}>", foreign.name, self.name);
        self.append_child(foreign.clone())
    }

    /// Iterates over element children, with their position among all children.
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children.iter().enumerate().filter_map(|(i, n)| match n {
            Node::Element(e) => Some((i, e)),
            _ => None,
        })
    }

    /// Returns the element's own text: its text and CDATA children,
    /// concatenated, skipping nodes that are only whitespace. Text inside
    /// child elements is excluded.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for n in &self.children {
            match n {
                Node::Text(t) | Node::CData(t) if !t.trim().is_empty() => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Walks `axis` relative to the child at `position`, keeping nodes named
    /// `name` (any name when `None`).
    pub fn select<'a>(
        &'a self,
        position: usize,
        axis: Axis,
        name: Option<&'a str>,
    ) -> Box<dyn Iterator<Item = Selected<'a>> + 'a> {
        let name_ok = move |n: &QName| name.map_or(true, |want| n.matches(want));
        match axis {
            Axis::Child => Box::new(
                self.child_elements()
                    .filter(move |(_, e)| name_ok(&e.name))
                    .map(|(i, e)| Selected::Element(i, e)),
            ),
            Axis::FollowingSibling => Box::new(
                self.child_elements()
                    .filter(move |(i, e)| *i > position && name_ok(&e.name))
                    .map(|(i, e)| Selected::Element(i, e)),
            ),
            Axis::PrecedingSibling => {
                let mut before: Vec<_> = self
                    .child_elements()
                    .filter(|(i, e)| *i < position && name_ok(&e.name))
                    .map(|(i, e)| Selected::Element(i, e))
                    .collect();
                before.reverse();
                Box::new(before.into_iter())
            }
            Axis::Attribute => match self.children.get(position) {
                Some(Node::Element(e)) => Box::new(
                    e.attributes
                        .iter()
                        .filter(move |a| name_ok(&a.name))
                        .map(Selected::Attribute),
                ),
                _ => Box::new(std::iter::empty()),
            },
        }
    }

    /// Counts the child at `position` plus its preceding and following
    /// element siblings with the same qualified name.
    pub fn equal_siblings(&self, position: usize) -> usize {
        let name = match self.children.get(position) {
            Some(Node::Element(e)) => e.name.to_string(),
            _ => return 0,
        };
        1 + self
            .select(position, Axis::FollowingSibling, Some(&name))
            .count()
            + self
                .select(position, Axis::PrecedingSibling, Some(&name))
                .count()
    }
}

/// Options for [`Document::write`].
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub indent: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The encoding named in the XML declaration.
    pub encoding: String,
    pub root: Option<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            encoding: "UTF-8".to_owned(),
            root: None,
        }
    }

    pub fn with_root(root: Element) -> Self {
        Self {
            encoding: "UTF-8".to_owned(),
            root: Some(root),
        }
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Writes the document, including the XML declaration.
    pub fn write<W: Write>(&self, sink: W, options: &WriteOptions) -> Result<(), Error> {
        let mut writer = EmitterConfig::new()
            .perform_indent(options.indent)
            .write_document_declaration(true)
            .create_writer(sink);
        writer.write(XmlEvent::StartDocument {
            version: xml::common::XmlVersion::Version10,
            encoding: Some(&self.encoding),
            standalone: None,
        })?;
        if let Some(root) = &self.root {
            write_element(&mut writer, root)?;
        }
        Ok(())
    }

    /// Returns the document as a string.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        self.write(&mut out, &WriteOptions::default())?;
        String::from_utf8(out).map_err(|e| Error::new(crate::ErrorKind::Write(e.to_string())))
    }
}

fn write_element<W: Write>(
    writer: &mut xml::writer::EventWriter<W>,
    element: &Element,
) -> Result<(), Error> {
    let name = element.name.to_string();
    let attr_names: Vec<String> = element.attributes.iter().map(|a| a.name.to_string()).collect();
    let mut start = XmlEvent::start_element(name.as_str());
    for (prefix, uri) in &element.namespaces {
        start = if prefix.is_empty() {
            start.default_ns(uri.as_str())
        } else {
            start.ns(prefix.as_str(), uri.as_str())
        };
    }
    for (a, n) in element.attributes.iter().zip(&attr_names) {
        start = start.attr(n.as_str(), &a.value);
    }
    writer.write(start)?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) if !t.is_empty() => writer.write(XmlEvent::characters(t))?,
            Node::Text(_) => {}
            Node::CData(t) => writer.write(XmlEvent::cdata(&cdata_safe(t)))?,
        }
    }
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

/// `]]>` can't appear inside a CDATA section.
fn cdata_safe(text: &str) -> Cow<'_, str> {
    if text.contains("]]>") {
        Cow::Owned(text.replace("]]>", "]]]]><![CDATA[>"))
    } else {
        Cow::Borrowed(text)
    }
}
