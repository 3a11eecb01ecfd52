// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads XML text into a [`Document`].
//!
//! `xml-rs` never fetches external entities or DTDs, so loading untrusted
//! input can't cause local or remote file inclusion.

use std::path::Path;

use log::debug;
use xml::{
    common::{Position, TextPosition},
    reader::{ParserConfig, XmlEvent},
};

use crate::error::{Diagnostic, Severity};
use crate::tree::{Attribute, Document, Element, Node, QName};
use crate::{Error, ErrorKind};

/// A single element in the XML stack, kept for diagnostics.
#[derive(Clone, Debug)]
struct StackElement {
    name: xml::name::OwnedName,
    pos: TextPosition,
}

/// Options for [`Loader`].
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// The encoding recorded on documents whose declaration doesn't name one.
    pub encoding: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_owned(),
        }
    }
}

/// Where to load a document from.
pub enum Source<'a> {
    /// The XML text itself.
    String(&'a str),
    Path(&'a Path),
    Reader(Box<dyn std::io::Read + 'a>),
}

/// Loads XML documents.
#[derive(Clone, Debug, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Loads from `source`, with `options` in place of this loader's own for
    /// this call only.
    pub fn load(&self, source: Source<'_>, options: &LoadOptions) -> Result<Document, Error> {
        match source {
            Source::String(s) => read(s.as_bytes(), options),
            Source::Path(p) => read(std::fs::File::open(p)?, options),
            Source::Reader(r) => read(r, options),
        }
    }

    pub fn load_str(&self, xml: &str) -> Result<Document, Error> {
        read(xml.as_bytes(), &self.options)
    }

    pub fn load_reader<R: std::io::Read>(&self, source: R) -> Result<Document, Error> {
        read(source, &self.options)
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<Document, Error> {
        read(std::fs::File::open(path)?, &self.options)
    }
}

fn diagnostic(e: &xml::reader::Error) -> Diagnostic {
    let code = match e.kind() {
        xml::reader::ErrorKind::Syntax(_) => "syntax",
        xml::reader::ErrorKind::Io(_) => "io",
        xml::reader::ErrorKind::Utf8(_) => "utf8",
        xml::reader::ErrorKind::UnexpectedEof => "unexpected-eof",
    };
    Diagnostic {
        severity: Severity::Error,
        code,
        message: e.to_string(),
        position: e.position(),
    }
}

fn malformed(stack: &[StackElement], e: xml::reader::Error) -> Error {
    if let Some(top) = stack.last() {
        debug!(
            "XML error inside <{}> opened @ {} ({} deep): {}",
            top.name,
            top.pos,
            stack.len(),
            e
        );
    }
    Error::new(ErrorKind::MalformedInput(vec![diagnostic(&e)]))
}

/// Passes a source through, keeping its bytes up to the first `>` so the
/// XML declaration can be checked once the parser has read past it.
struct Prolog<R> {
    inner: R,
    head: Vec<u8>,
    done: bool,
}

impl<R: std::io::Read> Prolog<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            head: Vec::new(),
            done: false,
        }
    }

    /// Whether the document starts with a declaration naming its encoding.
    fn declares_encoding(&self) -> bool {
        let head = self.head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&self.head[..]);
        head.starts_with(b"<?xml") && head.windows(b"encoding".len()).any(|w| w == b"encoding")
    }
}

impl<R: std::io::Read> std::io::Read for Prolog<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if !self.done {
            let read = &buf[..n];
            let end = match read.iter().position(|&b| b == b'>') {
                Some(i) => {
                    self.done = true;
                    i + 1
                }
                None => n,
            };
            self.head.extend_from_slice(&read[..end]);
        }
        Ok(n)
    }
}

/// Reads a whole document, building the tree with an explicit stack of open
/// elements.
fn read<R: std::io::Read>(source: R, options: &LoadOptions) -> Result<Document, Error> {
    let mut reader = ParserConfig::new()
        .trim_whitespace(false)
        .whitespace_to_characters(true)
        .cdata_to_characters(false)
        .ignore_comments(true)
        .coalesce_characters(true)
        .create_reader(Prolog::new(source));
    let mut doc = Document::new();
    doc.encoding = options.encoding.clone();
    let mut stack: Vec<StackElement> = Vec::new();
    let mut open: Vec<Element> = Vec::new();

    // In-scope namespace mappings of each open element, to find the
    // declarations each element adds.
    let mut scopes: Vec<xml::namespace::Namespace> = Vec::new();
    loop {
        let pos = reader.position();
        match reader.next().map_err(|e| malformed(&stack, e))? {
            XmlEvent::StartDocument { encoding, .. } => {
                if reader.source().declares_encoding() {
                    doc.encoding = encoding;
                }
            }
            XmlEvent::EndDocument => break,
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let mut element = Element::new(QName {
                    prefix: name.prefix.clone(),
                    local: name.local_name.clone(),
                });
                for (prefix, uri) in &namespace {
                    if matches!(prefix, "xml" | "xmlns") || (prefix.is_empty() && uri.is_empty()) {
                        continue;
                    }
                    let inherited = scopes.last().and_then(|s| s.get(prefix));
                    if inherited != Some(uri) {
                        element.declare_namespace(prefix, uri);
                    }
                }
                element.attributes = attributes
                    .into_iter()
                    .map(|a| Attribute {
                        name: QName {
                            prefix: a.name.prefix,
                            local: a.name.local_name,
                        },
                        value: a.value,
                    })
                    .collect();
                stack.push(StackElement { name, pos });
                scopes.push(namespace);
                open.push(element);
            }
            XmlEvent::EndElement { .. } => {
                stack.pop();
                scopes.pop();
                let Some(element) = open.pop() else {
                    continue;
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => doc.root = Some(element),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                if let Some(e) = open.last_mut() {
                    e.children.push(Node::Text(text));
                }
            }
            XmlEvent::CData(text) => {
                if let Some(e) = open.last_mut() {
                    e.children.push(Node::CData(text));
                }
            }
            // Processing instructions, comments, and doctypes.
            _ => {}
        }
    }
    Ok(doc)
}
