// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The error type shared by loading, decoding, and encoding.

use std::sync::Arc;

use xml::common::TextPosition;

/// How serious a [`Diagnostic`] is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

/// A single problem reported while reading an XML document.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,

    /// The class of problem: `syntax`, `io`, `utf8`, or `unexpected-eof`.
    pub code: &'static str,
    pub message: String,
    pub position: TextPosition,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // xml-rs positions are zero-based.
        write!(
            f,
            "[{} {}] {} (line {}, column {})",
            self.severity,
            self.code,
            self.message,
            self.position.row + 1,
            self.position.column + 1
        )
    }
}

/// An error returned by this crate.
///
/// Decoding fails closed: any of these aborts the whole operation and no
/// partial value is returned. Encoding only fails on misconfiguration or
/// write errors; values it can't represent are dropped instead.
///
/// Cloning an `Error` is cheap.
#[derive(Clone, Debug)]
pub struct Error(Arc<ErrorInner>);

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The document failed to parse.
    MalformedInput(Vec<Diagnostic>),

    /// The document has no root element.
    EmptyDocument,

    /// A configured or supplied name isn't a valid element name.
    InvalidNodeName(String),

    /// The encoder met a value it has no rule for. Recovered internally by
    /// omitting the value; surfaced only in logs.
    UnsupportedValue(String),

    /// A custom inflection rule failed to compile.
    InvalidPattern(regex::Error),

    Io(std::io::Error),

    /// `xml-rs` refused to write an event.
    Write(String),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    pub(crate) fn new(kind: ErrorKind) -> Self {
        Error(Arc::new(ErrorInner { kind }))
    }

    pub(crate) fn invalid_node_name(name: &str) -> Self {
        Self::new(ErrorKind::InvalidNodeName(name.to_owned()))
    }

    pub(crate) fn unsupported(what: String) -> Self {
        Self::new(ErrorKind::UnsupportedValue(what))
    }

    /// Returns the parse diagnostics, if this is a [`ErrorKind::MalformedInput`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.0.kind {
            ErrorKind::MalformedInput(d) => d,
            _ => &[],
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }
}

impl From<xml::writer::Error> for Error {
    fn from(e: xml::writer::Error) -> Self {
        Error::new(ErrorKind::Write(e.to_string()))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.kind {
            ErrorKind::MalformedInput(diagnostics) => {
                f.write_str("malformed XML:")?;
                for d in diagnostics {
                    write!(f, "\n{}", d)?;
                }
                Ok(())
            }
            ErrorKind::EmptyDocument => f.write_str("document has no root element"),
            ErrorKind::InvalidNodeName(name) => write!(f, "{} is an invalid node name", name),
            ErrorKind::UnsupportedValue(what) => write!(f, "unsupported value: {}", what),
            ErrorKind::InvalidPattern(e) => write!(f, "invalid inflection pattern: {}", e),
            ErrorKind::Io(e) => e.fmt(f),
            ErrorKind::Write(msg) => msg.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0.kind {
            ErrorKind::InvalidPattern(e) => Some(e),
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_lists_every_diagnostic() {
        let e = Error::new(ErrorKind::MalformedInput(vec![
            Diagnostic {
                severity: Severity::Error,
                code: "syntax",
                message: "unexpected token".to_owned(),
                position: TextPosition { row: 0, column: 4 },
            },
            Diagnostic {
                severity: Severity::Warning,
                code: "io",
                message: "short read".to_owned(),
                position: TextPosition { row: 2, column: 0 },
            },
        ]));
        assert_eq!(
            e.to_string(),
            "malformed XML:\n\
             [ERROR syntax] unexpected token (line 1, column 5)\n\
             [WARNING io] short read (line 3, column 1)"
        );
        assert_eq!(e.diagnostics().len(), 2);
    }

    #[test]
    fn invalid_node_name_message() {
        let e = Error::invalid_node_name("%%adssad");
        assert_eq!(e.to_string(), "%%adssad is an invalid node name");
        assert!(e.diagnostics().is_empty());
    }
}
