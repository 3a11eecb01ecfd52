// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dynamically-shaped value exchanged with XML.

use indexmap::IndexMap;

use crate::tree::Element;

/// Ordered map of a [`Value::Map`].
pub type Map = IndexMap<String, Value>;

/// A canonical structured value.
///
/// XML has no native list type, so a [`Value::Map`] whose keys are exactly
/// `"0"`, `"1"`, ... is treated as a list when encoding; see
/// [`Value::looks_like_list`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(Map),

    /// An already-built XML subtree, spliced into the output by the encoder.
    /// Never produced by decoding.
    Xml(Box<Element>),
}

impl Value {
    /// Returns true for `Bool`, `Int`, `Float`, and `Text`.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Text(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value should be written as a list.
    ///
    /// That's every `List`, and every `Map` whose keys are, in iteration
    /// order, exactly `"0"` through `"n-1"`. An empty `Map` qualifies.
    /// Both the encoder and decoder classify through this predicate, so a
    /// zero-based map with a gap (`"0"`, `"2"`) is a map in both directions.
    pub fn looks_like_list(&self) -> bool {
        match self {
            Value::List(_) => true,
            Value::Map(m) => keys_are_positions(m.keys().map(String::as_str)),
            _ => false,
        }
    }

    /// Looks up `key` in a map, or a stringified index in a list.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            Value::List(l) => key.parse::<usize>().ok().and_then(|i| l.get(i)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns true for empty lists and maps.
    pub(crate) fn is_empty_aggregate(&self) -> bool {
        match self {
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Iterates over `(key, value)` entries of a list or map. Lists are keyed
    /// by position.
    pub(crate) fn entries(&self) -> Vec<(std::borrow::Cow<'_, str>, &Value)> {
        match self {
            Value::List(l) => l
                .iter()
                .enumerate()
                .map(|(i, v)| (std::borrow::Cow::Owned(i.to_string()), v))
                .collect(),
            Value::Map(m) => m
                .iter()
                .map(|(k, v)| (std::borrow::Cow::Borrowed(k.as_str()), v))
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub(crate) fn keys_are_positions<'a>(keys: impl Iterator<Item = &'a str>) -> bool {
    keys.enumerate().all(|(i, k)| k == i.to_string())
}

/// Formats scalars as their leaf text: decimal numbers, `true`/`false`,
/// strings verbatim. `Null` and aggregates format as the empty string.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(i) => i.fmt(f),
            Value::Float(v) => v.fmt(f),
            Value::Text(s) => f.write_str(s),
            _ => Ok(()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! from_int {
    ( $($t:ty),* ) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}
from_int!(i8, u8, i16, u16, i32, u32, i64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Element> for Value {
    fn from(v: Element) -> Self {
        Value::Xml(Box::new(v))
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
