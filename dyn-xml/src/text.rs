// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for interpreting text, shared by the decoder and encoder.

use crate::Value;

const XML_WHITESPACE: &[char] = &['\x09', '\x0A', '\x0D', '\x20'];

/// Converts leaf text into the scalar it most likely denotes.
///
/// Empty text yields `default`. Otherwise, in order: `0x` hex literals become
/// integers, numeric text becomes an integer (all digits) or float, `true` and
/// `false` (any case) become booleans, and anything else stays text.
///
/// Numbers and booleans are recognized after trimming XML whitespace, but
/// text that isn't converted is returned as-is.
pub fn coerce_scalar(text: &str, default: Value) -> Value {
    if text.is_empty() {
        return default;
    }
    let trimmed = text.trim_matches(XML_WHITESPACE);
    if let Some(hex) = trimmed.strip_prefix("0x") {
        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return match i64::from_str_radix(hex, 16) {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Float(hex_to_f64(hex)),
            };
        }
    }
    if is_numeric(trimmed) {
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Int(i);
            }
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(text.to_owned())
}

fn hex_to_f64(hex: &str) -> f64 {
    hex.chars()
        .filter_map(|c| c.to_digit(16))
        .fold(0.0, |acc, d| acc * 16.0 + f64::from(d))
}

/// Returns true if `text` is a decimal number: an optional sign, digits with
/// an optional fraction (or a bare fraction), and an optional exponent.
pub fn is_numeric(text: &str) -> bool {
    let b = text.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_digits = count_digits(&b[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if b.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = count_digits(&b[i..]);
        i += frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_digits = count_digits(&b[i..]);
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }
    i == b.len()
}

fn count_digits(b: &[u8]) -> usize {
    b.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Returns true if `name` can be used as an element (or attribute) name.
///
/// It must be non-empty, start with a letter or underscore, and continue with
/// letters, digits, `.`, `_`, or `-`.
pub fn is_valid_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
}

/// Returns true if `key` is the canonical spelling of an integer, as produced
/// by formatting an `i64`.
pub fn is_index_key(key: &str) -> bool {
    key.parse::<i64>().map_or(false, |i| i.to_string() == key)
}

/// Converts `fooBar` and `FooBar` to `foo_bar`; lowercases everything else.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// The decoder's default key normalizer: snake case, hyphens to underscores.
pub fn fix_node_name(name: &str) -> String {
    snake_case(name).replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion() {
        assert_eq!(coerce_scalar("", Value::Null), Value::Null);
        assert_eq!(coerce_scalar("10", Value::Null), Value::Int(10));
        assert_eq!(coerce_scalar("1.2", Value::Null), Value::Float(1.2));
        assert_eq!(coerce_scalar("-3", Value::Null), Value::Float(-3.0));
        assert_eq!(coerce_scalar("0xF00", Value::Null), Value::Int(3840));
        assert_eq!(coerce_scalar("0x", Value::Null), Value::Text("0x".into()));
        assert_eq!(coerce_scalar("TRUE", Value::Null), Value::Bool(true));
        assert_eq!(coerce_scalar("false", Value::Null), Value::Bool(false));
        assert_eq!(coerce_scalar(" 12 ", Value::Null), Value::Int(12));
        assert_eq!(coerce_scalar(" bar ", Value::Null), Value::Text(" bar ".into()));
        assert_eq!(coerce_scalar("inf", Value::Null), Value::Text("inf".into()));
        assert_eq!(
            coerce_scalar("99999999999999999999", Value::Null),
            Value::Float(1e20)
        );
    }

    #[test]
    fn numeric() {
        for n in ["1", "+1", "-1.5", ".5", "5.", "1e3", "2.5E-3"] {
            assert!(is_numeric(n), "{:?}", n);
        }
        for n in ["", ".", "-", "1e", "e3", "1.2.3", "0x1", "nan", "1 "] {
            assert!(!is_numeric(n), "{:?}", n);
        }
    }

    #[test]
    fn node_names() {
        assert!(is_valid_node_name("foo"));
        assert!(is_valid_node_name("_foo.bar-1"));
        assert!(is_valid_node_name("über"));
        assert!(!is_valid_node_name(""));
        assert!(!is_valid_node_name("1foo"));
        assert!(!is_valid_node_name("foo bar"));
        assert!(!is_valid_node_name("%%adssad"));
        assert!(!is_valid_node_name("@foo"));
    }

    #[test]
    fn index_keys() {
        assert!(is_index_key("0"));
        assert!(is_index_key("42"));
        assert!(is_index_key("-3"));
        assert!(!is_index_key("007"));
        assert!(!is_index_key("+3"));
        assert!(!is_index_key("a"));
    }

    #[test]
    fn node_name_fixing() {
        assert_eq!(snake_case("fooBar"), "foo_bar");
        assert_eq!(snake_case("FooBar"), "foo_bar");
        assert_eq!(fix_node_name("test-name"), "test_name");
        assert_eq!(fix_node_name("item"), "item");
    }
}
