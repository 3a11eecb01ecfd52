// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Singular/plural guessing for XML node names.
//!
//! This is only good enough to decide whether `<items>` holds `<item>`s; it
//! isn't meant for inflecting English in general.

use std::collections::HashMap;
use std::sync::Mutex;

use regex::{Regex, RegexBuilder};

use crate::{Error, ErrorKind};

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    replacement: String,
}

impl Rule {
    fn new(pattern: &str, replacement: &str) -> Result<Self, Error> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::new(ErrorKind::InvalidPattern(e)))?;
        Ok(Rule {
            pattern,
            replacement: replacement.to_owned(),
        })
    }
}

const PLURALS: &[(&str, &str)] = &[
    (r"(\w+[^y])y$", "${1}ies"),
    (r"(\w+(as|ox))$", "${1}es"),
];

const SINGULARS: &[(&str, &str)] = &[
    (r"(\w+[^ies])ies$", "${1}y"),
    (r"(\w+(ox|as))(es)$", "${1}"),
];

/// Pattern-based pluralization with per-word memoization.
///
/// Rules are tried in order and the first match wins; custom rules come
/// before the built-in ones. With `truncate` set, a word no rule matches
/// gets an `s` appended (pluralize) or a trailing `s` removed (singularize);
/// otherwise it's returned unchanged.
///
/// The caches only grow and are guarded by mutexes, so a single inflector
/// can be shared between threads.
pub struct SimpleInflector {
    truncate: bool,
    plurals: Vec<Rule>,
    singulars: Vec<Rule>,
    plural_cache: Mutex<HashMap<String, String>>,
    singular_cache: Mutex<HashMap<String, String>>,
}

impl std::fmt::Debug for SimpleInflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleInflector")
            .field("truncate", &self.truncate)
            .field("plurals", &self.plurals.len())
            .field("singulars", &self.singulars.len())
            .finish()
    }
}

impl Default for SimpleInflector {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SimpleInflector {
    pub fn new(truncate: bool) -> Self {
        // The built-in patterns are known to compile.
        Self::builder()
            .truncate(truncate)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    pub fn builder() -> SimpleInflectorBuilder {
        SimpleInflectorBuilder::default()
    }

    pub fn pluralize(&self, word: &str) -> String {
        self.inflect(word, &self.plurals, &self.plural_cache, append_s)
    }

    pub fn singularize(&self, word: &str) -> String {
        self.inflect(word, &self.singulars, &self.singular_cache, strip_s)
    }

    fn inflect(
        &self,
        word: &str,
        rules: &[Rule],
        cache: &Mutex<HashMap<String, String>>,
        fallback: fn(&str) -> String,
    ) -> String {
        if word.is_empty() {
            return String::new();
        }
        // A poisoned cache still holds valid entries.
        let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = cache.get(word) {
            return hit.clone();
        }
        let out = rules
            .iter()
            .find(|r| r.pattern.is_match(word))
            .map(|r| r.pattern.replace(word, r.replacement.as_str()).into_owned())
            .unwrap_or_else(|| {
                if self.truncate {
                    fallback(word)
                } else {
                    word.to_owned()
                }
            });
        cache.insert(word.to_owned(), out.clone());
        out
    }
}

fn append_s(word: &str) -> String {
    if word.ends_with('s') {
        word.to_owned()
    } else {
        format!("{}s", word)
    }
}

fn strip_s(word: &str) -> String {
    word.strip_suffix('s').unwrap_or(word).to_owned()
}

/// Builds a [`SimpleInflector`] with extra rules.
#[derive(Debug, Default)]
pub struct SimpleInflectorBuilder {
    truncate: bool,
    plurals: Vec<Rule>,
    singulars: Vec<Rule>,
}

impl SimpleInflectorBuilder {
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Adds a pluralization rule: a case-insensitive regex and a replacement
    /// in [`regex::Regex::replace`] syntax (`${1}es`).
    pub fn plural_rule(mut self, pattern: &str, replacement: &str) -> Result<Self, Error> {
        self.plurals.push(Rule::new(pattern, replacement)?);
        Ok(self)
    }

    /// Adds a singularization rule; see [`Self::plural_rule`].
    pub fn singular_rule(mut self, pattern: &str, replacement: &str) -> Result<Self, Error> {
        self.singulars.push(Rule::new(pattern, replacement)?);
        Ok(self)
    }

    pub fn build(mut self) -> Result<SimpleInflector, Error> {
        for (p, r) in PLURALS {
            self.plurals.push(Rule::new(p, r)?);
        }
        for (p, r) in SINGULARS {
            self.singulars.push(Rule::new(p, r)?);
        }
        Ok(SimpleInflector {
            truncate: self.truncate,
            plurals: self.plurals,
            singulars: self.singulars,
            plural_cache: Mutex::new(HashMap::new()),
            singular_cache: Mutex::new(HashMap::new()),
        })
    }
}
