// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of arbitrary Rust values into [`Value`]s the encoder accepts.
//!
//! Objects describe themselves through [`Introspect`], usually derived with
//! `#[derive(dyn_xml_derive::Introspect)]`. Their getters and fields are
//! exposed as [`Property`] views, which the [`Normalizer`] walks into a
//! [`Value`] tree with normalized keys.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::text::snake_case;
use crate::tree::Element;
use crate::value::{Map, Value};

/// An object the [`Normalizer`] can take apart.
///
/// Every method has a default, so an implementation only supplies what it
/// has. Entries from [`Introspect::accessors`] come first; a field with the
/// same normalized name replaces the accessor's value.
pub trait Introspect: Any {
    /// Values of zero-argument getters, keyed by name without the `get_`
    /// prefix.
    fn accessors(&self) -> Vec<(String, Property<'_>)> {
        Vec::new()
    }

    /// Values of public fields.
    fn fields(&self) -> Vec<(String, Property<'_>)> {
        Vec::new()
    }

    /// The object's own canonical representation. When this returns `Some`,
    /// it's used instead of accessors and fields.
    fn to_value(&self) -> Option<Value> {
        None
    }

    /// The named type this object stands in for when checking
    /// [`Normalizer::ignore_type`]. When `None`, the object's own type is
    /// checked.
    fn parent_type(&self) -> Option<TypeId> {
        None
    }

    #[doc(hidden)]
    fn concrete_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    #[doc(hidden)]
    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A view of a host value, as returned by [`Introspect`].
pub enum Property<'a> {
    Value(Value),
    Object(&'a dyn Introspect),

    /// A reference-counted object. Cycles through these are cut by the
    /// normalizer.
    Shared(Rc<dyn Introspect>),
    Seq(Vec<Property<'a>>),
    Map(Vec<(String, Property<'a>)>),

    /// A closure or function pointer; never serialized.
    Callable,
}

/// Borrows a field as a [`Property`].
pub trait ToProperty {
    fn to_property(&self) -> Property<'_>;
}

/// Converts a getter's return value into a [`Property`].
///
/// Owned values are converted directly; references go through
/// [`ToProperty`].
pub trait IntoProperty<'a> {
    fn into_property(self) -> Property<'a>;
}

impl<'a, T: ToProperty + ?Sized> IntoProperty<'a> for &'a T {
    fn into_property(self) -> Property<'a> {
        self.to_property()
    }
}

impl<'a> IntoProperty<'a> for Property<'a> {
    fn into_property(self) -> Property<'a> {
        self
    }
}

macro_rules! scalar_property {
    ( $($t:ty),* ) => {
        $(
            impl ToProperty for $t {
                fn to_property(&self) -> Property<'_> {
                    Property::Value(Value::from(*self))
                }
            }

            impl<'a> IntoProperty<'a> for $t {
                fn into_property(self) -> Property<'a> {
                    Property::Value(Value::from(self))
                }
            }
        )*
    };
}
scalar_property!(bool, i8, u8, i16, u16, i32, u32, i64, f32, f64);

macro_rules! wide_int_property {
    ( $($t:ty),* ) => {
        $(
            impl ToProperty for $t {
                fn to_property(&self) -> Property<'_> {
                    (*self).into_property()
                }
            }

            impl<'a> IntoProperty<'a> for $t {
                fn into_property(self) -> Property<'a> {
                    Property::Value(match i64::try_from(self) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Float(self as f64),
                    })
                }
            }
        )*
    };
}
wide_int_property!(u64, isize, usize);

impl ToProperty for str {
    fn to_property(&self) -> Property<'_> {
        Property::Value(Value::from(self))
    }
}

impl ToProperty for String {
    fn to_property(&self) -> Property<'_> {
        self.as_str().to_property()
    }
}

impl<'a> IntoProperty<'a> for String {
    fn into_property(self) -> Property<'a> {
        Property::Value(Value::Text(self))
    }
}

impl ToProperty for Value {
    fn to_property(&self) -> Property<'_> {
        Property::Value(self.clone())
    }
}

impl<'a> IntoProperty<'a> for Value {
    fn into_property(self) -> Property<'a> {
        Property::Value(self)
    }
}

impl ToProperty for Element {
    fn to_property(&self) -> Property<'_> {
        Property::Value(Value::Xml(Box::new(self.clone())))
    }
}

impl<'a> IntoProperty<'a> for Element {
    fn into_property(self) -> Property<'a> {
        Property::Value(Value::Xml(Box::new(self)))
    }
}

impl<T: ToProperty> ToProperty for Option<T> {
    fn to_property(&self) -> Property<'_> {
        match self {
            Some(v) => v.to_property(),
            None => Property::Value(Value::Null),
        }
    }
}

impl<'a, T: IntoProperty<'a>> IntoProperty<'a> for Option<T> {
    fn into_property(self) -> Property<'a> {
        match self {
            Some(v) => v.into_property(),
            None => Property::Value(Value::Null),
        }
    }
}

impl<T: ToProperty> ToProperty for [T] {
    fn to_property(&self) -> Property<'_> {
        Property::Seq(self.iter().map(ToProperty::to_property).collect())
    }
}

impl<T: ToProperty> ToProperty for Vec<T> {
    fn to_property(&self) -> Property<'_> {
        self.as_slice().to_property()
    }
}

impl<'a, T: IntoProperty<'a>> IntoProperty<'a> for Vec<T> {
    fn into_property(self) -> Property<'a> {
        Property::Seq(self.into_iter().map(IntoProperty::into_property).collect())
    }
}

fn map_property<'a, V: ToProperty + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> Property<'a> {
    Property::Map(entries.map(|(k, v)| (k.clone(), v.to_property())).collect())
}

impl<V: ToProperty, S: BuildHasher> ToProperty for HashMap<String, V, S> {
    fn to_property(&self) -> Property<'_> {
        map_property(self.iter())
    }
}

impl<V: ToProperty> ToProperty for BTreeMap<String, V> {
    fn to_property(&self) -> Property<'_> {
        map_property(self.iter())
    }
}

impl<V: ToProperty, S: BuildHasher> ToProperty for IndexMap<String, V, S> {
    fn to_property(&self) -> Property<'_> {
        map_property(self.iter())
    }
}

impl<T: Introspect> ToProperty for Rc<T> {
    fn to_property(&self) -> Property<'_> {
        let shared: Rc<dyn Introspect> = self.clone();
        Property::Shared(shared)
    }
}

impl<'a, T: Introspect> IntoProperty<'a> for Rc<T> {
    fn into_property(self) -> Property<'a> {
        let shared: Rc<dyn Introspect> = self;
        Property::Shared(shared)
    }
}

impl<T: Introspect> ToProperty for Weak<T> {
    fn to_property(&self) -> Property<'_> {
        match self.upgrade() {
            Some(rc) => rc.into_property(),
            None => Property::Value(Value::Null),
        }
    }
}

// Interior-mutable links are read through a shared borrow; one that's
// currently mutably borrowed reads as null.

impl<T: Introspect> ToProperty for RefCell<Option<Rc<T>>> {
    fn to_property(&self) -> Property<'_> {
        match self.try_borrow().ok().and_then(|b| b.as_ref().map(Rc::clone)) {
            Some(rc) => rc.into_property(),
            None => Property::Value(Value::Null),
        }
    }
}

impl<T: Introspect> ToProperty for RefCell<Weak<T>> {
    fn to_property(&self) -> Property<'_> {
        match self.try_borrow().ok().and_then(|weak| weak.upgrade()) {
            Some(rc) => rc.into_property(),
            None => Property::Value(Value::Null),
        }
    }
}

impl<T: Introspect> ToProperty for RefCell<Vec<Rc<T>>> {
    fn to_property(&self) -> Property<'_> {
        match self.try_borrow() {
            Ok(items) => Property::Seq(
                items
                    .iter()
                    .map(|rc| Rc::clone(rc).into_property())
                    .collect(),
            ),
            Err(_) => Property::Value(Value::Null),
        }
    }
}

impl ToProperty for Box<dyn Fn()> {
    fn to_property(&self) -> Property<'_> {
        Property::Callable
    }
}

impl ToProperty for Box<dyn Fn() + Send + Sync> {
    fn to_property(&self) -> Property<'_> {
        Property::Callable
    }
}

impl ToProperty for Arc<dyn Fn() + Send + Sync> {
    fn to_property(&self) -> Property<'_> {
        Property::Callable
    }
}

impl<R> ToProperty for fn() -> R {
    fn to_property(&self) -> Property<'_> {
        Property::Callable
    }
}

/// State of one normalization call.
#[derive(Default)]
struct Pass {
    /// `(address, type)` of every object entered so far.
    seen: HashSet<(usize, TypeId)>,

    /// Shared objects met so far, kept alive so their addresses aren't
    /// reused by later allocations within this pass.
    pinned: Vec<Rc<dyn Introspect>>,
}

/// Converts objects and aggregates into canonical [`Value`]s.
///
/// Keys are normalized with [`Normalizer::normalize_key`] and dropped when
/// ignored. Objects are visited at most once per call, which breaks
/// reference cycles; a shared object that's reachable twice is only emitted
/// where it's first met.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    ignored_attributes: HashSet<String>,
    ignored_types: HashSet<TypeId>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omits entries whose normalized key equals the normalized `key`.
    pub fn ignore_attribute(mut self, key: &str) -> Self {
        let key = self.normalize_key(key);
        self.ignored_attributes.insert(key);
        self
    }

    /// Replaces the set of ignored keys.
    pub fn set_ignored_attributes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| self.normalize_key(k.as_ref()))
            .collect();
        self.ignored_attributes = keys;
        self
    }

    /// Omits objects of type `T`, or objects whose
    /// [`Introspect::parent_type`] is `T`.
    pub fn ignore_type<T: Any>(mut self) -> Self {
        self.ignored_types.insert(TypeId::of::<T>());
        self
    }

    pub fn is_ignored_attribute(&self, normalized_key: &str) -> bool {
        self.ignored_attributes.contains(normalized_key)
    }

    /// Turns a host name into an XML-friendly key.
    ///
    /// Leading and trailing `_-#$%` are trimmed. Keys that are entirely
    /// uppercase are lowercased; others are converted from camel case to
    /// snake case. Runs of characters other than ASCII letters, digits, `(`,
    /// `)`, `^`, and `@` become a single `-`. So `fooBar`, `foo_bar`,
    /// `foo:bar`, and `foo.bar` all become `foo-bar`.
    pub fn normalize_key(&self, key: &str) -> String {
        let trimmed = key.trim_matches(|c| matches!(c, '_' | '-' | '#' | '$' | '%'));
        let cased = if is_all_uppercase(trimmed) {
            trimmed.to_lowercase()
        } else {
            snake_case(trimmed)
        };
        let mut out = String::with_capacity(cased.len());
        let mut in_run = false;
        for c in cased.chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '(' | ')' | '^' | '@') {
                out.push(c.to_ascii_lowercase());
                in_run = false;
            } else if !in_run {
                out.push('-');
                in_run = true;
            }
        }
        out
    }

    /// Normalizes any property. Returns `None` if there's nothing to emit:
    /// callables, ignored objects, and objects already visited.
    pub fn normalize(&self, property: &Property<'_>) -> Option<Value> {
        self.property(property, &mut Pass::default())
    }

    pub fn normalize_object(&self, object: &dyn Introspect) -> Option<Value> {
        self.object(object, &mut Pass::default())
    }

    /// Normalizes the keys of an already-canonical value, dropping ignored
    /// ones. XML subtrees pass through untouched.
    pub fn normalize_value(&self, value: &Value) -> Option<Value> {
        Some(self.value(value))
    }

    fn value(&self, value: &Value) -> Value {
        match value {
            Value::Map(m) => Value::Map(
                m.iter()
                    .filter_map(|(k, v)| {
                        let key = self.normalize_key(k);
                        if self.is_ignored_attribute(&key) {
                            trace!("dropping ignored key {:?}", k);
                            return None;
                        }
                        Some((key, self.value(v)))
                    })
                    .collect(),
            ),
            Value::List(l) => Value::List(l.iter().map(|v| self.value(v)).collect()),
            other => other.clone(),
        }
    }

    fn property(&self, property: &Property<'_>, pass: &mut Pass) -> Option<Value> {
        match property {
            Property::Value(v) => Some(self.value(v)),
            Property::Object(o) => self.object(*o, pass),
            Property::Shared(rc) => {
                pass.pinned.push(Rc::clone(rc));
                self.object(&**rc, pass)
            }
            Property::Seq(items) => Some(Value::List(
                items.iter().filter_map(|p| self.property(p, pass)).collect(),
            )),
            Property::Map(entries) => Some(Value::Map(self.entries(entries, pass))),
            Property::Callable => None,
        }
    }

    fn entries(&self, entries: &[(String, Property<'_>)], pass: &mut Pass) -> Map {
        let mut out = Map::new();
        for (name, property) in entries {
            if matches!(property, Property::Callable) {
                continue;
            }
            let key = self.normalize_key(name);
            if self.is_ignored_attribute(&key) {
                trace!("dropping ignored key {:?}", name);
                continue;
            }
            if let Some(v) = self.property(property, pass) {
                out.insert(key, v);
            }
        }
        out
    }

    fn object(&self, object: &dyn Introspect, pass: &mut Pass) -> Option<Value> {
        if let Some(v) = object.to_value() {
            return Some(self.value(&v));
        }
        let checked = object.parent_type().unwrap_or_else(|| object.concrete_type());
        if self.ignored_types.contains(&checked) {
            debug!("omitting object of ignored type {}", object.concrete_type_name());
            return None;
        }
        let address = object as *const _ as *const () as usize;
        if !pass.seen.insert((address, object.concrete_type())) {
            debug!(
                "omitting {} @ {:#x}, already visited",
                object.concrete_type_name(),
                address
            );
            return None;
        }
        let mut out = self.entries(&object.accessors(), pass);
        for (k, v) in self.entries(&object.fields(), pass) {
            out.insert(k, v);
        }
        Some(Value::Map(out))
    }
}

fn is_all_uppercase(s: &str) -> bool {
    let mut alnum = s.chars().filter(char::is_ascii_alphanumeric).peekable();
    alnum.peek().is_some() && alnum.all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    struct Person {
        name: String,
        nick_name: Option<String>,
        friend: RefCell<Option<Rc<Person>>>,
        on_save: Box<dyn Fn()>,
    }

    impl Person {
        fn new(name: &str) -> Rc<Self> {
            Rc::new(Person {
                name: name.to_owned(),
                nick_name: None,
                friend: RefCell::new(None),
                on_save: Box::new(|| {}),
            })
        }
    }

    impl Introspect for Person {
        fn accessors(&self) -> Vec<(String, Property<'_>)> {
            vec![("Greeting".to_owned(), format!("hi {}", self.name).into_property())]
        }

        fn fields(&self) -> Vec<(String, Property<'_>)> {
            vec![
                ("name".to_owned(), self.name.to_property()),
                ("nickName".to_owned(), self.nick_name.to_property()),
                ("friend".to_owned(), self.friend.to_property()),
                ("onSave".to_owned(), self.on_save.to_property()),
            ]
        }
    }

    #[derive(Default)]
    struct Cache {
        entries: Vec<String>,
    }

    impl Introspect for Cache {
        fn fields(&self) -> Vec<(String, Property<'_>)> {
            vec![("entries".to_owned(), self.entries.to_property())]
        }
    }

    struct LruCache(Cache);

    impl Introspect for LruCache {
        fn fields(&self) -> Vec<(String, Property<'_>)> {
            self.0.fields()
        }

        fn parent_type(&self) -> Option<TypeId> {
            Some(TypeId::of::<Cache>())
        }
    }

    struct Money {
        cents: i64,
    }

    impl Introspect for Money {
        fn to_value(&self) -> Option<Value> {
            Some(
                [
                    ("Amount", Value::from(self.cents as f64 / 100.0)),
                    ("currencyCode", Value::from("EUR")),
                ]
                .into_iter()
                .collect(),
            )
        }
    }

    struct TreeNode {
        name: String,
        parent: RefCell<Weak<TreeNode>>,
        children: RefCell<Vec<Rc<TreeNode>>>,
    }

    impl TreeNode {
        fn new(name: &str) -> Rc<Self> {
            Rc::new(TreeNode {
                name: name.to_owned(),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
            })
        }

        fn adopt(self: &Rc<Self>, child: Rc<TreeNode>) {
            *child.parent.borrow_mut() = Rc::downgrade(self);
            self.children.borrow_mut().push(child);
        }
    }

    impl Introspect for TreeNode {
        fn fields(&self) -> Vec<(String, Property<'_>)> {
            vec![
                ("name".to_owned(), self.name.to_property()),
                ("parent".to_owned(), self.parent.to_property()),
                ("children".to_owned(), self.children.to_property()),
            ]
        }
    }

    #[test]
    fn keys() {
        let n = Normalizer::new();
        for k in ["fooBar", "foo_bar", "foo:bar", "foo.bar", "FooBar", "foo  bar"] {
            assert_eq!(n.normalize_key(k), "foo-bar", "{:?}", k);
        }
        assert_eq!(n.normalize_key("_foo"), "foo");
        assert_eq!(n.normalize_key("%foo"), "foo");
        assert_eq!(n.normalize_key("#foo$"), "foo");
        assert_eq!(n.normalize_key("ID"), "id");
        assert_eq!(n.normalize_key("FOO_BAR"), "foo-bar");
        assert_eq!(n.normalize_key("@attributes"), "@attributes");
        assert_eq!(n.normalize_key("f(x)^2"), "f(x)^2");
        assert_eq!(n.normalize_key("0"), "0");
    }

    #[test]
    fn object_graph_with_cycle() {
        init();
        let a = Person::new("a");
        let b = Person::new("b");
        *a.friend.borrow_mut() = Some(b.clone());
        *b.friend.borrow_mut() = Some(a.clone());

        let v = Normalizer::new().normalize(&a.to_property()).unwrap();
        let expected: Value = [
            ("greeting", Value::from("hi a")),
            ("name", Value::from("a")),
            ("nick-name", Value::Null),
            (
                "friend",
                [
                    ("greeting", Value::from("hi b")),
                    ("name", Value::from("b")),
                    ("nick-name", Value::Null),
                ]
                .into_iter()
                .collect(),
            ),
        ]
        .into_iter()
        .collect();
        assert_eq!(v, expected);

        // Each call starts with a fresh visited set.
        let again = Normalizer::new().normalize_object(&*a).unwrap();
        assert_eq!(again.get("friend").and_then(|f| f.get("name")), Some(&Value::from("b")));

        a.friend.borrow_mut().take();
    }

    #[test]
    fn shared_reference_emitted_once() {
        init();
        let shared = Person::new("s");
        let list = vec![shared.clone(), shared.clone()];
        let v = Normalizer::new().normalize(&list.to_property()).unwrap();
        assert_eq!(v.as_list().map(|l| l.len()), Some(1));
    }

    #[test]
    fn ignored_attributes_and_callables() {
        init();
        let p = Person::new("x");
        let n = Normalizer::new().ignore_attribute("nickName");
        let v = n.normalize_object(&*p).unwrap();
        let keys: Vec<&str> = v.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["greeting", "name", "friend"]);

        let n = Normalizer::new().set_ignored_attributes(["greeting", "friend", "name"]);
        let v = n.normalize_object(&*p).unwrap();
        let keys: Vec<&str> = v.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["nick-name"]);
    }

    #[test]
    fn ignored_types() {
        init();
        let n = Normalizer::new().ignore_type::<Cache>();
        assert_eq!(n.normalize_object(&Cache::default()), None);
        assert_eq!(n.normalize_object(&LruCache(Cache::default())), None);

        let cache = Cache::default();
        let items = vec![Property::Value(Value::from(1)), Property::Object(&cache)];
        assert_eq!(
            n.normalize(&Property::Seq(items)),
            Some(Value::List(vec![Value::from(1)]))
        );

        let v = Normalizer::new().normalize_object(&LruCache(Cache {
            entries: vec!["k".to_owned()],
        }));
        assert_eq!(
            v,
            Some([("entries", Value::from(vec!["k"]))].into_iter().collect())
        );
    }

    #[test]
    fn to_value_is_normalized() {
        init();
        let v = Normalizer::new().normalize_object(&Money { cents: 1250 }).unwrap();
        assert_eq!(
            v,
            [("amount", Value::from(12.5)), ("currency-code", Value::from("EUR"))]
                .into_iter()
                .collect()
        );
    }

    #[test]
    fn aggregates() {
        init();
        let mut m = BTreeMap::new();
        m.insert("someKey".to_owned(), vec![1u64, u64::MAX]);
        let v = Normalizer::new().normalize(&m.to_property()).unwrap();
        assert_eq!(
            v,
            [(
                "some-key",
                Value::List(vec![Value::Int(1), Value::Float(u64::MAX as f64)])
            )]
            .into_iter()
            .collect()
        );

        let f: fn() -> i32 = || 1;
        assert_eq!(Normalizer::new().normalize(&f.to_property()), None);

        let e = Element::new("bar");
        assert_eq!(
            Normalizer::new().normalize(&e.to_property()),
            Some(Value::Xml(Box::new(Element::new("bar"))))
        );
    }

    #[test]
    fn canonical_values() {
        let v: Value = [
            ("fooBar", Value::from(1)),
            ("secret", Value::from("x")),
            ("list", Value::from(vec![[("innerKey", true)].into_iter().collect::<Value>()])),
        ]
        .into_iter()
        .collect();
        let n = Normalizer::new().ignore_attribute("secret");
        let expected: Value = [
            ("foo-bar", Value::from(1)),
            (
                "list",
                Value::from(vec![[("inner-key", true)].into_iter().collect::<Value>()]),
            ),
        ]
        .into_iter()
        .collect();
        assert_eq!(n.normalize_value(&v), Some(expected));
    }

    #[test]
    fn dropped_weak_is_null() {
        init();
        let weak = Rc::downgrade(&Person::new("gone"));
        assert_eq!(Normalizer::new().normalize(&weak.to_property()), Some(Value::Null));

        let alive = Person::new("here");
        let weak = Rc::downgrade(&alive);
        let v = Normalizer::new().normalize(&weak.to_property()).unwrap();
        assert_eq!(v.get("name"), Some(&Value::from("here")));
    }

    #[test]
    fn back_pointers() {
        init();
        let root = TreeNode::new("root");
        root.adopt(TreeNode::new("leaf"));
        let leaf = Rc::clone(&root.children.borrow()[0]);

        let v = Normalizer::new().normalize_object(&*root).unwrap();
        let leaf_value: Value = [("name", Value::from("leaf")), ("children", Value::List(vec![]))]
            .into_iter()
            .collect();
        let expected: Value = [
            ("name", Value::from("root")),
            ("parent", Value::Null),
            ("children", Value::List(vec![leaf_value])),
        ]
        .into_iter()
        .collect();
        assert_eq!(v, expected);

        let v = Normalizer::new().normalize_object(&*leaf).unwrap();
        let parent = v.get("parent").unwrap();
        assert_eq!(parent.get("name"), Some(&Value::from("root")));
        assert_eq!(parent.get("children"), Some(&Value::List(vec![])));
    }

    #[test]
    fn mutably_borrowed_links_are_null() {
        init();
        let a = Person::new("a");
        *a.friend.borrow_mut() = Some(Person::new("b"));
        {
            let _guard = a.friend.borrow_mut();
            let v = Normalizer::new().normalize_object(&*a).unwrap();
            assert_eq!(v.get("friend"), Some(&Value::Null));
        }

        let root = TreeNode::new("root");
        let leaf = TreeNode::new("leaf");
        root.adopt(Rc::clone(&leaf));
        let guard = leaf.parent.borrow_mut();
        let v = Normalizer::new().normalize_object(&*leaf).unwrap();
        assert_eq!(v.get("parent"), Some(&Value::Null));
        drop(guard);
        let _children = root.children.borrow_mut();
        let v = Normalizer::new().normalize_object(&*root).unwrap();
        assert_eq!(v.get("children"), Some(&Value::Null));
    }
}
