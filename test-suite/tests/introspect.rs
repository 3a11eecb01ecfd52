// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derived `Introspect` impls, normalized and encoded.

use std::cell::RefCell;
use std::rc::Rc;

use dyn_xml::{Encoder, Loader, Normalizer, ToProperty, Value};
use dyn_xml_derive::Introspect;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn map<const N: usize>(entries: [(&str, Value); N]) -> Value {
    entries.into_iter().collect()
}

#[derive(Introspect)]
#[dyn_xml(getter = "get_display_name", getter = "is_adult")]
struct Person {
    name: String,
    age: u32,
    #[dyn_xml(rename = "emailAddress")]
    email: Option<String>,
    #[dyn_xml(skip)]
    #[allow(dead_code)]
    password: String,
    tags: Vec<String>,
    friends: RefCell<Vec<Rc<Person>>>,
    on_change: Box<dyn Fn()>,
}

impl Person {
    fn new(name: &str, age: u32, email: Option<&str>, tags: &[&str]) -> Rc<Self> {
        Rc::new(Person {
            name: name.to_owned(),
            age,
            email: email.map(str::to_owned),
            password: "hunter2".to_owned(),
            tags: tags.iter().map(|&t| t.to_owned()).collect(),
            friends: RefCell::new(Vec::new()),
            on_change: Box::new(|| {}),
        })
    }

    fn get_display_name(&self) -> String {
        format!("{} ({})", self.name, self.age)
    }

    fn is_adult(&self) -> bool {
        self.age >= 18
    }
}

#[test]
fn cyclic_friends() {
    init();
    let alice = Person::new("Alice", 30, Some("a@example.com"), &["admin"]);
    let bob = Person::new("Bob", 17, None, &[]);
    alice.friends.borrow_mut().push(bob.clone());
    bob.friends.borrow_mut().push(alice.clone());
    (alice.on_change)();

    let v = Normalizer::new().normalize_object(&*alice).unwrap();
    let bob_value = map([
        ("display-name", "Bob (17)".into()),
        ("adult", false.into()),
        ("name", "Bob".into()),
        ("age", 17.into()),
        ("email-address", Value::Null),
        ("tags", Value::List(vec![])),
        ("friends", Value::List(vec![])),
    ]);
    assert_eq!(
        v,
        map([
            ("display-name", "Alice (30)".into()),
            ("adult", true.into()),
            ("name", "Alice".into()),
            ("age", 30.into()),
            ("email-address", "a@example.com".into()),
            ("tags", Value::from(vec!["admin"])),
            ("friends", Value::List(vec![bob_value])),
        ])
    );

    let doc = Encoder::default().encode_object(&*alice, "person").unwrap();
    let expected = Loader::default()
        .load_str(
            "<person>\
               <display-name>Alice (30)</display-name>\
               <adult>true</adult>\
               <name>Alice</name>\
               <age>30</age>\
               <email-address>a@example.com</email-address>\
               <tags><item>admin</item></tags>\
               <friends><item>\
                 <display-name>Bob (17)</display-name>\
                 <adult>false</adult>\
                 <name>Bob</name>\
                 <age>17</age>\
                 <email-address/>\
               </item></friends>\
             </person>",
        )
        .unwrap();
    assert_eq!(doc.root, expected.root, "{}", doc.to_xml_string().unwrap());

    // Break the cycle so both are freed.
    alice.friends.borrow_mut().clear();
}

#[test]
fn repeated_reference_is_emitted_once() {
    init();
    let carol = Person::new("Carol", 40, None, &[]);
    let dave = Person::new("Dave", 41, None, &[]);
    dave.friends.borrow_mut().push(carol.clone());
    dave.friends.borrow_mut().push(carol.clone());
    let v = Normalizer::new().normalize(&dave.to_property()).unwrap();
    assert_eq!(v.get("friends").and_then(Value::as_list).map(<[Value]>::len), Some(1));
}

#[derive(Default, Introspect)]
struct Cache {
    entries: Vec<String>,
}

#[derive(Default, Introspect)]
#[dyn_xml(parent = "Cache")]
struct LruCache {
    capacity: usize,
}

#[derive(Introspect)]
#[dyn_xml(to_value = "Money::as_value")]
struct Money {
    cents: i64,
}

impl Money {
    fn as_value(&self) -> Value {
        map([
            ("amount", (self.cents as f64 / 100.0).into()),
            ("currencyCode", "EUR".into()),
        ])
    }
}

#[derive(Introspect)]
#[dyn_xml(getter = "get_price")]
struct Service {
    name: String,
    cache: LruCache,
    backup: Cache,
}

impl Service {
    fn get_price(&self) -> Money {
        Money { cents: 1250 }
    }
}

#[test]
fn ignored_types_and_to_value() {
    init();
    let service = Service {
        name: "db".to_owned(),
        cache: LruCache { capacity: 8 },
        backup: Cache {
            entries: vec!["k".to_owned()],
        },
    };

    let all = Normalizer::new().normalize_object(&service).unwrap();
    assert_eq!(
        all,
        map([
            ("price", map([("amount", 12.5.into()), ("currency-code", "EUR".into())])),
            ("name", "db".into()),
            ("cache", map([("capacity", 8.into())])),
            ("backup", map([("entries", Value::from(vec!["k"]))])),
        ])
    );

    // LruCache names Cache as its parent, so ignoring Cache drops both.
    let v = Normalizer::new()
        .ignore_type::<Cache>()
        .normalize_object(&service)
        .unwrap();
    assert_eq!(v.get("cache"), None);
    assert_eq!(v.get("backup"), None);
    assert_eq!(v.get("name"), Some(&Value::from("db")));

    let v = Normalizer::new()
        .ignore_type::<LruCache>()
        .normalize_object(&service)
        .unwrap();
    assert!(v.get("cache").is_some());

    let v = Normalizer::new()
        .ignore_attribute("price")
        .normalize_object(&service)
        .unwrap();
    assert_eq!(v.get("price"), None);
}

#[derive(Introspect)]
struct Marker;

#[test]
fn unit_struct() {
    init();
    assert_eq!(
        Normalizer::new().normalize_object(&Marker),
        Some(Value::Map(Default::default()))
    );
    let doc = Encoder::default().encode_object(&Marker, "marker").unwrap();
    assert_eq!(doc.root().map(|r| r.children.len()), Some(0));
}
