//! decode(encode(v)) == v for the plain-data shapes TOON writes natively:
//! scalar fields, inline scalar arrays, tabular arrays of flat records and
//! nested records.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use toon_http::codec::ToonCodec;

/// Unquoted text that cannot be mistaken for a literal, number or header.
fn word() -> impl Strategy<Value = String> {
    "[A-Za-eg-mo-su-z_][A-Za-z0-9_ .]{0,10}[A-Za-z0-9_]"
}

fn key() -> impl Strategy<Value = String> {
    "[a-eg-mo-su-z_][a-z0-9_]{0,7}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6..1.0e6f64)
            .prop_filter("integral floats print as integers", |f| f.fract() != 0.0)
            .prop_map(|f| Value::Number(Number::from_f64(f).unwrap())),
        word().prop_map(Value::String),
        "[ -~]{0,5}[,:][ -~]{0,5}".prop_map(Value::String),
    ]
}

fn record(keys: Vec<String>) -> impl Strategy<Value = Value> {
    prop::collection::vec(scalar(), keys.len()).prop_map(move |values| {
        Value::Object(keys.iter().cloned().zip(values).collect::<Map<_, _>>())
    })
}

fn table() -> impl Strategy<Value = Value> {
    prop::collection::btree_set(key(), 1..4).prop_flat_map(|keys| {
        let keys: Vec<String> = keys.into_iter().collect();
        prop::collection::vec(record(keys), 1..5).prop_map(Value::Array)
    })
}

fn field() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        2 => prop::collection::vec(scalar(), 0..5).prop_map(Value::Array),
        1 => table(),
        1 => prop::collection::btree_set(key(), 1..4)
            .prop_flat_map(|keys| record(keys.into_iter().collect())),
    ]
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key(), field(), 1..5)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

proptest! {
    #[test]
    fn test_round_trip(doc in document()) {
        let codec = ToonCodec::new();
        let text = codec.encode_value(&doc).unwrap();
        let decoded = codec.decode(&text).unwrap();
        prop_assert_eq!(decoded, doc, "encoded as:\n{}", text);
    }

    #[test]
    fn test_typed_round_trip(ids in prop::collection::vec(any::<u32>(), 0..6), name in "[A-Z][A-Za-z ]{0,10}[a-z]") {
        let codec = ToonCodec::new();
        let input = serde_json::json!({ "ids": ids, "name": name });
        let decoded = codec.decode(&codec.encode(&input).unwrap()).unwrap();
        prop_assert_eq!(decoded, input);
    }
}
