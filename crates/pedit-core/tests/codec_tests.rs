use pedit_core::{decode, encode, ParameterRegistry, ParameterType, ParameterValue, Snapshot};
use proptest::prelude::*;
use serde_json::json;

fn reencode(value: &ParameterValue) -> ParameterValue {
    encode(&value.to_string(), value).unwrap()
}

#[test]
fn test_round_trip_boundaries_per_tag() {
    let cases = vec![
        (1, json!(true)),
        (1, json!(false)),
        (2, json!(0)),
        (2, json!(-42)),
        (3, json!(-0.5)),
        (3, json!(0.0)),
        (4, json!("")),
        (4, json!("hello world")),
        (5, json!([])),
        (5, json!([7])),
        (5, json!([0, 128, 255])),
        (6, json!([])),
        (6, json!([true])),
        (6, json!([true, false, true])),
        (7, json!([])),
        (7, json!([-1])),
        (7, json!([1, 0, -9])),
        (8, json!([])),
        (8, json!([2.5])),
        (8, json!([1.5, -2.0, 1e-3])),
        (9, json!([])),
        (9, json!(["one"])),
        (9, json!(["a", "b c", "d"])),
    ];

    for (tag, raw) in cases {
        let value = decode(tag, &raw).unwrap();
        assert_eq!(value.kind().tag(), tag);
        assert_eq!(reencode(&value), value, "tag {tag} raw {raw}");
    }
}

#[test]
fn test_array_text_with_whitespace_and_brackets() {
    let current = ParameterValue::IntegerArray(vec![]);
    assert_eq!(
        encode("  [  4 ,5,   6  ]  ", &current),
        Ok(ParameterValue::IntegerArray(vec![4, 5, 6]))
    );
    let current = ParameterValue::StringArray(vec![]);
    assert_eq!(
        encode("[ left , right ]", &current),
        Ok(ParameterValue::StringArray(vec!["left".into(), "right".into()]))
    );
}

#[test]
fn test_edit_never_changes_kind() {
    for kind in ParameterType::ALL {
        let current = match kind {
            ParameterType::Bool => ParameterValue::Bool(true),
            ParameterType::Integer => ParameterValue::Integer(1),
            ParameterType::Double => ParameterValue::Double(1.0),
            ParameterType::String => ParameterValue::String("1".into()),
            ParameterType::ByteArray => ParameterValue::ByteArray(vec![1]),
            ParameterType::BoolArray => ParameterValue::BoolArray(vec![true]),
            ParameterType::IntegerArray => ParameterValue::IntegerArray(vec![1]),
            ParameterType::DoubleArray => ParameterValue::DoubleArray(vec![1.0]),
            ParameterType::StringArray => ParameterValue::StringArray(vec!["1".into()]),
        };
        let text = if kind == ParameterType::Bool || kind == ParameterType::BoolArray {
            "on"
        } else {
            "1"
        };
        assert_eq!(encode(text, &current).unwrap().kind(), kind);
    }
}

proptest! {
    #[test]
    fn prop_integer_round_trip(n in any::<i64>()) {
        let value = decode(2, &json!(n)).unwrap();
        prop_assert_eq!(reencode(&value), ParameterValue::Integer(n));
    }

    #[test]
    fn prop_double_round_trip(x in -1.0e12f64..1.0e12) {
        let value = ParameterValue::Double(x);
        prop_assert_eq!(reencode(&value), value);
    }

    #[test]
    fn prop_string_passthrough(s in ".*") {
        let value = ParameterValue::String(s.clone());
        prop_assert_eq!(reencode(&value), ParameterValue::String(s));
    }

    #[test]
    fn prop_string_array_round_trip(items in proptest::collection::vec("[a-z0-9_]{1,8}", 0..6)) {
        let value = ParameterValue::StringArray(items);
        prop_assert_eq!(reencode(&value), value);
    }

    #[test]
    fn prop_parsed_descriptor_matches_source(
        node in "[a-z][a-z0-9_]{0,8}",
        param in "[a-z][a-z0-9_]{0,8}",
        n in any::<i64>(),
    ) {
        let snapshot = Snapshot::default().with(format!("{node}.{param}"), json!(n));
        let registry = ParameterRegistry::from_snapshot(&snapshot);
        let found = registry.find(&node, &param);
        prop_assert_eq!(found.map(|p| &p.value), Some(&ParameterValue::Integer(n)));
    }
}
