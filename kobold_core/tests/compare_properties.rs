use kobold_common::{HashMode, OptionsOverride, Value};
use kobold_core::{compare, Decoder, Diff, Expected, Outcome};
use serde_json::json;

fn none() -> OptionsOverride {
    OptionsOverride::none()
}

fn sides(outcome: Outcome) -> (serde_json::Value, serde_json::Value) {
    let diff = outcome.into_diff().expect("expected a mismatch");
    (diff.expected.to_json(), diff.actual.to_json())
}

fn thing(attrs: &[(&str, i64)]) -> Value {
    Value::object("ObjectThing", attrs.iter().map(|(k, v)| (*k, Value::Int(*v))))
}

#[test]
fn test_reflexive_for_plain_values() {
    let samples = [
        json!(null),
        json!(true),
        json!(3.5),
        json!("text"),
        json!({}),
        json!([]),
        json!({"a": [1, {"b": null}], "c": "d"}),
        json!([[1, 2], {"x": [true, false]}]),
    ];
    for sample in samples {
        let outcome = compare(&Expected::from(sample.clone()), &Value::from(sample.clone()), &none()).unwrap();
        assert!(outcome.is_match(), "{} did not match itself", sample);
    }

    let tuple = Value::tuple([Value::Int(1), Value::set([Value::from("a")])]);
    assert!(compare(&Expected::from(tuple.clone()), &tuple, &none()).unwrap().is_match());
}

#[test]
fn test_distinct_keys() {
    let outcome = compare(&Expected::from(json!({"a": 1})), &Value::from(json!({"b": 2})), &none()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(
            Value::map([("a", Value::Int(1)), ("b", Value::Absent)]),
            Value::map([("a", Value::Absent), ("b", Value::Int(2))]),
        ))
    );
}

#[test]
fn test_distinct_keys_only_existing() {
    let outcome = compare(
        &Expected::from(json!({"a": 1})),
        &Value::from(json!({"b": 2})),
        &"existing".parse().unwrap(),
    )
    .unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(
            Value::map([("a", Value::Int(1))]),
            Value::map([("a", Value::Absent)]),
        ))
    );
}

#[test]
fn test_intersecting_keys() {
    let (exp, act) = sides(
        compare(
            &Expected::from(json!({"a": 1, "b": 2})),
            &Value::from(json!({"b": 2, "c": 3})),
            &none(),
        )
        .unwrap(),
    );
    assert_eq!(exp, json!({"a": 1, "c": "<absent>"}));
    assert_eq!(act, json!({"a": "<absent>", "c": 3}));
}

#[test]
fn test_same_keys_different_values() {
    let (exp, act) = sides(
        compare(
            &Expected::from(json!({"a": 1, "b": 2})),
            &Value::from(json!({"a": 2, "b": 1})),
            &none(),
        )
        .unwrap(),
    );
    assert_eq!(exp, json!({"a": 1, "b": 2}));
    assert_eq!(act, json!({"a": 2, "b": 1}));
}

#[test]
fn test_ordered_versus_unordered() {
    let expected = Expected::from(json!([1, 2]));
    let actual = Value::from(json!([2, 1]));
    let (exp, act) = sides(compare(&expected, &actual, &none()).unwrap());
    assert_eq!(exp, json!([1, 2]));
    assert_eq!(act, json!([2, 1]));

    let unordered = OptionsOverride::none().ordered(false);
    assert!(compare(&expected, &actual, &unordered).unwrap().is_match());
}

#[test]
fn test_positional_diff_collapsing() {
    let (exp, act) = sides(
        compare(&Expected::from(json!([1, 2, 3])), &Value::from(json!([1, 4, 3])), &none()).unwrap(),
    );
    assert_eq!(exp, json!(["_", 2, "_"]));
    assert_eq!(act, json!(["_", 4, "_"]));
}

#[test]
fn test_length_mismatch_pads_with_absent() {
    let (exp, act) = sides(
        compare(
            &Expected::from(json!([{"a": 1}, {"b": 2}])),
            &Value::from(json!([{"a": 1}])),
            &none(),
        )
        .unwrap(),
    );
    assert_eq!(exp, json!(["_", {"b": 2}]));
    assert_eq!(act, json!(["_", "<absent>"]));

    let (exp, act) = sides(
        compare(
            &Expected::from(json!([{"a": 1}])),
            &Value::from(json!([{"a": 1}, {"b": 2}])),
            &none(),
        )
        .unwrap(),
    );
    assert_eq!(exp, json!(["_", "<absent>"]));
    assert_eq!(act, json!(["_", {"b": 2}]));
}

#[test]
fn test_decode_then_compare() {
    let expected = Expected::decode(Decoder::Json, Expected::from(json!({"a": 1})));
    assert!(compare(&expected, &Value::from(r#"{"a" : 1}"#), &none()).unwrap().is_match());

    let (exp, act) = sides(compare(&expected, &Value::from(r#"{"a" : "1"}"#), &none()).unwrap());
    assert_eq!(exp, json!({"a": 1}));
    assert_eq!(act, json!({"a": "1"}));

    let list_hint = Expected::decode(Decoder::Json, Expected::from(json!([1, 2, 3])));
    assert!(compare(&list_hint, &Value::from("[1, 2, 3]"), &none()).unwrap().is_match());
}

#[test]
fn test_object_dict_hints() {
    let hint = Expected::decode(Decoder::ObjectDict, Expected::from(json!({"a": 1, "b": 2, "c": 3})));
    let actual = thing(&[("a", 1), ("b", 2), ("c", 3)]);
    assert!(compare(&hint, &actual, &none()).unwrap().is_match());

    let outcome = compare(&hint, &Value::Absent, &none()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(Value::from(json!({"a": 1, "b": 2, "c": 3})), Value::Absent))
    );

    let hint = Expected::decode(Decoder::ObjectDict, Expected::from(json!({"a": 1, "b": 2, "c": 4})));
    let (exp, act) = sides(compare(&hint, &actual, &none()).unwrap());
    assert_eq!(exp, json!({"c": 4}));
    assert_eq!(act, json!({"c": 3}));

    let list = Expected::list([Expected::decode(
        Decoder::ObjectDict,
        Expected::from(json!({"a": 1, "b": 2, "c": 3})),
    )]);
    let (exp, act) = sides(
        compare(&list, &Value::list([thing(&[("a", 1), ("b", 2), ("c", 4)])]), &none()).unwrap(),
    );
    assert_eq!(exp, json!([{"c": 3}]));
    assert_eq!(act, json!([{"c": 4}]));
}

#[test]
fn test_unordered_objects_render_remaining_pairs() {
    let expected = Expected::list(
        [1, 2, 3].map(|a| Expected::decode(Decoder::ObjectDict, Expected::from(json!({"a": a})))),
    );
    let actual = Value::list([4, 5, 6].map(|a| thing(&[("a", a)])));
    let options = OptionsOverride::none().hash(HashMode::Existing).ordered(false);
    let (exp, act) = sides(compare(&expected, &actual, &options).unwrap());
    assert_eq!(exp, json!([{"a": 1}, {"a": 2}, {"a": 3}]));
    assert_eq!(act, json!([{"a": 4}, {"a": 5}, {"a": 6}]));
}

#[test]
fn test_sets() {
    let set = |items: &[i64]| Value::set(items.iter().map(|i| Value::Int(*i)));
    let outcome = compare(&Expected::from(set(&[1, 2, 3])), &set(&[1, 3, 4]), &none()).unwrap();
    assert_eq!(outcome, Outcome::Mismatch(Diff::new(set(&[2]), set(&[4]))));

    let pair = |a, b| Value::tuple([Value::Int(a), Value::Int(b)]);
    let outcome = compare(
        &Expected::from(Value::set([pair(1, 2)])),
        &Value::set([pair(2, 3)]),
        &OptionsOverride::none().ordered(false),
    )
    .unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(Value::set([pair(1, 2)]), Value::set([pair(2, 3)])))
    );
}

#[test]
fn test_nested_tuples_and_lists() {
    let pairs = |items: [(i64, i64); 3]| {
        items.map(|(a, b)| Value::tuple([Value::Int(a), Value::Int(b)]))
    };

    let expected = Expected::from(Value::list(pairs([(1, 2), (3, 4), (5, 6)])));
    let actual = Value::list(pairs([(1, 2), (3, 5), (5, 6)]));
    let diff = compare(&expected, &actual, &none()).unwrap().into_diff().unwrap();
    assert_eq!(
        diff.expected,
        Value::list([
            Value::Placeholder,
            Value::tuple([Value::Placeholder, Value::Int(4)]),
            Value::Placeholder,
        ])
    );

    let expected = Expected::from(Value::tuple(pairs([(1, 2), (3, 4), (5, 6)])));
    let actual = Value::tuple(pairs([(1, 2), (3, 5), (5, 6)]));
    let diff = compare(&expected, &actual, &none()).unwrap().into_diff().unwrap();
    assert_eq!(
        diff.actual,
        Value::tuple([
            Value::Placeholder,
            Value::tuple([Value::Placeholder, Value::Int(5)]),
            Value::Placeholder,
        ])
    );
}

#[test]
fn test_null_versus_absent() {
    let (exp, act) = sides(
        compare(&Expected::from(json!({})), &Value::from(json!({"a": null})), &none()).unwrap(),
    );
    assert_eq!(exp, json!({"a": "<absent>"}));
    assert_eq!(act, json!({"a": null}));
}

#[test]
fn test_mapping_versus_list() {
    let outcome = compare(&Expected::from(json!({})), &Value::from(json!([])), &none()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(Value::Map(Default::default()), Value::List(vec![])))
    );

    let outcome = compare(&Expected::from(json!([])), &Value::from(json!({})), &none()).unwrap();
    assert_eq!(
        outcome,
        Outcome::Mismatch(Diff::new(Value::List(vec![]), Value::Map(Default::default())))
    );

    let (exp, act) = sides(compare(&Expected::from(json!({"a": 1})), &Value::from(json!([1])), &none()).unwrap());
    assert_eq!(exp, json!({"a": 1}));
    assert_eq!(act, json!([1]));
}
