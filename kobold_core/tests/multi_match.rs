use kobold_common::{HashMode, OptionsOverride, Value};
use kobold_core::{Comparator, Expected};
use serde_json::json;

fn shapes() -> Value {
    Value::from(json!([
        {"color": "blue", "shape": "square"},
        {"color": "blue", "shape": "triangle"},
        {"color": "blue", "shape": "circle"}
    ]))
}

fn comparator(ordered: bool) -> Comparator {
    Comparator::new().with_options(
        &OptionsOverride::none()
            .hash(HashMode::Existing)
            .ordered(ordered),
    )
}

fn blue() -> Expected {
    Expected::multi(Expected::from(json!({"color": "blue"})))
}

#[test]
fn test_ordered_basic() {
    let expected = Expected::list([blue()]);
    assert!(comparator(true).compare(&expected, &shapes()).unwrap().is_match());
}

#[test]
fn test_ordered_normal_element_after_multi_match() {
    let expected = Expected::list([blue(), Expected::from(json!({"shape": "circle"}))]);
    assert!(comparator(true).compare(&expected, &shapes()).unwrap().is_match());
}

#[test]
fn test_ordered_two_multi_matches() {
    let expected = Expected::list([
        blue(),
        Expected::multi(Expected::from(json!({"shape": "circle"}))),
    ]);
    let (outcome, tally) = comparator(true).compare_tallied(&expected, &shapes()).unwrap();
    assert!(outcome.is_match());

    let Expected::Sequence { items, .. } = &expected else {
        panic!("expected a sequence");
    };
    let (Expected::Multi(first), Expected::Multi(second)) = (&items[0], &items[1]) else {
        panic!("expected two multi-match nodes");
    };
    assert_eq!(tally.count(first), 2);
    assert_eq!(tally.count(second), 1);
}

#[test]
fn test_unordered_basic() {
    let expected = Expected::list([blue()]);
    assert!(comparator(false).compare(&expected, &shapes()).unwrap().is_match());
}

#[test]
fn test_unordered_normal_element_and_multi_match() {
    let expected = Expected::list([blue(), Expected::from(json!({"shape": "circle"}))]);
    assert!(comparator(false).compare(&expected, &shapes()).unwrap().is_match());
}

#[test]
fn test_unordered_two_multi_matches() {
    let expected = Expected::list([
        blue(),
        Expected::multi(Expected::from(json!({"shape": "circle"}))),
    ]);
    let (outcome, tally) = comparator(false).compare_tallied(&expected, &shapes()).unwrap();
    assert!(outcome.is_match());

    let Expected::Sequence { items, .. } = &expected else {
        panic!("expected a sequence");
    };
    let Expected::Multi(second) = &items[1] else {
        panic!("expected a multi-match node");
    };
    assert_eq!(tally.count(second), 1);
    assert_eq!(tally.total(), 4);
}

#[test]
fn test_multi_match_requires_one_claim() {
    let expected = Expected::list([Expected::multi(Expected::from(json!({"color": "red"})))]);
    for ordered in [true, false] {
        let outcome = comparator(ordered).compare(&expected, &shapes()).unwrap();
        assert!(!outcome.is_match(), "ordered={}", ordered);
    }
}

#[test]
fn test_multi_match_against_empty_list() {
    let expected = Expected::list([blue()]);
    let outcome = comparator(true).compare(&expected, &Value::List(vec![])).unwrap();
    let diff = outcome.into_diff().unwrap();
    assert_eq!(diff.expected.to_json(), json!([{"color": "blue"}]));
    assert_eq!(diff.actual.to_json(), json!(["<absent>"]));
}

#[test]
fn test_nodes_reusable_across_calls() {
    let expected = Expected::list([blue()]);
    let engine = comparator(false);
    assert!(engine.compare(&expected, &shapes()).unwrap().is_match());
    assert!(!engine
        .compare(&expected, &Value::from(json!([{"color": "red"}])))
        .unwrap()
        .is_match());
    assert!(engine.compare(&expected, &shapes()).unwrap().is_match());
}

#[test]
fn test_multi_match_outside_list_compares_payload() {
    let engine = comparator(true);
    assert!(engine
        .compare(&blue(), &Value::from(json!({"color": "blue", "size": 3})))
        .unwrap()
        .is_match());
}
