//! Best-effort side-by-side rendering of elements that could not be paired.
//!
//! Only used to present unordered-list leftovers; it never decides whether
//! anything matches.

use crate::expected::{Expected, COMPARE_KEY};
use kobold_common::{Shape, Value};
use std::collections::BTreeMap;

/// Either side of a rendered pair
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expected(&'a Expected),
    Value(&'a Value),
}

static ABSENT: Value = Value::Absent;

impl<'a> Node<'a> {
    /// Strip wrappers that do not change how a node is displayed.
    fn normalize(self) -> Node<'a> {
        match self {
            Node::Expected(Expected::Literal(value)) => Node::Value(value),
            Node::Expected(Expected::Multi(multi)) => Node::Expected(multi.payload()).normalize(),
            Node::Expected(Expected::Override(wrapper)) => {
                Node::Expected(wrapper.payload()).normalize()
            }
            other => other,
        }
    }

    fn shape(self) -> Shape {
        match self {
            Node::Expected(expected) => expected.shape(),
            Node::Value(value) => value.shape(),
        }
    }

    fn keys(self) -> Vec<&'a str> {
        match self {
            Node::Expected(Expected::Mapping { entries, .. }) => entries
                .keys()
                .map(String::as_str)
                .filter(|k| *k != COMPARE_KEY)
                .collect(),
            Node::Value(Value::Map(map)) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn get(self, key: &str) -> Node<'a> {
        match self {
            Node::Expected(Expected::Mapping { entries, .. }) => {
                entries.get(key).map_or(Node::Value(&ABSENT), Node::Expected)
            }
            Node::Value(Value::Map(map)) => Node::Value(map.get(key).unwrap_or(&ABSENT)),
            _ => Node::Value(&ABSENT),
        }
    }

    fn len(self) -> usize {
        match self {
            Node::Expected(Expected::Sequence { items, .. })
            | Node::Expected(Expected::Tuple(items))
            | Node::Expected(Expected::Set(items)) => items.len(),
            Node::Value(Value::List(items))
            | Node::Value(Value::Tuple(items))
            | Node::Value(Value::Set(items)) => items.len(),
            Node::Value(Value::Record { fields, .. }) => fields.len(),
            _ => 0,
        }
    }

    fn item(self, index: usize) -> Node<'a> {
        let found = match self {
            Node::Expected(Expected::Sequence { items, .. })
            | Node::Expected(Expected::Tuple(items))
            | Node::Expected(Expected::Set(items)) => items.get(index).map(Node::Expected),
            Node::Value(Value::List(items))
            | Node::Value(Value::Tuple(items))
            | Node::Value(Value::Set(items)) => items.get(index).map(Node::Value),
            Node::Value(Value::Record { fields, .. }) => {
                fields.get(index).map(|(_, value)| Node::Value(value))
            }
            _ => None,
        };
        found.unwrap_or(Node::Value(&ABSENT))
    }

    fn render(self) -> Value {
        match self {
            Node::Expected(expected) => expected.render(),
            Node::Value(value) => value.clone(),
        }
    }
}

/// Render `element` for display next to `other`.
pub fn display(element: Node<'_>, other: Node<'_>) -> Value {
    let element = element.normalize();
    let other = other.normalize();

    if let Node::Expected(Expected::Wildcard(rule)) = element {
        return Value::Str(rule.label());
    }

    let (shape, other_shape) = (element.shape(), other.shape());
    if shape == Shape::Mapping && other_shape == Shape::Mapping {
        return Value::Map(
            element
                .keys()
                .into_iter()
                .map(|key| (key.to_string(), display(element.get(key), other.get(key))))
                .collect::<BTreeMap<_, _>>(),
        );
    }
    if shape == Shape::Tuple && other_shape == Shape::Tuple {
        return Value::Tuple(display_items(element, other));
    }
    if shape.is_sequence_like() && other_shape.is_sequence_like() {
        return Value::List(display_items(element, other));
    }

    if let Node::Expected(Expected::Pattern(_)) = element {
        return element.render();
    }
    if let (Node::Value(value), Node::Expected(Expected::Decode(hint))) = (element, other) {
        return match hint.decode(value) {
            Ok(decoded) => display(Node::Value(&decoded), Node::Expected(hint.payload())),
            Err(_) => display(element, Node::Expected(hint.payload())),
        };
    }
    if let Node::Expected(Expected::Decode(hint)) = element {
        let payload = Node::Expected(hint.payload());
        return match other {
            Node::Value(value) => match hint.decode(value) {
                Ok(decoded) => display(payload, Node::Value(&decoded)),
                Err(_) => display(payload, other),
            },
            Node::Expected(_) => display(payload, other),
        };
    }

    element.render()
}

fn display_items(element: Node<'_>, other: Node<'_>) -> Vec<Value> {
    (0..element.len().max(other.len()))
        .map(|i| display(element.item(i), other.item(i)))
        .collect()
}
