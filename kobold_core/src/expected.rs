use crate::decode::{DecodeHint, Decoder};
use crate::wildcard::DontCare;
use kobold_common::{KoboldError, OptionsOverride, Shape, Value};
use regex::Regex;
use std::collections::BTreeMap;

/// Reserved mapping key whose value overrides the compare options for that
/// mapping's subtree.
pub const COMPARE_KEY: &str = "__compare";

/// Strategy forced on a single list, regardless of the inherited options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    Ordered,
    Unordered,
}

/// The "expected" side of a comparison.
#[derive(Debug, Clone)]
pub enum Expected {
    /// Compared by equality. Container values are compared structurally.
    Literal(Value),
    Mapping {
        entries: BTreeMap<String, Expected>,
        mode: Option<OptionsOverride>,
    },
    Sequence {
        items: Vec<Expected>,
        order: Option<ListOrder>,
    },
    Tuple(Vec<Expected>),
    Set(Vec<Expected>),
    Wildcard(DontCare),
    /// The actual value must be a string matching at its start.
    Pattern(Regex),
    Decode(DecodeHint),
    Structured(StructuredString),
    Multi(MultiMatch),
    Override(TypeCompareOverride),
}

/// Regex whose capture groups are compared against argument nodes.
#[derive(Debug, Clone)]
pub struct StructuredString {
    regex: Regex,
    arguments: Box<Expected>,
}

impl StructuredString {
    pub fn new(regex: Regex, arguments: impl IntoIterator<Item = Expected>) -> Self {
        Self {
            regex,
            arguments: Box::new(Expected::list(arguments)),
        }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The argument nodes, as a sequence
    pub fn arguments(&self) -> &Expected {
        &self.arguments
    }

    pub fn label(&self) -> String {
        format!("structured-string: {}", self.regex.as_str())
    }

    /// Capture groups of a match anchored at the start of `actual`.
    /// Groups that did not participate are `Null`.
    pub fn capture(&self, actual: &str) -> Option<Value> {
        let captures = self.regex.captures(actual)?;
        if captures.get(0).map_or(true, |m| m.start() != 0) {
            return None;
        }
        Some(Value::List(
            captures
                .iter()
                .skip(1)
                .map(|group| match group {
                    Some(m) => Value::from(m.as_str()),
                    None => Value::Null,
                })
                .collect(),
        ))
    }
}

/// List element that may claim any number of actual elements.
#[derive(Debug, Clone)]
pub struct MultiMatch {
    payload: Box<Expected>,
}

impl MultiMatch {
    pub fn new(payload: impl Into<Expected>) -> Self {
        Self {
            payload: Box::new(payload.into()),
        }
    }

    pub fn payload(&self) -> &Expected {
        &self.payload
    }

    /// Identity of this node for the duration of a comparison.
    pub(crate) fn key(&self) -> usize {
        self as *const MultiMatch as usize
    }
}

/// Wraps a node with options that apply to its subtree only.
#[derive(Debug, Clone)]
pub struct TypeCompareOverride {
    payload: Box<Expected>,
    options: OptionsOverride,
}

impl TypeCompareOverride {
    pub fn new(payload: impl Into<Expected>, options: OptionsOverride) -> Self {
        Self {
            payload: Box::new(payload.into()),
            options,
        }
    }

    pub fn payload(&self) -> &Expected {
        &self.payload
    }

    pub fn options(&self) -> &OptionsOverride {
        &self.options
    }
}

impl Expected {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expected::from(value.into())
    }

    /// Expected node for "this key or index must not be present"
    pub fn absent() -> Self {
        Expected::Literal(Value::Absent)
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expected)>) -> Self {
        Expected::Mapping {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            mode: None,
        }
    }

    /// Mapping whose subtree is compared with `mode` layered on the inherited
    /// options.
    pub fn map_with_mode<K: Into<String>>(
        entries: impl IntoIterator<Item = (K, Expected)>,
        mode: OptionsOverride,
    ) -> Self {
        Expected::Mapping {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            mode: Some(mode),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Expected>) -> Self {
        Expected::Sequence {
            items: items.into_iter().collect(),
            order: None,
        }
    }

    /// List always compared positionally
    pub fn ordered(items: impl IntoIterator<Item = Expected>) -> Self {
        Expected::Sequence {
            items: items.into_iter().collect(),
            order: Some(ListOrder::Ordered),
        }
    }

    /// List always compared by matching, ignoring position
    pub fn unordered(items: impl IntoIterator<Item = Expected>) -> Self {
        Expected::Sequence {
            items: items.into_iter().collect(),
            order: Some(ListOrder::Unordered),
        }
    }

    pub fn tuple(items: impl IntoIterator<Item = Expected>) -> Self {
        Expected::Tuple(items.into_iter().collect())
    }

    /// Set of nodes. Literal duplicates are dropped.
    pub fn set(items: impl IntoIterator<Item = Expected>) -> Self {
        let mut unique: Vec<Expected> = Vec::new();
        let mut seen: Vec<Value> = Vec::new();
        for item in items {
            if let Some(value) = item.to_value() {
                if seen.contains(&value) {
                    continue;
                }
                seen.push(value);
            }
            unique.push(item);
        }
        Expected::Set(unique)
    }

    pub fn dont_care() -> Self {
        Expected::Wildcard(DontCare::default())
    }

    pub fn pattern(pattern: &str) -> Result<Self, KoboldError> {
        Regex::new(pattern)
            .map(Expected::Pattern)
            .map_err(|e| KoboldError::Config(format!("invalid regex: {}", e)))
    }

    pub fn decode(step: Decoder, payload: impl Into<Expected>) -> Self {
        Expected::Decode(DecodeHint::new(step, payload))
    }

    pub fn decode_chain(
        steps: impl IntoIterator<Item = Decoder>,
        payload: impl Into<Expected>,
    ) -> Self {
        Expected::Decode(DecodeHint::chain(steps, payload))
    }

    pub fn structured(
        pattern: &str,
        arguments: impl IntoIterator<Item = Expected>,
    ) -> Result<Self, KoboldError> {
        let regex =
            Regex::new(pattern).map_err(|e| KoboldError::Config(format!("invalid regex: {}", e)))?;
        Ok(Expected::Structured(StructuredString::new(regex, arguments)))
    }

    pub fn multi(payload: impl Into<Expected>) -> Self {
        Expected::Multi(MultiMatch::new(payload))
    }

    pub fn with_options(payload: impl Into<Expected>, options: OptionsOverride) -> Self {
        Expected::Override(TypeCompareOverride::new(payload, options))
    }

    /// Structural category. Only literal values may hold containers, and
    /// those report the container's shape.
    pub fn shape(&self) -> Shape {
        match self {
            Expected::Literal(value) => value.shape(),
            Expected::Mapping { .. } => Shape::Mapping,
            Expected::Sequence { .. } => Shape::Sequence,
            Expected::Tuple(_) => Shape::Tuple,
            Expected::Set(_) => Shape::Set,
            _ => Shape::Scalar,
        }
    }

    /// Keys of a mapping node, excluding the reserved override key.
    pub fn mapping_keys(&self) -> Option<Vec<&str>> {
        match self {
            Expected::Mapping { entries, .. } => Some(
                entries
                    .keys()
                    .map(String::as_str)
                    .filter(|k| *k != COMPARE_KEY)
                    .collect(),
            ),
            Expected::Literal(Value::Map(map)) => Some(
                map.keys()
                    .map(String::as_str)
                    .filter(|k| *k != COMPARE_KEY)
                    .collect(),
            ),
            _ => None,
        }
    }

    /// The plain value this node describes, if it is made of literals only.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Expected::Literal(value) => Some(value.clone()),
            Expected::Mapping { entries, mode: None } => entries
                .iter()
                .map(|(k, v)| v.to_value().map(|v| (k.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(Value::Map),
            Expected::Sequence { items, order: None } => {
                items.iter().map(Expected::to_value).collect::<Option<Vec<_>>>().map(Value::List)
            }
            Expected::Tuple(items) => {
                items.iter().map(Expected::to_value).collect::<Option<Vec<_>>>().map(Value::Tuple)
            }
            Expected::Set(items) => {
                items.iter().map(Expected::to_value).collect::<Option<Vec<_>>>().map(Value::set)
            }
            _ => None,
        }
    }

    /// How this node appears on the expected side of a diff.
    pub fn render(&self) -> Value {
        match self {
            Expected::Literal(value) => value.clone(),
            Expected::Mapping { entries, .. } => Value::Map(
                entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != COMPARE_KEY)
                    .map(|(k, v)| (k.clone(), v.render()))
                    .collect(),
            ),
            Expected::Sequence { items, .. } => Value::List(items.iter().map(Expected::render).collect()),
            Expected::Tuple(items) => Value::Tuple(items.iter().map(Expected::render).collect()),
            Expected::Set(items) => Value::set(items.iter().map(Expected::render)),
            Expected::Wildcard(rule) => Value::Str(rule.label()),
            Expected::Pattern(regex) => Value::Str(format!("regex: {}", regex.as_str())),
            Expected::Decode(hint) => hint.payload().render(),
            Expected::Structured(structured) => Value::Str(structured.label()),
            Expected::Multi(multi) => multi.payload().render(),
            Expected::Override(wrapper) => wrapper.payload().render(),
        }
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        match value {
            Value::Map(map) => Expected::Mapping {
                entries: map.into_iter().map(|(k, v)| (k, Expected::from(v))).collect(),
                mode: None,
            },
            Value::List(items) => Expected::list(items.into_iter().map(Expected::from)),
            Value::Tuple(items) => Expected::Tuple(items.into_iter().map(Expected::from).collect()),
            Value::Record { fields, .. } => {
                Expected::Tuple(fields.into_iter().map(|(_, v)| Expected::from(v)).collect())
            }
            Value::Set(items) => Expected::Set(items.into_iter().map(Expected::from).collect()),
            scalar => Expected::Literal(scalar),
        }
    }
}

impl From<serde_json::Value> for Expected {
    fn from(json: serde_json::Value) -> Self {
        Expected::from(Value::from(json))
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Expected::Literal(Value::from(s))
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Expected::Literal(Value::Str(s))
    }
}

impl From<i64> for Expected {
    fn from(i: i64) -> Self {
        Expected::Literal(Value::Int(i))
    }
}

impl From<i32> for Expected {
    fn from(i: i32) -> Self {
        Expected::Literal(Value::from(i))
    }
}

impl From<f64> for Expected {
    fn from(f: f64) -> Self {
        Expected::Literal(Value::Float(f))
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Expected::Literal(Value::Bool(b))
    }
}

impl From<DontCare> for Expected {
    fn from(rule: DontCare) -> Self {
        Expected::Wildcard(rule)
    }
}

impl From<Regex> for Expected {
    fn from(regex: Regex) -> Self {
        Expected::Pattern(regex)
    }
}

impl From<DecodeHint> for Expected {
    fn from(hint: DecodeHint) -> Self {
        Expected::Decode(hint)
    }
}

impl From<MultiMatch> for Expected {
    fn from(multi: MultiMatch) -> Self {
        Expected::Multi(multi)
    }
}

impl From<StructuredString> for Expected {
    fn from(structured: StructuredString) -> Self {
        Expected::Structured(structured)
    }
}

impl From<TypeCompareOverride> for Expected {
    fn from(wrapper: TypeCompareOverride) -> Self {
        Expected::Override(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_is_structural() {
        let expected = Expected::from(json!({"a": [1, {"b": 2}]}));
        assert_eq!(expected.shape(), Shape::Mapping);
        match expected {
            Expected::Mapping { entries, .. } => {
                assert!(matches!(entries["a"], Expected::Sequence { .. }));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_render_rules() {
        let expected = Expected::map([
            ("id", Expected::dont_care()),
            ("name", Expected::pattern("^a.*").unwrap()),
            (COMPARE_KEY, Expected::from("existing")),
        ]);
        assert_eq!(
            expected.render(),
            Value::from(json!({"id": "wildcard: not-null-or-absent", "name": "regex: ^a.*"}))
        );
    }

    #[test]
    fn test_set_drops_literal_duplicates() {
        let set = Expected::set([Expected::from(1), Expected::from(1), Expected::from(2)]);
        match set {
            Expected::Set(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_to_value_stops_at_rules() {
        assert_eq!(
            Expected::from(json!({"hash": "existing"})).to_value(),
            Some(Value::from(json!({"hash": "existing"})))
        );
        assert!(Expected::list([Expected::dont_care()]).to_value().is_none());
    }

    #[test]
    fn test_structured_capture_is_anchored() {
        let structured = StructuredString::new(
            Regex::new(r"x=(\d+);(\w+)?").unwrap(),
            [Expected::from("1"), Expected::from("a")],
        );
        assert_eq!(
            structured.capture("x=12;"),
            Some(Value::list([Value::from("12"), Value::Null]))
        );
        assert_eq!(structured.capture("yx=12;a"), None);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(matches!(Expected::pattern("(unclosed"), Err(KoboldError::Config(_))));
    }
}
