//! The comparator: recursive dispatch over [`Expected`] nodes.

mod hash;
mod list;
mod ordered;
mod unordered;

use crate::expected::{Expected, MultiMatch};
use kobold_common::{
    CompareOptions, ComparatorConfig, KoboldError, OptionsOverride, Shape, Value,
    DEFAULT_MAX_DEPTH,
};
use tracing::debug;

/// Stand-in for a missing key or index on the actual side.
pub(crate) static ABSENT: Value = Value::Absent;

/// The two sides of a mismatch, each shaped like its input.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    pub expected: Value,
    pub actual: Value,
}

impl Diff {
    pub fn new(expected: Value, actual: Value) -> Self {
        Self { expected, actual }
    }

    /// `{"expected": ..., "actual": ...}` for display
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "expected": self.expected.to_json(),
            "actual": self.actual.to_json(),
        })
    }
}

/// Result of one comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Match,
    Mismatch(Diff),
}

impl Outcome {
    pub(crate) fn mismatch(expected: Value, actual: Value) -> Self {
        Outcome::Mismatch(Diff::new(expected, actual))
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Match)
    }

    pub fn diff(&self) -> Option<&Diff> {
        match self {
            Outcome::Match => None,
            Outcome::Mismatch(diff) => Some(diff),
        }
    }

    pub fn into_diff(self) -> Option<Diff> {
        match self {
            Outcome::Match => None,
            Outcome::Mismatch(diff) => Some(diff),
        }
    }
}

/// How many actual elements each [`MultiMatch`] claimed during one call.
///
/// Nodes are identified by address, so a tally is only meaningful for the
/// expected tree it was produced from. Claims made while trying a candidate
/// pairing that is then rejected are withdrawn.
#[derive(Debug, Clone, Default)]
pub struct MatchTally {
    claims: Vec<usize>,
}

impl MatchTally {
    pub fn count(&self, node: &MultiMatch) -> usize {
        let key = node.key();
        self.claims.iter().filter(|&&claimed| claimed == key).count()
    }

    pub fn total(&self) -> usize {
        self.claims.len()
    }

    pub(crate) fn record(&mut self, node: &MultiMatch) {
        self.claims.push(node.key());
    }

    fn checkpoint(&self) -> usize {
        self.claims.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        self.claims.truncate(checkpoint);
    }
}

/// Comparison engine
#[derive(Debug, Clone)]
pub struct Comparator {
    options: CompareOptions,
    max_depth: usize,
}

impl Comparator {
    pub fn new() -> Self {
        Self {
            options: CompareOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn from_config(config: &ComparatorConfig) -> Self {
        Self {
            options: CompareOptions::default().merged(&config.defaults),
            max_depth: config.max_depth,
        }
    }

    /// Layer `patch` over the options already configured.
    pub fn with_options(mut self, patch: &OptionsOverride) -> Self {
        self.options = self.options.merged(patch);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn compare(&self, expected: &Expected, actual: &Value) -> Result<Outcome, KoboldError> {
        self.compare_tallied(expected, actual).map(|(outcome, _)| outcome)
    }

    /// Compare, also returning the MultiMatch claims made along the way.
    pub fn compare_tallied(
        &self,
        expected: &Expected,
        actual: &Value,
    ) -> Result<(Outcome, MatchTally), KoboldError> {
        self.options.validate()?;
        let mut session = Session::new(self.max_depth);
        let outcome = session.compare(expected, actual, &self.options)?;
        debug!(
            "Comparison finished: match={}, multi-match claims={}",
            outcome.is_match(),
            session.tally.total()
        );
        Ok((outcome, session.tally))
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare `expected` against `actual` with `options` layered over the
/// defaults.
pub fn compare(
    expected: &Expected,
    actual: &Value,
    options: &OptionsOverride,
) -> Result<Outcome, KoboldError> {
    Comparator::new().with_options(options).compare(expected, actual)
}

/// State of one top-level comparison call
pub(crate) struct Session {
    max_depth: usize,
    depth: usize,
    pub(crate) tally: MatchTally,
}

impl Session {
    fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            depth: 0,
            tally: MatchTally::default(),
        }
    }

    pub(crate) fn compare(
        &mut self,
        expected: &Expected,
        actual: &Value,
        options: &CompareOptions,
    ) -> Result<Outcome, KoboldError> {
        if self.depth >= self.max_depth {
            return Err(KoboldError::Comparison(format!(
                "nesting deeper than {} levels",
                self.max_depth
            )));
        }
        self.depth += 1;
        let outcome = self.dispatch(expected, actual, options);
        self.depth -= 1;
        outcome
    }

    /// Compare a candidate pairing; claims it made are withdrawn on a
    /// mismatch.
    pub(crate) fn try_compare(
        &mut self,
        expected: &Expected,
        actual: &Value,
        options: &CompareOptions,
    ) -> Result<Outcome, KoboldError> {
        let checkpoint = self.tally.checkpoint();
        let outcome = self.compare(expected, actual, options)?;
        if !outcome.is_match() {
            self.tally.rollback(checkpoint);
        }
        Ok(outcome)
    }

    fn dispatch(
        &mut self,
        expected: &Expected,
        actual: &Value,
        options: &CompareOptions,
    ) -> Result<Outcome, KoboldError> {
        match expected {
            Expected::Literal(value) if value.shape() != Shape::Scalar => {
                let structural = Expected::from(value.clone());
                return self.compare(&structural, actual, options);
            }
            Expected::Override(wrapper) => {
                let merged = options.merged(wrapper.options());
                merged.validate()?;
                debug!("Applying options override: {:?}", wrapper.options());
                return self.compare(wrapper.payload(), actual, &merged);
            }
            Expected::Wildcard(rule) => {
                return Ok(if rule.accepts(actual)? {
                    Outcome::Match
                } else {
                    Outcome::mismatch(Value::Str(rule.label()), actual.clone())
                });
            }
            Expected::Pattern(regex) => {
                if let Value::Str(text) = actual {
                    let matched = regex.find(text).map_or(false, |m| m.start() == 0);
                    return Ok(if matched {
                        Outcome::Match
                    } else {
                        Outcome::mismatch(expected.render(), actual.clone())
                    });
                }
            }
            Expected::Decode(hint) => {
                return match hint.decode(actual) {
                    Ok(decoded) => self.compare(hint.payload(), &decoded, options),
                    Err(err) => {
                        debug!("{}; diffing the undecoded value", err);
                        Ok(Outcome::mismatch(expected.render(), actual.clone()))
                    }
                };
            }
            Expected::Multi(multi) => return self.compare(multi.payload(), actual, options),
            _ => {}
        }

        let (expected_shape, actual_shape) = (expected.shape(), actual.shape());
        if expected_shape == Shape::Mapping && actual_shape == Shape::Mapping {
            if let (Expected::Mapping { entries, mode }, Value::Map(map)) = (expected, actual) {
                return hash::compare_mapping(self, entries, mode.as_ref(), map, options);
            }
        }
        if expected_shape.is_sequence_like() && actual_shape.is_sequence_like() {
            return list::compare_list(self, expected, actual, options);
        }

        if let (Expected::Structured(structured), Value::Str(text)) = (expected, actual) {
            return match structured.capture(text) {
                Some(groups) => self.compare(structured.arguments(), &groups, options),
                None => Ok(Outcome::mismatch(expected.render(), actual.clone())),
            };
        }

        match expected {
            Expected::Literal(value) if value == actual => Ok(Outcome::Match),
            _ => Ok(Outcome::mismatch(expected.render(), actual.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Decoder;
    use crate::wildcard::DontCare;
    use kobold_common::HashMode;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn e(json: serde_json::Value) -> Expected {
        Expected::from(json)
    }

    #[test]
    fn test_scalar_equality() {
        let none = OptionsOverride::none();
        assert!(compare(&Expected::from(1), &Value::Int(1), &none).unwrap().is_match());
        assert_eq!(
            compare(&Expected::from("a"), &Value::from("b"), &none).unwrap(),
            Outcome::mismatch(Value::from("a"), Value::from("b"))
        );
    }

    #[test]
    fn test_literal_container_compares_structurally() {
        let expected = Expected::Literal(v(json!({"a": [1, 2]})));
        let outcome = compare(&expected, &v(json!({"a": [1, 3]})), &OptionsOverride::none()).unwrap();
        let diff = outcome.into_diff().unwrap();
        assert_eq!(diff.expected.to_json(), json!({"a": ["_", 2]}));
        assert_eq!(diff.actual.to_json(), json!({"a": ["_", 3]}));
    }

    #[test]
    fn test_wildcard_label() {
        let outcome = compare(
            &Expected::dont_care(),
            &Value::Absent,
            &OptionsOverride::none(),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::mismatch(Value::from("wildcard: not-null-or-absent"), Value::Absent)
        );
    }

    #[test]
    fn test_unknown_wildcard_rule_is_error() {
        let rule = DontCare::new("is-purple", Default::default()).unwrap();
        let result = compare(&Expected::from(rule), &Value::Int(1), &OptionsOverride::none());
        assert!(matches!(result, Err(KoboldError::Config(_))));
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let expected = Expected::pattern(r"\d+").unwrap();
        let none = OptionsOverride::none();
        assert!(compare(&expected, &Value::from("123abc"), &none).unwrap().is_match());
        assert_eq!(
            compare(&expected, &Value::from("abc123"), &none).unwrap(),
            Outcome::mismatch(Value::from(r"regex: \d+"), Value::from("abc123"))
        );
        assert!(!compare(&expected, &Value::Int(12), &none).unwrap().is_match());
    }

    #[test]
    fn test_decode_failure_diffs_raw_value() {
        let expected = Expected::decode(Decoder::Json, e(json!({"a": 1})));
        let outcome = compare(&expected, &Value::from("{broken"), &OptionsOverride::none()).unwrap();
        assert_eq!(
            outcome,
            Outcome::mismatch(v(json!({"a": 1})), Value::from("{broken"))
        );
    }

    #[test]
    fn test_decode_of_absent_compares_payload() {
        let expected = Expected::decode(Decoder::Json, e(json!({"a": 1})));
        let outcome = compare(&expected, &Value::Absent, &OptionsOverride::none()).unwrap();
        assert_eq!(outcome, Outcome::mismatch(v(json!({"a": 1})), Value::Absent));
    }

    #[test]
    fn test_override_applies_to_subtree_only() {
        let expected = Expected::map([
            (
                "inner",
                Expected::with_options(e(json!({"a": 1})), OptionsOverride::none().hash(HashMode::Existing)),
            ),
            ("b", Expected::from(2)),
        ]);
        let actual = v(json!({"inner": {"a": 1, "extra": true}, "b": 2}));
        assert!(compare(&expected, &actual, &OptionsOverride::none()).unwrap().is_match());

        let actual = v(json!({"inner": {"a": 1}, "b": 2, "c": 3}));
        assert!(!compare(&expected, &actual, &OptionsOverride::none()).unwrap().is_match());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = OptionsOverride::none().list(kobold_common::ListMode::Existing);
        let result = compare(&Expected::from(1), &Value::Int(1), &options);
        assert!(matches!(result, Err(KoboldError::Config(_))));
    }

    #[test]
    fn test_structured_string() {
        let expected = Expected::structured(
            r"(\w+)=(\d+)",
            [Expected::from("count"), Expected::decode(Decoder::Json, Expected::from(3))],
        )
        .unwrap();
        let none = OptionsOverride::none();
        assert!(compare(&expected, &Value::from("count=3"), &none).unwrap().is_match());
        assert_eq!(
            compare(&expected, &Value::from("count=4"), &none).unwrap(),
            Outcome::mismatch(Value::list([Value::Placeholder, Value::Int(3)]), Value::list([Value::Placeholder, Value::Int(4)]))
        );
        assert_eq!(
            compare(&expected, &Value::from("nothing"), &none).unwrap(),
            Outcome::mismatch(Value::from(r"structured-string: (\w+)=(\d+)"), Value::from("nothing"))
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut nested = json!(1);
        for _ in 0..10 {
            nested = json!([nested]);
        }
        let comparator = Comparator::new().with_max_depth(5);
        let result = comparator.compare(&e(nested.clone()), &v(nested));
        assert!(matches!(result, Err(KoboldError::Comparison(_))));
    }

    #[test]
    fn test_tally_is_fresh_per_call() {
        let expected = Expected::list([Expected::multi(Expected::from(1))]);
        let comparator = Comparator::new();
        let actual = Value::list([Value::Int(1), Value::Int(1)]);

        let (first, tally) = comparator.compare_tallied(&expected, &actual).unwrap();
        assert!(first.is_match());
        assert_eq!(tally.total(), 2);

        let (second, tally) = comparator.compare_tallied(&expected, &actual).unwrap();
        assert!(second.is_match());
        assert_eq!(tally.total(), 2);
        if let Expected::Sequence { items, .. } = &expected {
            if let Expected::Multi(multi) = &items[0] {
                assert_eq!(tally.count(multi), 2);
            }
        }
    }
}
