use super::{ordered, unordered, Diff, Outcome, Session};
use crate::expected::{Expected, ListOrder};
use kobold_common::{CompareOptions, KoboldError, Shape, Value};
use tracing::debug;

/// Container the diff sides are rebuilt into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Tuple,
    Set,
}

/// Positional diff of two sequences, placeholders marking matched positions
#[derive(Debug, Default)]
pub(super) struct ListDiff {
    pub expected: Vec<Value>,
    pub actual: Vec<Value>,
}

impl ListDiff {
    fn into_outcome(self, container: Container) -> Outcome {
        let wrap = |items: Vec<Value>| match container {
            Container::List => Value::List(items),
            Container::Tuple => Value::Tuple(items),
            Container::Set => Value::set(items.into_iter().filter(|v| !matches!(v, Value::Placeholder))),
        };
        Outcome::Mismatch(Diff::new(wrap(self.expected), wrap(self.actual)))
    }
}

/// Compare two sequence-like values, choosing the ordered or unordered
/// strategy.
pub(super) fn compare_list(
    session: &mut Session,
    expected: &Expected,
    actual: &Value,
    options: &CompareOptions,
) -> Result<Outcome, KoboldError> {
    let (items, order): (&[Expected], Option<ListOrder>) = match expected {
        Expected::Sequence { items, order } => (items.as_slice(), *order),
        Expected::Tuple(items) | Expected::Set(items) => (items.as_slice(), None),
        other => {
            return Err(KoboldError::Comparison(format!(
                "list comparison reached a {:?} node",
                other.shape()
            )))
        }
    };
    let Some(elements) = actual.elements() else {
        return Err(KoboldError::Comparison(format!(
            "list comparison reached a {} value",
            actual.type_name()
        )));
    };

    let both_sets = expected.shape() == Shape::Set && actual.shape() == Shape::Set;
    let container = if both_sets {
        Container::Set
    } else if expected.shape() == Shape::Tuple && actual.shape() == Shape::Tuple {
        Container::Tuple
    } else {
        Container::List
    };

    let is_ordered = match order {
        Some(ListOrder::Ordered) => true,
        Some(ListOrder::Unordered) => false,
        None => options.ordered && !both_sets,
    };
    debug!(
        "Comparing {} expected against {} actual elements ({})",
        items.len(),
        elements.len(),
        if is_ordered { "ordered" } else { "unordered" }
    );

    let diff = if is_ordered {
        ordered::compare_ordered(session, items, &elements, options)?
    } else {
        unordered::compare_unordered(session, items, &elements, options)?
    };

    Ok(match diff {
        None => Outcome::Match,
        Some(diff) => diff.into_outcome(container),
    })
}
