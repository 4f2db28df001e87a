use super::list::ListDiff;
use super::{Session, ABSENT};
use crate::display::{display, Node};
use crate::expected::{Expected, MultiMatch};
use kobold_common::{CompareOptions, KoboldError, ListMode, Value};
use tracing::trace;

/// Match elements regardless of position.
///
/// 1. Each non-MultiMatch expected element pairs with the first remaining
///    actual element it matches. This is first-fit, not a maximum matching.
/// 2. Every remaining actual element is offered to every MultiMatch; it is
///    consumed if at least one of them matches it. A MultiMatch that claimed
///    anything is satisfied.
/// 3. Leftovers are paired in remaining order purely for display.
///
/// Returns `None` on a match under the list mode in effect.
pub(super) fn compare_unordered(
    session: &mut Session,
    expected: &[Expected],
    actual: &[Value],
    options: &CompareOptions,
) -> Result<Option<ListDiff>, KoboldError> {
    let mut expected_left: Vec<usize> = Vec::new();
    let mut actual_left: Vec<usize> = (0..actual.len()).collect();

    for (ei, node) in expected.iter().enumerate() {
        if matches!(node, Expected::Multi(_)) {
            expected_left.push(ei);
            continue;
        }
        let mut paired = None;
        for (slot, &ai) in actual_left.iter().enumerate() {
            if session.try_compare(node, &actual[ai], options)?.is_match() {
                paired = Some(slot);
                break;
            }
        }
        match paired {
            Some(slot) => {
                trace!("Paired expected[{}] with actual[{}]", ei, actual_left[slot]);
                actual_left.remove(slot);
            }
            None => expected_left.push(ei),
        }
    }

    let multis: Vec<(usize, &MultiMatch)> = expected_left
        .iter()
        .filter_map(|&ei| match &expected[ei] {
            Expected::Multi(multi) => Some((ei, multi)),
            _ => None,
        })
        .collect();
    if !multis.is_empty() {
        let mut claims = vec![0usize; multis.len()];
        let mut unclaimed = Vec::with_capacity(actual_left.len());
        for ai in actual_left {
            let mut taken = false;
            for (slot, (ei, multi)) in multis.iter().enumerate() {
                if session.try_compare(multi.payload(), &actual[ai], options)?.is_match() {
                    trace!("MultiMatch expected[{}] claimed actual[{}]", ei, ai);
                    claims[slot] += 1;
                    session.tally.record(multi);
                    taken = true;
                }
            }
            if !taken {
                unclaimed.push(ai);
            }
        }
        actual_left = unclaimed;
        expected_left.retain(|ei| {
            multis
                .iter()
                .position(|(multi_ei, _)| multi_ei == ei)
                .map_or(true, |slot| claims[slot] == 0)
        });
    }

    let matched = match options.list {
        ListMode::Full => expected_left.is_empty() && actual_left.is_empty(),
        ListMode::Existing => expected_left.is_empty(),
    };
    if matched {
        return Ok(None);
    }

    let mut diff = ListDiff {
        expected: vec![Value::Placeholder; expected.len()],
        actual: vec![Value::Placeholder; actual.len()],
    };
    for i in 0..expected_left.len().max(actual_left.len()) {
        let exp = expected_left.get(i).map(|&ei| (ei, Node::Expected(&expected[ei])));
        let act = actual_left.get(i).map(|&ai| (ai, Node::Value(&actual[ai])));
        let exp_node = exp.map_or(Node::Value(&ABSENT), |(_, node)| node);
        let act_node = act.map_or(Node::Value(&ABSENT), |(_, node)| node);

        if let Some((ei, node)) = exp {
            diff.expected[ei] = display(node, act_node);
        }
        if let Some((ai, node)) = act {
            diff.actual[ai] = display(node, exp_node);
        }
    }
    Ok(Some(diff))
}
