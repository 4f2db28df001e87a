use super::list::ListDiff;
use super::{Outcome, Session, ABSENT};
use crate::expected::Expected;
use kobold_common::{CompareOptions, KoboldError, Value};

/// Positional walk over both lists.
///
/// A [`crate::expected::MultiMatch`] holds its position while it keeps
/// matching. Once it has claimed an element, each following actual element is
/// first tried against the next expected element; a hit moves the walk past
/// the MultiMatch. The walk ends when both lists are exhausted; missing
/// positions compare against the absence sentinel.
///
/// Returns `None` when every position matched.
pub(super) fn compare_ordered(
    session: &mut Session,
    expected: &[Expected],
    actual: &[Value],
    options: &CompareOptions,
) -> Result<Option<ListDiff>, KoboldError> {
    let absent = Expected::absent();
    let mut diff = ListDiff::default();
    let mut mismatched = false;
    let mut ei = 0;
    let mut ai = 0;
    // Elements claimed by the MultiMatch at `ei`
    let mut claimed = 0usize;

    loop {
        let exp = expected.get(ei);
        let act = actual.get(ai);
        if exp.is_none() && act.is_none() {
            break;
        }
        let at_multi = matches!(exp, Some(Expected::Multi(_)));

        if at_multi && claimed > 0 && act.is_none() {
            ei += 1;
            claimed = 0;
            continue;
        }
        let act_value = act.unwrap_or(&ABSENT);

        let mut index = ei;
        let mut lookahead = None;
        if at_multi && claimed > 0 {
            if let Some(next) = expected.get(ei + 1) {
                let attempt = session.try_compare(next, act_value, options)?;
                if attempt.is_match() {
                    index = ei + 1;
                    claimed = 0;
                    lookahead = Some(attempt);
                }
            }
        }

        let node = expected.get(index);
        let outcome = match lookahead {
            Some(outcome) => outcome,
            None => session.compare(node.unwrap_or(&absent), act_value, options)?,
        };
        let matched = outcome.is_match();

        match node {
            Some(Expected::Multi(multi)) if act.is_some() && (matched || claimed > 0) => {
                if matched {
                    claimed += 1;
                    session.tally.record(multi);
                }
                ei = index;
            }
            Some(_) => {
                ei = index + 1;
                claimed = 0;
            }
            None => {}
        }
        if act.is_some() {
            ai += 1;
        }

        match outcome {
            Outcome::Match => {
                diff.expected.push(Value::Placeholder);
                diff.actual.push(Value::Placeholder);
            }
            Outcome::Mismatch(sub) => {
                mismatched = true;
                diff.expected.push(sub.expected);
                diff.actual.push(sub.actual);
            }
        }
    }

    Ok(if mismatched { Some(diff) } else { None })
}
