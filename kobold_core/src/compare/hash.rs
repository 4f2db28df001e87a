use super::{Diff, Outcome, Session, ABSENT};
use crate::expected::{Expected, COMPARE_KEY};
use kobold_common::{CompareOptions, HashMode, KoboldError, OptionsOverride, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Compare two mappings key by key.
///
/// The options for this mapping's subtree are the incoming options, then the
/// node's own mode, then the reserved `__compare` entry. The expected entries
/// are never modified.
pub(super) fn compare_mapping(
    session: &mut Session,
    entries: &BTreeMap<String, Expected>,
    mode: Option<&OptionsOverride>,
    actual: &BTreeMap<String, Value>,
    options: &CompareOptions,
) -> Result<Outcome, KoboldError> {
    let options = resolve_options(entries, mode, options)?;

    let mut keys: BTreeSet<&str> = entries.keys().map(String::as_str).collect();
    if options.hash == HashMode::Full {
        keys.extend(actual.keys().map(String::as_str));
    }
    keys.remove(COMPARE_KEY);

    let dont_care = Expected::dont_care();
    let absent = Expected::absent();
    let mut expected_diff = BTreeMap::new();
    let mut actual_diff = BTreeMap::new();

    for key in keys {
        let actual_value = actual.get(key).unwrap_or(&ABSENT);
        let expected_node = if options.dontcare_keys.contains(key) {
            &dont_care
        } else {
            entries.get(key).unwrap_or(&absent)
        };

        if let Outcome::Mismatch(diff) = session.compare(expected_node, actual_value, &options)? {
            expected_diff.insert(key.to_string(), diff.expected);
            actual_diff.insert(key.to_string(), diff.actual);
        }
    }

    if expected_diff.is_empty() {
        Ok(Outcome::Match)
    } else {
        Ok(Outcome::Mismatch(Diff::new(
            Value::Map(expected_diff),
            Value::Map(actual_diff),
        )))
    }
}

fn resolve_options<'a>(
    entries: &BTreeMap<String, Expected>,
    mode: Option<&OptionsOverride>,
    options: &'a CompareOptions,
) -> Result<Cow<'a, CompareOptions>, KoboldError> {
    let mut patch = mode.cloned().unwrap_or_default();
    if let Some(node) = entries.get(COMPARE_KEY) {
        let raw = node.to_value().ok_or_else(|| {
            KoboldError::Config(format!(
                "{} must hold a mode string or a mapping of options",
                COMPARE_KEY
            ))
        })?;
        patch = patch.then(&OptionsOverride::from_value(&raw)?);
    }

    if patch == OptionsOverride::default() {
        return Ok(Cow::Borrowed(options));
    }
    debug!("Mapping compared with options override {:?}", patch);
    let merged = options.merged(&patch);
    merged.validate()?;
    Ok(Cow::Owned(merged))
}
