use crate::{KoboldError, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the key sets of two mappings are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    /// Union of expected and actual keys; extra actual keys mismatch
    #[default]
    Full,
    /// Only the expected keys are checked
    Existing,
}

/// How unmatched list elements are judged in an unordered comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Every element on both sides must be paired
    #[default]
    Full,
    /// Every expected element must be paired; extra actual elements are ignored
    Existing,
}

impl FromStr for HashMode {
    type Err = KoboldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(HashMode::Full),
            "existing" => Ok(HashMode::Existing),
            other => Err(KoboldError::Config(format!("unknown hash mode '{}'", other))),
        }
    }
}

impl FromStr for ListMode {
    type Err = KoboldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(ListMode::Full),
            "existing" => Ok(ListMode::Existing),
            other => Err(KoboldError::Config(format!("unknown list mode '{}'", other))),
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashMode::Full => "full",
            HashMode::Existing => "existing",
        })
    }
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListMode::Full => "full",
            ListMode::Existing => "existing",
        })
    }
}

/// Fully resolved options in effect for one node of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    pub hash: HashMode,
    pub list: ListMode,
    pub ordered: bool,
    /// Mapping keys compared against the default wildcard instead of the
    /// expected value
    pub dontcare_keys: BTreeSet<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            hash: HashMode::Full,
            list: ListMode::Full,
            ordered: true,
            dontcare_keys: BTreeSet::new(),
        }
    }
}

impl CompareOptions {
    /// Apply an override; fields set on the override win.
    pub fn merged(&self, patch: &OptionsOverride) -> CompareOptions {
        CompareOptions {
            hash: patch.hash.unwrap_or(self.hash),
            list: patch.list.unwrap_or(self.list),
            ordered: patch.ordered.unwrap_or(self.ordered),
            dontcare_keys: patch
                .dontcare_keys
                .clone()
                .unwrap_or_else(|| self.dontcare_keys.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ordered && self.list == ListMode::Existing {
            return Err(KoboldError::Config(
                "ordered list comparison must use list mode \"full\", not \"existing\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial options; unset fields inherit from the enclosing comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dontcare_keys: Option<BTreeSet<String>>,
}

impl OptionsOverride {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hash(mut self, mode: HashMode) -> Self {
        self.hash = Some(mode);
        self
    }

    pub fn list(mut self, mode: ListMode) -> Self {
        self.list = Some(mode);
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    pub fn dontcare_keys<K: Into<String>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.dontcare_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Layer `other` on top of `self`; fields set on `other` win.
    pub fn then(&self, other: &OptionsOverride) -> OptionsOverride {
        OptionsOverride {
            hash: other.hash.or(self.hash),
            list: other.list.or(self.list),
            ordered: other.ordered.or(self.ordered),
            dontcare_keys: other
                .dontcare_keys
                .clone()
                .or_else(|| self.dontcare_keys.clone()),
        }
    }

    /// Read an override stored under a mapping's reserved key.
    ///
    /// A string is shorthand for the hash mode alone; a mapping may carry
    /// `hash`, `list`, `ordered` and `dontcare_keys`.
    pub fn from_value(value: &Value) -> Result<OptionsOverride> {
        match value {
            Value::Str(mode) => Ok(OptionsOverride::none().hash(mode.parse()?)),
            Value::Map(entries) => {
                let mut patch = OptionsOverride::none();
                for (key, entry) in entries {
                    match (key.as_str(), entry) {
                        ("hash", Value::Str(mode)) => patch.hash = Some(mode.parse()?),
                        ("list", Value::Str(mode)) => patch.list = Some(mode.parse()?),
                        ("ordered", Value::Bool(ordered)) => patch.ordered = Some(*ordered),
                        ("dontcare_keys", keys) => {
                            let items = keys.elements().ok_or_else(|| {
                                KoboldError::Config("dontcare_keys must be a list".to_string())
                            })?;
                            let mut set = BTreeSet::new();
                            for item in items.iter() {
                                match item {
                                    Value::Str(k) => {
                                        set.insert(k.clone());
                                    }
                                    other => {
                                        return Err(KoboldError::Config(format!(
                                            "dontcare_keys entries must be strings, got {}",
                                            other
                                        )))
                                    }
                                }
                            }
                            patch.dontcare_keys = Some(set);
                        }
                        (other, value) => {
                            return Err(KoboldError::Config(format!(
                                "invalid compare option {}={}",
                                other, value
                            )))
                        }
                    }
                }
                Ok(patch)
            }
            other => Err(KoboldError::Config(format!(
                "compare override must be a string or a mapping, got {}",
                other
            ))),
        }
    }
}

/// A bare string is shorthand for `{hash: <mode>, ordered: true}`.
impl FromStr for OptionsOverride {
    type Err = KoboldError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(OptionsOverride::none().hash(s.parse()?).ordered(true))
    }
}

impl From<HashMode> for OptionsOverride {
    fn from(mode: HashMode) -> Self {
        OptionsOverride::none().hash(mode).ordered(true)
    }
}
