use chrono::{DateTime, NaiveDate, NaiveDateTime};
use kobold_common::{KoboldError, Value};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Rules a [`DontCare`] can enforce on the actual value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardRule {
    /// Anything except null and the absence sentinel
    NotNullOrAbsent,
    /// A sequence-like value, optionally of an exact length
    IsSequence,
    /// A string (or UTF-8 bytes) that parses as JSON
    IsJson,
    /// A string that parses as an ISO 8601 date or datetime
    IsIso8601Datetime,
    /// A value whose runtime type name equals the `of_class` option
    IsInstanceOf,
    AcceptAnything,
}

impl WildcardRule {
    pub fn name(self) -> &'static str {
        match self {
            WildcardRule::NotNullOrAbsent => "not-null-or-absent",
            WildcardRule::IsSequence => "is-sequence",
            WildcardRule::IsJson => "is-json",
            WildcardRule::IsIso8601Datetime => "is-iso8601-datetime",
            WildcardRule::IsInstanceOf => "is-instance-of",
            WildcardRule::AcceptAnything => "accept-anything",
        }
    }
}

impl FromStr for WildcardRule {
    type Err = KoboldError;

    fn from_str(s: &str) -> Result<Self, KoboldError> {
        match s {
            "not-null-or-absent" => Ok(WildcardRule::NotNullOrAbsent),
            "is-sequence" => Ok(WildcardRule::IsSequence),
            "is-json" => Ok(WildcardRule::IsJson),
            "is-iso8601-datetime" => Ok(WildcardRule::IsIso8601Datetime),
            "is-instance-of" => Ok(WildcardRule::IsInstanceOf),
            "accept-anything" => Ok(WildcardRule::AcceptAnything),
            other => Err(KoboldError::Config(format!(
                "wildcard rule '{}' not recognized",
                other
            ))),
        }
    }
}

impl fmt::Display for WildcardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WildcardOptions {
    /// Exact length required by `is-sequence`
    pub length: Option<usize>,
    /// Type name required by `is-instance-of`
    pub of_class: Option<String>,
}

/// Expected node meaning "any actual value, as long as the rule holds".
///
/// The rule is kept by name and only resolved when a comparison runs, so an
/// unknown name surfaces as a configuration error from `compare`.
#[derive(Debug, Clone, PartialEq)]
pub struct DontCare {
    rule: String,
    options: WildcardOptions,
}

impl DontCare {
    pub fn new(rule: impl Into<String>, options: WildcardOptions) -> Result<Self, KoboldError> {
        let rule = rule.into();
        if rule == WildcardRule::IsInstanceOf.name() && options.of_class.is_none() {
            return Err(KoboldError::Config(
                "is-instance-of wildcards must have an of_class option".to_string(),
            ));
        }
        Ok(Self { rule, options })
    }

    fn with_rule(rule: WildcardRule, options: WildcardOptions) -> Self {
        Self {
            rule: rule.name().to_string(),
            options,
        }
    }

    pub fn not_null() -> Self {
        Self::with_rule(WildcardRule::NotNullOrAbsent, WildcardOptions::default())
    }

    pub fn any() -> Self {
        Self::with_rule(WildcardRule::AcceptAnything, WildcardOptions::default())
    }

    pub fn sequence(length: Option<usize>) -> Self {
        Self::with_rule(
            WildcardRule::IsSequence,
            WildcardOptions {
                length,
                ..Default::default()
            },
        )
    }

    pub fn json() -> Self {
        Self::with_rule(WildcardRule::IsJson, WildcardOptions::default())
    }

    pub fn iso8601_datetime() -> Self {
        Self::with_rule(WildcardRule::IsIso8601Datetime, WildcardOptions::default())
    }

    pub fn instance_of(class: impl Into<String>) -> Self {
        Self::with_rule(
            WildcardRule::IsInstanceOf,
            WildcardOptions {
                of_class: Some(class.into()),
                ..Default::default()
            },
        )
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn options(&self) -> &WildcardOptions {
        &self.options
    }

    /// Diff rendering of this wildcard
    pub fn label(&self) -> String {
        format!("wildcard: {}", self.rule)
    }

    pub fn accepts(&self, actual: &Value) -> Result<bool, KoboldError> {
        let rule: WildcardRule = self.rule.parse()?;
        let accepted = match rule {
            WildcardRule::NotNullOrAbsent => !actual.is_null_or_absent(),
            WildcardRule::IsSequence => match actual.elements() {
                Some(items) => self.options.length.map_or(true, |len| items.len() == len),
                None => false,
            },
            WildcardRule::IsJson => match actual {
                Value::Str(s) => serde_json::from_str::<serde_json::Value>(s).is_ok(),
                Value::Bytes(b) => serde_json::from_slice::<serde_json::Value>(b).is_ok(),
                _ => false,
            },
            WildcardRule::IsIso8601Datetime => actual.as_str().is_some_and(is_iso8601_datetime),
            WildcardRule::IsInstanceOf => {
                let class = self.options.of_class.as_deref().ok_or_else(|| {
                    KoboldError::Config(
                        "is-instance-of wildcards must have an of_class option".to_string(),
                    )
                })?;
                actual.type_name() == class
            }
            WildcardRule::AcceptAnything => true,
        };
        Ok(accepted)
    }
}

impl Default for DontCare {
    fn default() -> Self {
        Self::not_null()
    }
}

/// Extended-format layouts tried with and without a trailing UTC offset
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn basic_format() -> Option<&'static Regex> {
    static BASIC: OnceLock<Option<Regex>> = OnceLock::new();
    BASIC
        .get_or_init(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})(?:T(\d{2})(\d{2})(\d{2})?)?(.*)$").ok())
        .as_ref()
}

/// Rewrite a basic-format `20170101T000000` prefix into `2017-01-01T00:00:00`.
/// `%Y` parses greedily, so digit runs cannot be split by the format alone.
fn to_extended(s: &str) -> Cow<'_, str> {
    let Some(caps) = basic_format().and_then(|re| re.captures(s)) else {
        return Cow::Borrowed(s);
    };
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let mut out = format!("{}-{}-{}", group(1), group(2), group(3));
    if caps.get(4).is_some() {
        out.push_str(&format!("T{}:{}", group(4), group(5)));
        if caps.get(6).is_some() {
            out.push_str(&format!(":{}", group(6)));
        }
    }
    out.push_str(group(7));
    Cow::Owned(out)
}

fn is_iso8601_datetime(s: &str) -> bool {
    let s = to_extended(s.trim());
    if let Some(utc) = s.strip_suffix(['Z', 'z']) {
        return DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(utc, fmt).is_ok());
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_ok()
        || DATETIME_FORMATS.iter().any(|fmt| {
            NaiveDateTime::parse_from_str(&s, fmt).is_ok()
                || DateTime::parse_from_str(&s, &format!("{}%#z", fmt)).is_ok()
        })
}
