//! Decoders applied to the actual value before it is compared.
//!
//! A decode step either produces a new [`Value`] or fails with a
//! [`DecodeError`]; the comparator treats failure as "diff the raw value".

use crate::expected::Expected;
use base64::Engine;
use flate2::read::ZlibDecoder;
use kobold_common::{DecodeError, KoboldError, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Read;

/// One decode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    /// Parse a JSON string or UTF-8 bytes
    Json,
    /// Standard base64 string or bytes into bytes
    Base64,
    /// Serialized [`Value`] bytes (see [`to_pickle`])
    Pickle,
    /// `base?query` into `{"url": base, "qs": {...}}`
    Url { query_lists: bool },
    /// Form-encoded `a=1&b=2` into a mapping
    Query { query_lists: bool },
    /// zlib-compressed bytes into bytes
    Zlib,
    /// Project the payload mapping's keys out of an object's attributes
    ObjectAttrs,
    /// All of an object's attributes as a mapping
    ObjectDict,
    /// Named tuple fields as a mapping
    NamedTuple,
}

impl Decoder {
    pub fn url() -> Self {
        Decoder::Url { query_lists: true }
    }

    pub fn query() -> Self {
        Decoder::Query { query_lists: true }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Decoder::Json => "json",
            Decoder::Base64 => "base64",
            Decoder::Pickle => "pickle",
            Decoder::Url { .. } => "url",
            Decoder::Query { .. } => "query",
            Decoder::Zlib => "zlib",
            Decoder::ObjectAttrs => "object-attrs",
            Decoder::ObjectDict => "object-dict",
            Decoder::NamedTuple => "named-tuple",
        }
    }

    /// Decode `input`. `payload` is the node the decoded value will be
    /// compared against; attribute projection reads its keys.
    pub fn decode(&self, input: &Value, payload: &Expected) -> Result<Value, DecodeError> {
        match self {
            Decoder::Json => {
                let text = text_input(self.name(), input)?;
                let parsed: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| DecodeError::malformed(self.name(), e))?;
                Ok(Value::from(parsed))
            }
            Decoder::Base64 => {
                let raw = byte_input(self.name(), input)?;
                let compact: Vec<u8> = raw
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                base64::engine::general_purpose::STANDARD
                    .decode(&compact)
                    .map(Value::Bytes)
                    .map_err(|e| DecodeError::malformed(self.name(), e))
            }
            Decoder::Pickle => {
                let raw = byte_input(self.name(), input)?;
                bincode::deserialize::<Value>(&raw)
                    .map_err(|e| DecodeError::malformed(self.name(), e))
            }
            Decoder::Url { query_lists } => {
                let text = text_input(self.name(), input)?;
                let (base, query) = match text.split_once('?') {
                    Some((base, query)) => (base, query),
                    None => (&*text, ""),
                };
                Ok(Value::map([
                    ("url", Value::from(base)),
                    ("qs", parse_query(self.name(), query, *query_lists)?),
                ]))
            }
            Decoder::Query { query_lists } => {
                let text = text_input(self.name(), input)?;
                parse_query(self.name(), &text, *query_lists)
            }
            Decoder::Zlib => {
                let raw = byte_input(self.name(), input)?;
                let mut decoder = ZlibDecoder::new(&raw[..]);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| DecodeError::malformed(self.name(), e))?;
                Ok(Value::Bytes(out))
            }
            Decoder::ObjectAttrs => {
                let attrs = match input {
                    Value::Object { attrs, .. } => attrs,
                    other => return Err(unexpected(self.name(), other)),
                };
                let keys = payload.mapping_keys().ok_or_else(|| {
                    DecodeError::malformed(self.name(), "payload must be a mapping of attribute names")
                })?;
                Ok(Value::Map(
                    keys.into_iter()
                        .map(|key| {
                            let value = attrs.get(key).cloned().unwrap_or(Value::Absent);
                            (key.to_string(), value)
                        })
                        .collect(),
                ))
            }
            Decoder::ObjectDict => match input {
                Value::Object { attrs, .. } => Ok(Value::Map(attrs.clone())),
                other => Err(unexpected(self.name(), other)),
            },
            Decoder::NamedTuple => match input {
                Value::Record { fields, .. } => Ok(Value::Map(fields.iter().cloned().collect())),
                other => Err(unexpected(self.name(), other)),
            },
        }
    }
}

/// Serialize a value into the byte form read by [`Decoder::Pickle`].
pub fn to_pickle(value: &Value) -> Result<Vec<u8>, KoboldError> {
    bincode::serialize(value).map_err(|e| KoboldError::Serialization(e.to_string()))
}

/// Expected node that decodes the actual value through `steps`, in order,
/// before comparing the result against `payload`.
#[derive(Debug, Clone)]
pub struct DecodeHint {
    steps: Vec<Decoder>,
    payload: Box<Expected>,
}

impl DecodeHint {
    pub fn new(step: Decoder, payload: impl Into<Expected>) -> Self {
        Self::chain([step], payload)
    }

    pub fn chain(steps: impl IntoIterator<Item = Decoder>, payload: impl Into<Expected>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            payload: Box::new(payload.into()),
        }
    }

    pub fn steps(&self) -> &[Decoder] {
        &self.steps
    }

    pub fn payload(&self) -> &Expected {
        &self.payload
    }

    /// Run every step. The absence sentinel passes through untouched.
    pub fn decode(&self, actual: &Value) -> Result<Value, DecodeError> {
        if actual.is_absent() {
            return Ok(Value::Absent);
        }
        let mut current = Cow::Borrowed(actual);
        for step in &self.steps {
            current = Cow::Owned(step.decode(&current, &self.payload)?);
        }
        Ok(current.into_owned())
    }
}

fn unexpected(decoder: &'static str, found: &Value) -> DecodeError {
    DecodeError::UnexpectedInput {
        decoder,
        found: found.type_name().to_string(),
    }
}

fn text_input<'a>(decoder: &'static str, input: &'a Value) -> Result<Cow<'a, str>, DecodeError> {
    match input {
        Value::Str(s) => Ok(Cow::Borrowed(s.as_str())),
        Value::Bytes(b) => std::str::from_utf8(b)
            .map(Cow::Borrowed)
            .map_err(|e| DecodeError::malformed(decoder, e)),
        other => Err(unexpected(decoder, other)),
    }
}

fn byte_input<'a>(decoder: &'static str, input: &'a Value) -> Result<Cow<'a, [u8]>, DecodeError> {
    match input {
        Value::Str(s) => Ok(Cow::Borrowed(s.as_bytes())),
        Value::Bytes(b) => Ok(Cow::Borrowed(b.as_slice())),
        other => Err(unexpected(decoder, other)),
    }
}

fn parse_query(decoder: &'static str, query: &str, query_lists: bool) -> Result<Value, DecodeError> {
    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    // Blank values (`a=` or a bare `a`) are dropped.
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        grouped
            .entry(key.into_owned())
            .or_default()
            .push(Value::Str(value.into_owned()));
    }

    let mut out = BTreeMap::new();
    for (key, mut values) in grouped {
        let value = if query_lists {
            Value::List(values)
        } else if values.len() == 1 {
            values.remove(0)
        } else {
            return Err(DecodeError::malformed(
                decoder,
                format!("query key '{}' has {} values, expected 1", key, values.len()),
            ));
        };
        out.insert(key, value);
    }
    Ok(Value::Map(out))
}
