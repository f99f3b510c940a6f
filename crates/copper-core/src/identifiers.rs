use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::CoreError;
use crate::kinds::RecordKind;

/// Copper ids arrive as JSON numbers but are handled as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CopperId(String);

impl CopperId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CopperId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CopperId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<i64> for CopperId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for CopperId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl Serialize for CopperId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(number) => serializer.serialize_i64(number),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl From<&CopperId> for Value {
    fn from(id: &CopperId) -> Self {
        match id.0.parse::<i64>() {
            Ok(number) => Value::from(number),
            Err(_) => Value::String(id.0.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for CopperId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(value) => Ok(Self(value)),
            Value::Number(value) => Ok(Self(value.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string or numeric Copper id, found {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedKind {
    Known(RecordKind),
    /// A bare id, or a URL whose kind segment is not recognized.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierReference {
    pub kind: ParsedKind,
    pub id: CopperId,
}

/// Accepts either a bare numeric id or a Copper web URL.
///
/// Copper keeps the record route in the URL fragment
/// (`https://app.copper.com/companies/1/app#/company/42`); URLs without a
/// fragment are read from their path instead.
pub fn resolve_identifier(input: &str) -> Result<IdentifierReference, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::user_input(
            "Provide a Copper record URL or id.",
        ));
    }

    if is_numeric(trimmed) {
        return Ok(IdentifierReference {
            kind: ParsedKind::Unknown,
            id: CopperId::from(trimmed),
        });
    }

    let url = Url::parse(trimmed).map_err(|_| {
        CoreError::user_input(format!(
            "\"{trimmed}\" is not a Copper record URL or id."
        ))
    })?;

    let route = url
        .fragment()
        .filter(|fragment| !fragment.trim_matches('/').is_empty())
        .unwrap_or_else(|| url.path());
    let route = route.split(['?', '&']).next().unwrap_or_default();
    let segments = route
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    match segments.as_slice() {
        [.., kind, id] if is_numeric(id) => Ok(IdentifierReference {
            kind: RecordKind::from_key(kind)
                .map(ParsedKind::Known)
                .unwrap_or(ParsedKind::Unknown),
            id: CopperId::from(*id),
        }),
        [id] if is_numeric(id) => Ok(IdentifierReference {
            kind: ParsedKind::Unknown,
            id: CopperId::from(*id),
        }),
        _ => Err(CoreError::user_input(format!(
            "Couldn't find a record id in \"{trimmed}\". Paste the full Copper URL or just the id."
        ))),
    }
}

/// Only URLs carry a verifiable kind; bare ids are trusted as-is.
pub fn check_kind(parsed: ParsedKind, expected: RecordKind) -> Result<(), CoreError> {
    match parsed {
        ParsedKind::Known(kind) if kind != expected => Err(CoreError::user_input(format!(
            "That link points to a {}, but a {} URL or id is required.",
            kind.label(),
            expected.label()
        ))),
        _ => Ok(()),
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}
