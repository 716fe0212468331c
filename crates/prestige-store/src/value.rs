use std::collections::BTreeMap;
use std::fmt;

use prestige_types::KeyType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single attribute value.
///
/// Numbers are carried as their decimal string form so that arbitrary
/// precision survives a round trip and values stay totally ordered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null,
    L(Vec<AttributeValue>),
    M(BTreeMap<String, AttributeValue>),
}

/// A stored item: attribute name to value.
pub type Item = BTreeMap<String, AttributeValue>;

impl AttributeValue {
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn n(value: impl fmt::Display) -> Self {
        Self::N(value.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::N(n) => n.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::N(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// Key type this value can serve as, if any.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Self::S(_) => Some(KeyType::String),
            Self::N(_) => Some(KeyType::Number),
            Self::B(_) => Some(KeyType::Binary),
            _ => None,
        }
    }

    /// Convert from a JSON value. Binary data has no JSON form and is never
    /// produced.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::N(n.to_string()),
            Value::String(s) => Self::S(s.clone()),
            Value::Array(items) => Self::L(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::M(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Binary values become arrays of bytes.
    pub fn to_json(&self) -> Value {
        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => n
                .parse::<serde_json::Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(n.clone())),
            Self::B(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
            Self::L(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::M(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S(s) => write!(f, "{s:?}"),
            Self::N(n) => write!(f, "{n}"),
            Self::B(b) => write!(f, "<{} bytes>", b.len()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::N(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Convert a JSON object into an item. Non-object values yield `None`.
pub fn item_from_json(value: &Value) -> Option<Item> {
    match AttributeValue::from_json(value) {
        AttributeValue::M(map) => Some(map),
        _ => None,
    }
}

/// Convert an item into a JSON object.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(
        item.iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Precondition for a conditional write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    AttributeEquals { name: String, value: AttributeValue },
    AttributeExists(String),
    AttributeNotExists(String),
}

impl Condition {
    pub fn equals(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::AttributeEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Evaluate against the current item (`None` when absent).
    pub fn holds(&self, item: Option<&Item>) -> bool {
        match self {
            Self::AttributeEquals { name, value } => {
                item.and_then(|i| i.get(name)).is_some_and(|v| v == value)
            }
            Self::AttributeExists(name) => item.is_some_and(|i| i.contains_key(name)),
            Self::AttributeNotExists(name) => !item.is_some_and(|i| i.contains_key(name)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeEquals { name, value } => write!(f, "{name} = {value}"),
            Self::AttributeExists(name) => write!(f, "attribute_exists({name})"),
            Self::AttributeNotExists(name) => write!(f, "attribute_not_exists({name})"),
        }
    }
}
