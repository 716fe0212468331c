use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Scalar type of a partition key attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    String,
    Number,
    Binary,
}

impl KeyType {
    /// Single-letter type descriptor used by the managed store ("S", "N", "B").
    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for KeyType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "string" => Ok(Self::String),
            "n" | "number" => Ok(Self::Number),
            "b" | "binary" => Ok(Self::Binary),
            _ => Err(TypeError::UnknownKeyType(s.to_string())),
        }
    }
}

/// Partition key of a store. Immutable once the store exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySchema {
    /// Attribute name holding the key.
    pub name: String,
    /// Scalar type of the key attribute.
    pub key_type: KeyType,
}

impl KeySchema {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, KeyType::String)
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key_type)
    }
}

/// Provisioned read/write capacity units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Throughput {
    pub read_units: u32,
    pub write_units: u32,
}

impl Throughput {
    pub fn new(read_units: u32, write_units: u32) -> Self {
        Self {
            read_units,
            write_units,
        }
    }

    /// Sum two allocations.
    pub fn saturating_add(self, other: Throughput) -> Throughput {
        Throughput {
            read_units: self.read_units.saturating_add(other.read_units),
            write_units: self.write_units.saturating_add(other.write_units),
        }
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

/// What happens to a store when its stack is torn down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// The store and its data survive stack deletion.
    #[default]
    Retain,
    /// The store is deleted with the stack.
    Destroy,
}

/// Declaration of a keyed persistent store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDefinition {
    /// Physical store name, unique within the account.
    pub name: String,
    /// Partition key. Uniqueness of items is guaranteed on this attribute.
    pub partition_key: KeySchema,
    /// Provisioned capacity.
    pub throughput: Throughput,
    /// Teardown behavior.
    #[serde(default)]
    pub retention: RetentionPolicy,
}

impl StoreDefinition {
    pub fn new(name: impl Into<String>, partition_key: KeySchema) -> Self {
        Self {
            name: name.into(),
            partition_key,
            throughput: Throughput::default(),
            retention: RetentionPolicy::default(),
        }
    }

    pub fn with_throughput(mut self, read_units: u32, write_units: u32) -> Self {
        self.throughput = Throughput::new(read_units, write_units);
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Returns `true` if `other` declares the same key name and type.
    pub fn same_key_schema(&self, other: &StoreDefinition) -> bool {
        self.partition_key == other.partition_key
    }

    /// Check the declaration's own invariants.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_store_name(&self.name)?;
        if self.partition_key.name.trim().is_empty() {
            return Err(TypeError::EmptyKeyName {
                store: self.name.clone(),
            });
        }
        if self.throughput.read_units == 0 {
            return Err(TypeError::NonPositiveThroughput {
                store: self.name.clone(),
                kind: "read",
            });
        }
        if self.throughput.write_units == 0 {
            return Err(TypeError::NonPositiveThroughput {
                store: self.name.clone(),
                kind: "write",
            });
        }
        Ok(())
    }
}

fn validate_store_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidStoreName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.len() < 3 || name.len() > 255 {
        return Err(invalid("length must be between 3 and 255"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("only [A-Za-z0-9_.-] are allowed"));
    }
    Ok(())
}
