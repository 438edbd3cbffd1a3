//! Runtime values produced and consumed by the evaluator.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

use crate::error::EvalError;
use crate::extensions::{Datetime, Decimal, Duration, IpAddr};

use super::EntityUid;

/// The intrinsic type tag of a [`Value`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    StrumDisplay,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Bool,
    Long,
    String,
    Set,
    Record,
    Entity,
    IpAddr,
    Decimal,
    Datetime,
    Duration,
}

/// Attribute maps, used both for records and for entity attributes.
pub type Record = BTreeMap<String, Value>;

/// An unordered collection of values, duplicates removed by structural equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Value>", into = "Vec<Value>")]
pub struct Set(Vec<Value>);

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// True if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Set) -> bool {
        self.0.iter().all(|v| other.contains(v))
    }

    /// True if the two sets share at least one element.
    pub fn intersects(&self, other: &Set) -> bool {
        self.0.iter().any(|v| other.contains(v))
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl Eq for Set {}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut out: Vec<Value> = Vec::new();
        for value in iter {
            if !out.contains(&value) {
                out.push(value);
            }
        }
        Set(out)
    }
}

impl From<Vec<Value>> for Set {
    fn from(values: Vec<Value>) -> Self {
        values.into_iter().collect()
    }
}

impl From<Set> for Vec<Value> {
    fn from(set: Set) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A value in the policy language.
///
/// Equality is structural and never crosses type tags: `Long(1)` and
/// `String("1")` are simply unequal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Long(i64),
    String(String),
    Set(Set),
    Record(Record),
    Entity(EntityUid),
    IpAddr(IpAddr),
    Decimal(Decimal),
    Datetime(Datetime),
    Duration(Duration),
}

impl Value {
    pub fn type_of(&self) -> Type {
        match self {
            Value::Bool(_) => Type::Bool,
            Value::Long(_) => Type::Long,
            Value::String(_) => Type::String,
            Value::Set(_) => Type::Set,
            Value::Record(_) => Type::Record,
            Value::Entity(_) => Type::Entity,
            Value::IpAddr(_) => Type::IpAddr,
            Value::Decimal(_) => Type::Decimal,
            Value::Datetime(_) => Type::Datetime,
            Value::Duration(_) => Type::Duration,
        }
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(values.into_iter().collect())
    }

    pub fn record<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::type_mismatch([Type::Bool], other.type_of())),
        }
    }

    pub fn as_long(&self) -> Result<i64, EvalError> {
        match self {
            Value::Long(n) => Ok(*n),
            other => Err(EvalError::type_mismatch([Type::Long], other.type_of())),
        }
    }

    pub fn as_str(&self) -> Result<&str, EvalError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(EvalError::type_mismatch([Type::String], other.type_of())),
        }
    }

    pub fn as_set(&self) -> Result<&Set, EvalError> {
        match self {
            Value::Set(s) => Ok(s),
            other => Err(EvalError::type_mismatch([Type::Set], other.type_of())),
        }
    }

    pub fn as_entity(&self) -> Result<&EntityUid, EvalError> {
        match self {
            Value::Entity(uid) => Ok(uid),
            other => Err(EvalError::type_mismatch([Type::Entity], other.type_of())),
        }
    }

    pub fn as_ipaddr(&self) -> Result<&IpAddr, EvalError> {
        match self {
            Value::IpAddr(ip) => Ok(ip),
            other => Err(EvalError::type_mismatch([Type::IpAddr], other.type_of())),
        }
    }

    pub fn as_decimal(&self) -> Result<Decimal, EvalError> {
        match self {
            Value::Decimal(d) => Ok(*d),
            other => Err(EvalError::type_mismatch([Type::Decimal], other.type_of())),
        }
    }

    pub fn as_datetime(&self) -> Result<Datetime, EvalError> {
        match self {
            Value::Datetime(d) => Ok(*d),
            other => Err(EvalError::type_mismatch([Type::Datetime], other.type_of())),
        }
    }

    pub fn as_duration(&self) -> Result<Duration, EvalError> {
        match self {
            Value::Duration(d) => Ok(*d),
            other => Err(EvalError::type_mismatch([Type::Duration], other.type_of())),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Set(set) => write!(f, "[{}]", set.iter().join(", ")),
            Value::Record(record) => write!(
                f,
                "{{{}}}",
                record.iter().map(|(k, v)| format!("{k:?}: {v}")).join(", ")
            ),
            Value::Entity(uid) => write!(f, "{uid}"),
            Value::IpAddr(ip) => write!(f, "ip(\"{ip}\")"),
            Value::Decimal(d) => write!(f, "decimal(\"{d}\")"),
            Value::Datetime(d) => write!(f, "datetime(\"{d}\")"),
            Value::Duration(d) => write!(f, "duration(\"{d}\")"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<EntityUid> for Value {
    fn from(uid: EntityUid) -> Self {
        Value::Entity(uid)
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Value::Set(set)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}
