//! The dynamically typed value exchanged over platform channels.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::error;

mod de;
mod ser;

pub use de::from_value;
pub use ser::to_value;

/// Newtype struct names used to carry typed lists and large ints through serde
/// without flattening them into plain lists and strings.
pub(crate) const LARGE_INT_TOKEN: &str = "$flust::LargeInt";
pub(crate) const I32_LIST_TOKEN: &str = "$flust::I32List";
pub(crate) const I64_LIST_TOKEN: &str = "$flust::I64List";
pub(crate) const F32_LIST_TOKEN: &str = "$flust::F32List";
pub(crate) const F64_LIST_TOKEN: &str = "$flust::F64List";

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    I32(i32),
    I64(i64),
    /// Integer that does not fit into 64 bits, in hexadecimal notation.
    LargeInt(String),
    F64(f64),
    String(String),
    U8List(Vec<u8>),
    I32List(Vec<i32>),
    I64List(Vec<i64>),
    F32List(Vec<f32>),
    F64List(Vec<f64>),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

/// Insertion ordered map keyed by arbitrary values.
///
/// The standard codec allows any value as a map key, so this cannot be a
/// `HashMap` (floats are neither `Eq` nor `Hash`). Maps on the wire are small;
/// lookups are linear.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Inserts an entry, returning the previous value stored under an equal key.
    pub fn insert<K: Into<Value>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Appends without looking for an equal key. Decoders use this so the
    /// map mirrors the wire data entry for entry.
    pub(crate) fn push(&mut self, key: Value, value: Value) {
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    pub fn get_value(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V> From<HashMap<K, V>> for ValueMap
where
    K: Into<Value> + Eq + Hash,
    V: Into<Value>,
{
    fn from(map: HashMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Boolean,
    i8 => I32,
    i16 => I32,
    i32 => I32,
    u8 => I32,
    u16 => I32,
    i64 => I64,
    u32 => I64,
    f32 => F64,
    f64 => F64,
    String => String,
    &str => String,
    Vec<u8> => U8List,
    Vec<i32> => I32List,
    Vec<i64> => I64List,
    Vec<f32> => F32List,
    Vec<f64> => F64List,
    Vec<Value> => List,
    ValueMap => Map,
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("{0}")]
    Message(String),

    #[error("invalid type: expected {expected}, found {found}")]
    InvalidType {
        expected: &'static str,
        found: &'static str,
    },
}

pub trait VecExt {
    fn push_as_value<V: Serialize>(&mut self, value: V);
}

impl VecExt for Vec<Value> {
    fn push_as_value<V: Serialize>(&mut self, value: V) {
        match to_value(value) {
            Ok(value) => self.push(value),
            Err(err) => {
                error!("Failed to convert argument to value: {}", err);
                self.push(Value::Null);
            }
        }
    }
}

/// Convenience for `from_value(value.clone())`.
pub fn from_value_ref<T: DeserializeOwned>(value: &Value) -> Result<T, ValueError> {
    from_value(value.clone())
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Boolean(_) => "bool",
        Value::I32(_) => "i32",
        Value::I64(_) => "i64",
        Value::LargeInt(_) => "large int",
        Value::F64(_) => "f64",
        Value::String(_) => "string",
        Value::U8List(_) => "u8 list",
        Value::I32List(_) => "i32 list",
        Value::I64List(_) => "i64 list",
        Value::F32List(_) => "f32 list",
        Value::F64List(_) => "f64 list",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}
