use serde::ser::{self, Serialize, SerializeMap as _};

use super::{
    kind, Value, ValueError, ValueMap, F32_LIST_TOKEN, F64_LIST_TOKEN, I32_LIST_TOKEN,
    I64_LIST_TOKEN, LARGE_INT_TOKEN,
};

/// Converts any serializable type into a [`Value`].
///
/// Structs and maps become [`Value::Map`], sequences and tuples become
/// [`Value::List`], `None` and `()` become [`Value::Null`]. Unit enum variants
/// are written as their name; other variants as a single entry map.
pub fn to_value<T: Serialize>(value: T) -> Result<Value, ValueError> {
    value.serialize(ValueSerializer)
}

impl ser::Error for ValueError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        ValueError::Message(msg.to_string())
    }
}

impl Serialize for Value {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::LargeInt(v) => serializer.serialize_newtype_struct(LARGE_INT_TOKEN, v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::U8List(v) => serializer.serialize_bytes(v),
            Value::I32List(v) => serializer.serialize_newtype_struct(I32_LIST_TOKEN, v),
            Value::I64List(v) => serializer.serialize_newtype_struct(I64_LIST_TOKEN, v),
            Value::F32List(v) => serializer.serialize_newtype_struct(F32_LIST_TOKEN, v),
            Value::F64List(v) => serializer.serialize_newtype_struct(F64_LIST_TOKEN, v),
            Value::List(v) => v.serialize(serializer),
            Value::Map(v) => {
                let mut map = serializer.serialize_map(Some(v.len()))?;
                for (key, value) in v.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

fn typed_list<T>(
    value: Value,
    expected: &'static str,
    f: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, ValueError> {
    let Value::List(items) = value else {
        return Err(ValueError::InvalidType {
            expected,
            found: kind(&value),
        });
    };
    items
        .iter()
        .map(|item| {
            f(item).ok_or(ValueError::InvalidType {
                expected,
                found: kind(item),
            })
        })
        .collect()
}

fn large_int(negative: bool, magnitude: u128) -> Value {
    if negative {
        Value::LargeInt(format!("-{:x}", magnitude))
    } else {
        Value::LargeInt(format!("{:x}", magnitude))
    }
}

pub(crate) struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, ValueError> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, ValueError> {
        Ok(Value::I32(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, ValueError> {
        Ok(Value::I32(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, ValueError> {
        Ok(Value::I32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, ValueError> {
        Ok(Value::I64(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, ValueError> {
        match i64::try_from(v) {
            Ok(v) => Ok(Value::I64(v)),
            Err(_) => Ok(large_int(v < 0, v.unsigned_abs())),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value, ValueError> {
        Ok(Value::I32(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, ValueError> {
        Ok(Value::I32(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, ValueError> {
        match i32::try_from(v) {
            Ok(v) => Ok(Value::I32(v)),
            Err(_) => Ok(Value::I64(v.into())),
        }
    }

    fn serialize_u64(self, v: u64) -> Result<Value, ValueError> {
        match i64::try_from(v) {
            Ok(v) => Ok(Value::I64(v)),
            Err(_) => Ok(large_int(false, v.into())),
        }
    }

    fn serialize_u128(self, v: u128) -> Result<Value, ValueError> {
        match i64::try_from(v) {
            Ok(v) => Ok(Value::I64(v)),
            Err(_) => Ok(large_int(false, v)),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value, ValueError> {
        Ok(Value::F64(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, ValueError> {
        Ok(Value::F64(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, ValueError> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, ValueError> {
        Ok(Value::U8List(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value, ValueError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, ValueError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, ValueError> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        let inner = value.serialize(ValueSerializer)?;
        match name {
            LARGE_INT_TOKEN => match inner {
                Value::String(v) => Ok(Value::LargeInt(v)),
                other => Ok(other),
            },
            I32_LIST_TOKEN => typed_list(inner, "i32 list", |v| match v {
                Value::I32(v) => Some(*v),
                _ => None,
            })
            .map(Value::I32List),
            I64_LIST_TOKEN => typed_list(inner, "i64 list", Value::as_i64).map(Value::I64List),
            F32_LIST_TOKEN => typed_list(inner, "f32 list", |v| v.as_f64().map(|v| v as f32))
                .map(Value::F32List),
            F64_LIST_TOKEN => typed_list(inner, "f64 list", Value::as_f64).map(Value::F64List),
            _ => Ok(inner),
        }
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        let mut map = ValueMap::with_capacity(1);
        map.insert(variant, to_value(value)?);
        Ok(Value::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec, ValueError> {
        Ok(SerializeVec {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeVec, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, ValueError> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap, ValueError> {
        Ok(SerializeMap {
            map: ValueMap::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap, ValueError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant, ValueError> {
        Ok(SerializeStructVariant {
            variant,
            map: ValueMap::with_capacity(len),
        })
    }
}

pub(crate) struct SerializeVec {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        let mut map = ValueMap::with_capacity(1);
        map.insert(self.variant, Value::List(self.items));
        Ok(Value::Map(map))
    }
}

pub(crate) struct SerializeMap {
    map: ValueMap,
    next_key: Option<Value>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), ValueError> {
        self.next_key = Some(to_value(key)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ValueError> {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| ValueError::Message("map value without a key".to_owned()))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Map(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Map(self.map))
    }
}

pub(crate) struct SerializeStructVariant {
    variant: &'static str,
    map: ValueMap,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        let mut outer = ValueMap::with_capacity(1);
        outer.insert(self.variant, Value::Map(self.map));
        Ok(Value::Map(outer))
    }
}
