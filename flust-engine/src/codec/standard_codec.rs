//! The engine's standard binary codec.
//!
//! Every value is prefixed with a one byte type tag. Strings, lists and maps
//! carry a variable width size. Numeric payloads wider than a byte are
//! padded so they start at a multiple of their element width, counted from
//! the start of the whole message, which lets the receiving side read them in
//! place.
//!
//! Multi-byte quantities are written in host byte order. The engine lives in
//! the same process and uses the same convention, so both ends always agree.

use byteorder::{ByteOrder, NativeEndian};

use super::value::ValueMap;
use super::{MessageCodec, MethodCallData, MethodCallResult, MethodCodec, Value};
use crate::error::{MessageError, MethodCallError};

const VALUE_NULL: u8 = 0;
const VALUE_TRUE: u8 = 1;
const VALUE_FALSE: u8 = 2;
const VALUE_INT32: u8 = 3;
const VALUE_INT64: u8 = 4;
const VALUE_LARGE_INT: u8 = 5;
const VALUE_FLOAT64: u8 = 6;
const VALUE_STRING: u8 = 7;
const VALUE_UINT8_LIST: u8 = 8;
const VALUE_INT32_LIST: u8 = 9;
const VALUE_INT64_LIST: u8 = 10;
const VALUE_FLOAT64_LIST: u8 = 11;
const VALUE_LIST: u8 = 12;
const VALUE_MAP: u8 = 13;
const VALUE_FLOAT32_LIST: u8 = 14;

const SIZE_U16_MARKER: u8 = 254;
const SIZE_U32_MARKER: u8 = 255;

/// Lists and maps deeper than this are refused instead of exhausting the stack.
pub const MAX_NESTING: usize = 128;

const ENVELOPE_SUCCESS: u8 = 0;
const ENVELOPE_ERROR: u8 = 1;

pub struct StandardCodec;

pub const STANDARD_CODEC: StandardCodec = StandardCodec;

impl MessageCodec for StandardCodec {
    fn encode_message(&self, message: &Value) -> Result<Vec<u8>, MessageError> {
        let mut writer = Writer::new();
        writer.write_value(message)?;
        Ok(writer.finish())
    }

    fn decode_message(&self, buf: &[u8]) -> Result<Value, MessageError> {
        if buf.is_empty() {
            return Ok(Value::Null);
        }
        let mut reader = Reader::new(buf);
        let value = reader.read_value()?;
        reader.finish()?;
        Ok(value)
    }
}

impl MethodCodec for StandardCodec {
    fn encode_method_call(&self, call: &MethodCallData) -> Result<Vec<u8>, MessageError> {
        let mut writer = Writer::new();
        writer.write_string(VALUE_STRING, &call.method)?;
        writer.write_value(&call.args)?;
        Ok(writer.finish())
    }

    fn decode_method_call(&self, buf: &[u8]) -> Result<MethodCallData, MessageError> {
        let mut reader = Reader::new(buf);
        let Value::String(method) = reader.read_value()? else {
            return Err(MessageError::InvalidMethodCall(
                "method name is not a string".to_owned(),
            ));
        };
        let args = if reader.is_done() {
            Value::Null
        } else {
            reader.read_value()?
        };
        reader.finish()?;
        Ok(MethodCallData { method, args })
    }

    fn encode_success_envelope(&self, result: &Value) -> Result<Vec<u8>, MessageError> {
        let mut writer = Writer::new();
        writer.write_u8(ENVELOPE_SUCCESS);
        writer.write_value(result)?;
        Ok(writer.finish())
    }

    fn encode_error_envelope(
        &self,
        code: &str,
        message: Option<&str>,
        details: &Value,
    ) -> Result<Vec<u8>, MessageError> {
        let mut writer = Writer::new();
        writer.write_u8(ENVELOPE_ERROR);
        writer.write_string(VALUE_STRING, code)?;
        match message {
            Some(message) => writer.write_string(VALUE_STRING, message)?,
            None => writer.write_u8(VALUE_NULL),
        }
        writer.write_value(details)?;
        Ok(writer.finish())
    }

    fn decode_envelope(&self, buf: &[u8]) -> Result<MethodCallResult, MessageError> {
        let mut reader = Reader::new(buf);
        match reader.read_u8()? {
            ENVELOPE_SUCCESS => {
                let value = reader.read_value()?;
                reader.finish()?;
                Ok(Ok(value))
            }
            ENVELOPE_ERROR => {
                let Value::String(code) = reader.read_value()? else {
                    return Err(MessageError::InvalidEnvelope);
                };
                let message = match reader.read_value()? {
                    Value::String(message) => Some(message),
                    Value::Null => None,
                    _ => return Err(MessageError::InvalidEnvelope),
                };
                let details = reader.read_value()?;
                // Newer engines append a stack trace.
                if !reader.is_done() {
                    reader.read_value()?;
                }
                reader.finish()?;
                Ok(Err(MethodCallError {
                    code,
                    message,
                    details,
                }))
            }
            _ => Err(MessageError::InvalidEnvelope),
        }
    }
}

struct Writer {
    buf: Vec<u8>,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            depth: 0,
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), MessageError>,
    ) -> Result<(), MessageError> {
        if self.depth == MAX_NESTING {
            return Err(MessageError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn extend(&mut self, len: usize) -> &mut [u8] {
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        &mut self.buf[start..]
    }

    fn align(&mut self, alignment: usize) {
        let padding = (alignment - self.buf.len() % alignment) % alignment;
        self.extend(padding);
    }

    fn write_size(&mut self, size: usize) -> Result<(), MessageError> {
        if size < SIZE_U16_MARKER as usize {
            self.write_u8(size as u8);
        } else if let Ok(size) = u16::try_from(size) {
            self.write_u8(SIZE_U16_MARKER);
            NativeEndian::write_u16(self.extend(2), size);
        } else if let Ok(size) = u32::try_from(size) {
            self.write_u8(SIZE_U32_MARKER);
            NativeEndian::write_u32(self.extend(4), size);
        } else {
            return Err(MessageError::SizeOverflow(size));
        }
        Ok(())
    }

    fn write_string(&mut self, tag: u8, v: &str) -> Result<(), MessageError> {
        self.write_u8(tag);
        self.write_size(v.len())?;
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<(), MessageError> {
        match value {
            Value::Null => self.write_u8(VALUE_NULL),
            Value::Boolean(true) => self.write_u8(VALUE_TRUE),
            Value::Boolean(false) => self.write_u8(VALUE_FALSE),
            Value::I32(v) => {
                self.write_u8(VALUE_INT32);
                NativeEndian::write_i32(self.extend(4), *v);
            }
            Value::I64(v) => {
                self.write_u8(VALUE_INT64);
                NativeEndian::write_i64(self.extend(8), *v);
            }
            Value::LargeInt(v) => self.write_string(VALUE_LARGE_INT, v)?,
            Value::F64(v) => {
                self.write_u8(VALUE_FLOAT64);
                self.align(8);
                NativeEndian::write_f64(self.extend(8), *v);
            }
            Value::String(v) => self.write_string(VALUE_STRING, v)?,
            Value::U8List(v) => {
                self.write_u8(VALUE_UINT8_LIST);
                self.write_size(v.len())?;
                self.buf.extend_from_slice(v);
            }
            Value::I32List(v) => {
                self.write_u8(VALUE_INT32_LIST);
                self.write_size(v.len())?;
                self.align(4);
                NativeEndian::write_i32_into(v, self.extend(v.len() * 4));
            }
            Value::I64List(v) => {
                self.write_u8(VALUE_INT64_LIST);
                self.write_size(v.len())?;
                self.align(8);
                NativeEndian::write_i64_into(v, self.extend(v.len() * 8));
            }
            Value::F32List(v) => {
                self.write_u8(VALUE_FLOAT32_LIST);
                self.write_size(v.len())?;
                self.align(4);
                NativeEndian::write_f32_into(v, self.extend(v.len() * 4));
            }
            Value::F64List(v) => {
                self.write_u8(VALUE_FLOAT64_LIST);
                self.write_size(v.len())?;
                self.align(8);
                NativeEndian::write_f64_into(v, self.extend(v.len() * 8));
            }
            Value::List(v) => {
                self.write_u8(VALUE_LIST);
                self.write_size(v.len())?;
                self.nested(|w| v.iter().try_for_each(|item| w.write_value(item)))?;
            }
            Value::Map(v) => {
                self.write_u8(VALUE_MAP);
                self.write_size(v.len())?;
                self.nested(|w| {
                    v.iter().try_for_each(|(key, value)| {
                        w.write_value(key)?;
                        w.write_value(value)
                    })
                })?;
            }
        }
        Ok(())
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, MessageError>,
    ) -> Result<T, MessageError> {
        if self.depth == MAX_NESTING {
            return Err(MessageError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn is_done(&self) -> bool {
        self.remaining() == 0
    }

    fn finish(&self) -> Result<(), MessageError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(MessageError::TrailingBytes(n)),
        }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], MessageError> {
        if len > self.remaining() {
            return Err(MessageError::UnexpectedEof);
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, MessageError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn align(&mut self, alignment: usize) -> Result<(), MessageError> {
        let padding = (alignment - self.pos % alignment) % alignment;
        self.read_bytes(padding)?;
        Ok(())
    }

    fn read_size(&mut self) -> Result<usize, MessageError> {
        match self.read_u8()? {
            SIZE_U16_MARKER => Ok(NativeEndian::read_u16(self.read_bytes(2)?) as usize),
            SIZE_U32_MARKER => Ok(NativeEndian::read_u32(self.read_bytes(4)?) as usize),
            size => Ok(size as usize),
        }
    }

    fn read_array(&mut self, width: usize) -> Result<(usize, &'a [u8]), MessageError> {
        let len = self.read_size()?;
        self.align(width)?;
        let bytes = len
            .checked_mul(width)
            .ok_or(MessageError::UnexpectedEof)
            .and_then(|size| self.read_bytes(size))?;
        Ok((len, bytes))
    }

    fn read_string(&mut self) -> Result<String, MessageError> {
        let len = self.read_size()?;
        let bytes = self.read_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    fn read_value(&mut self) -> Result<Value, MessageError> {
        let value = match self.read_u8()? {
            VALUE_NULL => Value::Null,
            VALUE_TRUE => Value::Boolean(true),
            VALUE_FALSE => Value::Boolean(false),
            VALUE_INT32 => Value::I32(NativeEndian::read_i32(self.read_bytes(4)?)),
            VALUE_INT64 => Value::I64(NativeEndian::read_i64(self.read_bytes(8)?)),
            VALUE_LARGE_INT => Value::LargeInt(self.read_string()?),
            VALUE_FLOAT64 => {
                self.align(8)?;
                Value::F64(NativeEndian::read_f64(self.read_bytes(8)?))
            }
            VALUE_STRING => Value::String(self.read_string()?),
            VALUE_UINT8_LIST => {
                let len = self.read_size()?;
                Value::U8List(self.read_bytes(len)?.to_vec())
            }
            VALUE_INT32_LIST => {
                let (len, bytes) = self.read_array(4)?;
                let mut list = vec![0; len];
                NativeEndian::read_i32_into(bytes, &mut list);
                Value::I32List(list)
            }
            VALUE_INT64_LIST => {
                let (len, bytes) = self.read_array(8)?;
                let mut list = vec![0; len];
                NativeEndian::read_i64_into(bytes, &mut list);
                Value::I64List(list)
            }
            VALUE_FLOAT32_LIST => {
                let (len, bytes) = self.read_array(4)?;
                let mut list = vec![0.0; len];
                NativeEndian::read_f32_into(bytes, &mut list);
                Value::F32List(list)
            }
            VALUE_FLOAT64_LIST => {
                let (len, bytes) = self.read_array(8)?;
                let mut list = vec![0.0; len];
                NativeEndian::read_f64_into(bytes, &mut list);
                Value::F64List(list)
            }
            VALUE_LIST => {
                let len = self.read_size()?;
                let mut list = Vec::with_capacity(len.min(self.remaining()));
                self.nested(|r| {
                    for _ in 0..len {
                        list.push(r.read_value()?);
                    }
                    Ok(())
                })?;
                Value::List(list)
            }
            VALUE_MAP => {
                let len = self.read_size()?;
                let mut map = ValueMap::with_capacity(len.min(self.remaining()));
                self.nested(|r| {
                    for _ in 0..len {
                        let key = r.read_value()?;
                        let value = r.read_value()?;
                        map.push(key, value);
                    }
                    Ok(())
                })?;
                Value::Map(map)
            }
            tag => return Err(MessageError::UnknownType(tag)),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        STANDARD_CODEC.encode_message(value).unwrap()
    }

    fn decode(buf: &[u8]) -> Value {
        STANDARD_CODEC.decode_message(buf).unwrap()
    }

    fn size_prefix(buf: &[u8]) -> &[u8] {
        match buf[1] {
            SIZE_U16_MARKER => &buf[1..4],
            SIZE_U32_MARKER => &buf[1..6],
            _ => &buf[1..2],
        }
    }

    #[test]
    fn round_trip_every_variant() {
        let mut map = ValueMap::new();
        map.insert("key", Value::I32(-1));
        map.insert(Value::I64(7), Value::List(vec![Value::Null, Value::F64(0.5)]));

        let values = vec![
            Value::Null,
            Value::Boolean(true),
            Value::Boolean(false),
            Value::I32(i32::MIN),
            Value::I64(i64::MAX),
            Value::LargeInt("-1fffffffffffffffff".to_owned()),
            Value::F64(-3.25),
            Value::String("héllo".to_owned()),
            Value::U8List(vec![0, 1, 255]),
            Value::I32List(vec![1, -2, 3]),
            Value::I64List(vec![i64::MIN, 0]),
            Value::F32List(vec![1.5, -0.25]),
            Value::F64List(vec![f64::MAX, f64::MIN_POSITIVE]),
            Value::List(vec![Value::String("x".to_owned()), Value::I32List(vec![9])]),
            Value::Map(map),
        ];

        for value in values {
            assert_eq!(decode(&encode(&value)), value, "{:?}", value);
        }
    }

    #[test]
    fn nan_round_trips_as_nan() {
        let Value::F64(v) = decode(&encode(&Value::F64(f64::NAN))) else {
            panic!("expected f64");
        };
        assert!(v.is_nan());

        let Value::F64List(list) = decode(&encode(&Value::F64List(vec![f64::NAN, 1.0]))) else {
            panic!("expected f64 list");
        };
        assert!(list[0].is_nan());
        assert_eq!(list[1], 1.0);
    }

    #[test]
    fn empty_message_is_null() {
        assert_eq!(decode(&[]), Value::Null);
    }

    #[test]
    fn float_after_odd_length_value_is_aligned() {
        let value = Value::List(vec![Value::String("a".to_owned()), Value::F64(1.5)]);
        let buf = encode(&value);

        // list tag, size, string tag, size, 'a', float tag, two padding bytes, payload
        assert_eq!(buf.len(), 16);
        assert_eq!(buf[5], VALUE_FLOAT64);
        assert_eq!(&buf[6..8], &[0, 0]);
        assert_eq!(NativeEndian::read_f64(&buf[8..16]), 1.5);
        assert_eq!(decode(&buf), value);
    }

    #[test]
    fn top_level_float_is_aligned_to_eight() {
        let buf = encode(&Value::F64(2.0));
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[1..8], &[0; 7]);
    }

    #[test]
    fn typed_list_payloads_are_aligned() {
        let buf = encode(&Value::I32List(vec![1, 2]));
        // tag, size, 2 bytes padding
        assert_eq!(&buf[..4], &[VALUE_INT32_LIST, 2, 0, 0]);
        assert_eq!(NativeEndian::read_i32(&buf[4..8]), 1);

        let buf = encode(&Value::I64List(vec![5]));
        assert_eq!(&buf[..8], &[VALUE_INT64_LIST, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(NativeEndian::read_i64(&buf[8..16]), 5);
    }

    #[test]
    fn size_encoding_boundaries() {
        let buf = encode(&Value::U8List(vec![0; 253]));
        assert_eq!(size_prefix(&buf), &[253]);
        assert_eq!(buf.len(), 1 + 1 + 253);

        let buf = encode(&Value::U8List(vec![0; 254]));
        assert_eq!(buf[1], SIZE_U16_MARKER);
        assert_eq!(NativeEndian::read_u16(&buf[2..4]), 254);
        assert_eq!(buf.len(), 1 + 3 + 254);

        let buf = encode(&Value::U8List(vec![0; 0xFFFF]));
        assert_eq!(buf[1], SIZE_U16_MARKER);
        assert_eq!(NativeEndian::read_u16(&buf[2..4]), 0xFFFF);
        assert_eq!(buf.len(), 1 + 3 + 0xFFFF);

        let buf = encode(&Value::U8List(vec![0; 0x10000]));
        assert_eq!(buf[1], SIZE_U32_MARKER);
        assert_eq!(NativeEndian::read_u32(&buf[2..6]), 0x10000);
        assert_eq!(buf.len(), 1 + 5 + 0x10000);

        for len in [253, 254, 0xFFFF, 0x10000] {
            let value = Value::U8List(vec![7; len]);
            assert_eq!(decode(&encode(&value)), value);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = STANDARD_CODEC.decode_message(&[42]).unwrap_err();
        assert!(matches!(err, MessageError::UnknownType(42)));
    }

    #[test]
    fn truncated_buffers_are_rejected() {
        let buf = encode(&Value::String("hello".to_owned()));
        for len in 1..buf.len() {
            let err = STANDARD_CODEC.decode_message(&buf[..len]).unwrap_err();
            assert!(matches!(err, MessageError::UnexpectedEof), "{}", len);
        }

        // Declares a huge list without any content.
        let err = STANDARD_CODEC
            .decode_message(&[VALUE_LIST, SIZE_U32_MARKER, 0xff, 0xff, 0xff, 0x7f])
            .unwrap_err();
        assert!(matches!(err, MessageError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = STANDARD_CODEC
            .decode_message(&[VALUE_TRUE, VALUE_TRUE])
            .unwrap_err();
        assert!(matches!(err, MessageError::TrailingBytes(1)));
    }

    #[test]
    fn method_call_round_trip() {
        let call = MethodCallData::new("listen", Value::I32List(vec![1, 2, 3]));
        let buf = STANDARD_CODEC.encode_method_call(&call).unwrap();
        assert_eq!(STANDARD_CODEC.decode_method_call(&buf).unwrap(), call);

        let err = STANDARD_CODEC
            .decode_method_call(&encode(&Value::I32(1)))
            .unwrap_err();
        assert!(matches!(err, MessageError::InvalidMethodCall(_)));
    }

    #[test]
    fn envelopes() {
        let buf = STANDARD_CODEC
            .encode_success_envelope(&Value::F64(0.5))
            .unwrap();
        assert_eq!(buf[0], ENVELOPE_SUCCESS);
        // tag 0 shares the alignment base with the payload
        assert_eq!(buf.len(), 16);
        assert_eq!(
            STANDARD_CODEC.decode_envelope(&buf).unwrap(),
            Ok(Value::F64(0.5))
        );

        let buf = STANDARD_CODEC
            .encode_error_envelope("bad", Some("went wrong"), &Value::I32(3))
            .unwrap();
        assert_eq!(
            STANDARD_CODEC.decode_envelope(&buf).unwrap(),
            Err(MethodCallError::new("bad", "went wrong", Value::I32(3)))
        );

        let buf = STANDARD_CODEC
            .encode_error_envelope("bad", None, &Value::Null)
            .unwrap();
        let Err(err) = STANDARD_CODEC.decode_envelope(&buf).unwrap() else {
            panic!("expected error envelope");
        };
        assert_eq!(err.message, None);
    }

    #[test]
    fn error_envelope_with_stack_trace() {
        let mut buf = STANDARD_CODEC
            .encode_error_envelope("code", Some("message"), &Value::Null)
            .unwrap();
        buf.extend(encode(&Value::String("#0 main".to_owned())));
        assert!(STANDARD_CODEC.decode_envelope(&buf).unwrap().is_err());
    }

    #[test]
    fn deep_nesting_is_refused() {
        let mut buf = [VALUE_LIST, 1].repeat(200_000);
        buf.push(VALUE_NULL);
        let err = STANDARD_CODEC.decode_message(&buf).unwrap_err();
        assert!(matches!(err, MessageError::NestingTooDeep(MAX_NESTING)));

        // The limit itself is still accepted.
        let mut buf = [VALUE_LIST, 1].repeat(MAX_NESTING);
        buf.push(VALUE_NULL);
        assert!(STANDARD_CODEC.decode_message(&buf).is_ok());

        let mut value = Value::Null;
        for _ in 0..=MAX_NESTING {
            value = Value::List(vec![value]);
        }
        let err = STANDARD_CODEC.encode_message(&value).unwrap_err();
        assert!(matches!(err, MessageError::NestingTooDeep(MAX_NESTING)));
    }

    #[test]
    fn map_keeps_every_wire_entry() {
        let buf = [VALUE_MAP, 2, VALUE_NULL, VALUE_TRUE, VALUE_NULL, VALUE_FALSE];
        let Value::Map(map) = decode(&buf) else {
            panic!("expected map");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(encode(&Value::Map(map)), buf);
    }

    #[test]
    fn large_map_decodes() {
        let mut map = ValueMap::with_capacity(40_000);
        for i in 0..40_000 {
            map.push(Value::I32(i), Value::I32(i));
        }
        let value = Value::Map(map);
        assert_eq!(decode(&encode(&value)), value);
    }

    #[test]
    fn invalid_envelope_tag() {
        let err = STANDARD_CODEC.decode_envelope(&[7]).unwrap_err();
        assert!(matches!(err, MessageError::InvalidEnvelope));
    }
}
