use super::{MessageCodec, Value};
use crate::codec::value::{kind, ValueError};
use crate::error::MessageError;

/// Plain UTF-8 strings. An empty payload is `null`.
pub struct StringCodec;

pub const STRING_CODEC: StringCodec = StringCodec;

impl MessageCodec for StringCodec {
    fn encode_message(&self, message: &Value) -> Result<Vec<u8>, MessageError> {
        match message {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(MessageError::Value(ValueError::InvalidType {
                expected: "string",
                found: kind(other),
            })),
        }
    }

    fn decode_message(&self, buf: &[u8]) -> Result<Value, MessageError> {
        if buf.is_empty() {
            return Ok(Value::Null);
        }
        Ok(Value::String(std::str::from_utf8(buf)?.to_owned()))
    }
}

/// Raw bytes, passed through unchanged as [`Value::U8List`].
pub struct BinaryCodec;

pub const BINARY_CODEC: BinaryCodec = BinaryCodec;

impl MessageCodec for BinaryCodec {
    fn encode_message(&self, message: &Value) -> Result<Vec<u8>, MessageError> {
        match message {
            Value::Null => Ok(Vec::new()),
            Value::U8List(bytes) => Ok(bytes.clone()),
            other => Err(MessageError::Value(ValueError::InvalidType {
                expected: "u8 list",
                found: kind(other),
            })),
        }
    }

    fn decode_message(&self, buf: &[u8]) -> Result<Value, MessageError> {
        Ok(Value::U8List(buf.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_codec() {
        let buf = STRING_CODEC
            .encode_message(&Value::String("AppLifecycleState.resumed".into()))
            .unwrap();
        assert_eq!(buf, b"AppLifecycleState.resumed");
        assert_eq!(
            STRING_CODEC.decode_message(&buf).unwrap(),
            Value::String("AppLifecycleState.resumed".into())
        );
        assert_eq!(STRING_CODEC.decode_message(&[]).unwrap(), Value::Null);
        assert!(STRING_CODEC.encode_message(&Value::I32(1)).is_err());
        assert!(STRING_CODEC.decode_message(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn binary_codec() {
        let buf = BINARY_CODEC
            .encode_message(&Value::U8List(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(buf, vec![1, 2, 3]);
        assert_eq!(
            BINARY_CODEC.decode_message(&buf).unwrap(),
            Value::U8List(vec![1, 2, 3])
        );
    }
}
