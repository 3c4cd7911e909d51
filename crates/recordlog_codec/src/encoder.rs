//! JSON-line encoder.

use crate::error::{CodecError, CodecResult};
use crate::record::Record;
use crate::value::Value;

/// Encode a value to compact JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::ValueShape`] if the value contains a non-text map
/// key or a non-finite float.
pub fn to_json(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = JsonEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// Encode a record to one JSON object, without a trailing newline.
///
/// # Errors
///
/// Returns [`CodecError::ValueShape`] if a field value cannot be encoded.
pub fn encode_record(record: &Record) -> CodecResult<Vec<u8>> {
    let mut encoder = JsonEncoder::new();
    encoder.encode_record(record)?;
    Ok(encoder.into_bytes())
}

/// Encode a record to one complete line, terminated by `\n`.
///
/// # Errors
///
/// Returns [`CodecError::ValueShape`] if a field value cannot be encoded.
pub fn encode_record_line(record: &Record) -> CodecResult<Vec<u8>> {
    let mut encoder = JsonEncoder::new();
    encoder.encode_record_line(record)?;
    Ok(encoder.into_bytes())
}

/// A compact JSON encoder.
///
/// Output never contains a raw newline: strings are escaped and no
/// whitespace is emitted between tokens. Null map entries are omitted at
/// every nesting level; null list elements are kept.
///
/// The encoder owns its buffer so a sink can reuse one instance across
/// writes via [`JsonEncoder::clear`].
#[derive(Debug, Default)]
pub struct JsonEncoder {
    buffer: Vec<u8>,
}

impl JsonEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value.
    ///
    /// On error the buffer may hold a partial value; line-level callers use
    /// [`JsonEncoder::encode_record_line`], which rolls back.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => {
                self.buffer.extend_from_slice(b"null");
                Ok(())
            }
            Value::Bool(b) => {
                self.buffer
                    .extend_from_slice(if *b { b"true" } else { b"false" });
                Ok(())
            }
            Value::Int(n) => {
                self.buffer.extend_from_slice(n.to_string().as_bytes());
                Ok(())
            }
            Value::Float(f) => self.encode_float(*f),
            Value::Decimal(d) => {
                self.buffer.extend_from_slice(d.as_str().as_bytes());
                Ok(())
            }
            Value::Text(s) => self.encode_text(s),
            Value::List(items) => self.encode_list(items),
            Value::Map(pairs) => self.encode_map(pairs),
        }
    }

    /// Encode a record as a JSON object.
    pub fn encode_record(&mut self, record: &Record) -> CodecResult<()> {
        self.buffer.push(b'{');
        let mut first = true;
        for (key, value) in record.iter() {
            if value.is_null() {
                continue;
            }
            if !first {
                self.buffer.push(b',');
            }
            first = false;
            self.encode_text(key)?;
            self.buffer.push(b':');
            self.encode(value)?;
        }
        self.buffer.push(b'}');
        Ok(())
    }

    /// Append one record line to the buffer.
    ///
    /// The newline is only written once the object is complete. If encoding
    /// fails the buffer is restored to its previous length.
    pub fn encode_record_line(&mut self, record: &Record) -> CodecResult<()> {
        let start = self.buffer.len();
        match self.encode_record(record) {
            Ok(()) => {
                self.buffer.push(b'\n');
                Ok(())
            }
            Err(e) => {
                self.buffer.truncate(start);
                Err(e)
            }
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Discard encoded bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn encode_float(&mut self, f: f64) -> CodecResult<()> {
        if !f.is_finite() {
            return Err(CodecError::value_shape(format!(
                "non-finite float {f} cannot be encoded"
            )));
        }
        serde_json::to_writer(&mut self.buffer, &f)
            .map_err(|e| CodecError::value_shape(e.to_string()))
    }

    fn encode_text(&mut self, s: &str) -> CodecResult<()> {
        serde_json::to_writer(&mut self.buffer, s)
            .map_err(|e| CodecError::value_shape(e.to_string()))
    }

    fn encode_list(&mut self, items: &[Value]) -> CodecResult<()> {
        self.buffer.push(b'[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.buffer.push(b',');
            }
            self.encode(item)?;
        }
        self.buffer.push(b']');
        Ok(())
    }

    fn encode_map(&mut self, pairs: &[(Value, Value)]) -> CodecResult<()> {
        self.buffer.push(b'{');
        let mut first = true;
        for (key, value) in pairs {
            let Value::Text(key) = key else {
                return Err(CodecError::value_shape(format!(
                    "map key must be text, got {}",
                    key.kind()
                )));
            };
            if value.is_null() {
                continue;
            }
            if !first {
                self.buffer.push(b',');
            }
            first = false;
            self.encode_text(key)?;
            self.buffer.push(b':');
            self.encode(value)?;
        }
        self.buffer.push(b'}');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;

    fn text(value: &Value) -> String {
        String::from_utf8(to_json(value).unwrap()).unwrap()
    }

    #[test]
    fn encode_scalars() {
        assert_eq!(text(&Value::Null), "null");
        assert_eq!(text(&Value::Bool(true)), "true");
        assert_eq!(text(&Value::Int(-42)), "-42");
        assert_eq!(text(&Value::Int(i64::MIN)), "-9223372036854775808");
        assert_eq!(text(&Value::Float(1.5)), "1.5");
        assert_eq!(text(&Value::Float(3.0)), "3.0");
        assert_eq!(
            text(&Value::Decimal(Decimal::parse("1.000000000000000000001").unwrap())),
            "1.000000000000000000001"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(text(&Value::from("a\"b\\c")), r#""a\"b\\c""#);
        assert_eq!(text(&Value::from("line1\nline2")), r#""line1\nline2""#);
        assert_eq!(text(&Value::from("\u{1}")), r#""\u0001""#);
    }

    #[test]
    fn null_map_entries_are_omitted() {
        let value = Value::object([
            ("a", Value::Null),
            ("b", Value::Int(1)),
            ("c", Value::List(vec![Value::Null])),
            ("d", Value::object([("inner", Value::Null)])),
        ]);
        assert_eq!(text(&value), r#"{"b":1,"c":[null],"d":{}}"#);
    }

    #[test]
    fn non_text_key_is_rejected() {
        let value = Value::Map(vec![(Value::Int(1), Value::Bool(true))]);
        let err = to_json(&value).unwrap_err();
        assert!(err.is_value_shape());
    }

    #[test]
    fn non_finite_float_is_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(to_json(&Value::Float(f)).unwrap_err().is_value_shape());
        }
    }

    #[test]
    fn record_line_has_single_trailing_newline() {
        let mut record = Record::new();
        record.put("origin", "multi\nline");
        record.put("n", 1000);
        record.put("skip", Value::Null);

        let line = encode_record_line(&record).unwrap();
        assert_eq!(line, b"{\"origin\":\"multi\\nline\",\"n\":1000}\n");
        assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn failed_line_rolls_back_buffer() {
        let mut encoder = JsonEncoder::new();
        let mut good = Record::new();
        good.put("a", 1);
        encoder.encode_record_line(&good).unwrap();
        let before = encoder.as_bytes().to_vec();

        let mut bad = Record::new();
        bad.put("x", 1);
        bad.put("f", f64::NAN);
        assert!(encoder.encode_record_line(&bad).is_err());
        assert_eq!(encoder.as_bytes(), &before[..]);
    }

    #[test]
    fn empty_record() {
        assert_eq!(encode_record(&Record::new()).unwrap(), b"{}");
    }
}
