//! JSON decoder with numeric-kind classification.

use crate::decimal::{scan_number, Decimal};
use crate::error::{CodecError, CodecResult};
use crate::record::Record;
use crate::value::Value;

/// Maximum nesting of lists and maps.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Decode a single JSON value.
///
/// Surrounding whitespace is allowed; anything else after the value is an
/// error.
///
/// # Errors
///
/// Returns an error if the bytes are not a single well-formed JSON value.
pub fn from_json(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = JsonDecoder::new(bytes);
    let value = decoder.decode()?;
    decoder.finish()?;
    Ok(value)
}

/// Decode one record from a JSON object.
///
/// Duplicate keys resolve to the last occurrence. Null fields are kept as
/// [`Value::Null`].
///
/// # Errors
///
/// Returns an error if the bytes are not a single JSON object.
pub fn decode_record(bytes: &[u8]) -> CodecResult<Record> {
    let mut decoder = JsonDecoder::new(bytes);
    let record = decoder.decode_record()?;
    decoder.finish()?;
    Ok(record)
}

/// A JSON decoder over a byte slice.
///
/// Numbers are classified so the numeric kind written by the encoder comes
/// back unchanged:
/// - integral literals become [`Value::Int`] when they fit in `i64`, and
///   [`Value::Decimal`] otherwise;
/// - literals with a fraction or exponent become [`Value::Float`] only when
///   they are exactly the shortest rendering of a finite double, and
///   [`Value::Decimal`] otherwise, so no digits are lost.
pub struct JsonDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> JsonDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        self.skip_whitespace();
        match self.peek().ok_or(CodecError::UnexpectedEof)? {
            b'{' => self.decode_map(),
            b'[' => self.decode_list(),
            b'"' => self.decode_string().map(Value::Text),
            b't' => self.expect_literal(b"true").map(|()| Value::Bool(true)),
            b'f' => self.expect_literal(b"false").map(|()| Value::Bool(false)),
            b'n' => self.expect_literal(b"null").map(|()| Value::Null),
            b'-' | b'0'..=b'9' => self.decode_number(),
            other => Err(CodecError::decoding_failed(
                self.pos,
                format!("unexpected byte 0x{other:02x}"),
            )),
        }
    }

    /// Decode the next value as a record. It must be a JSON object.
    pub fn decode_record(&mut self) -> CodecResult<Record> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => {}
            Some(_) => {
                return Err(CodecError::decoding_failed(
                    self.pos,
                    "record must be a JSON object",
                ))
            }
            None => return Err(CodecError::UnexpectedEof),
        }

        let mut record = Record::new();
        self.decode_object(|key, value| {
            record.put(key, value);
        })?;
        Ok(record)
    }

    /// Require that only whitespace remains.
    pub fn finish(&mut self) -> CodecResult<()> {
        self.skip_whitespace();
        if self.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingData { offset: self.pos })
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    #[inline]
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect_byte(&mut self, expected: u8) -> CodecResult<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(CodecError::decoding_failed(
                self.pos,
                format!("expected '{}', found 0x{b:02x}", expected as char),
            )),
            None => Err(CodecError::UnexpectedEof),
        }
    }

    fn expect_literal(&mut self, literal: &[u8]) -> CodecResult<()> {
        let end = self.pos + literal.len();
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        if &self.data[self.pos..end] != literal {
            return Err(CodecError::decoding_failed(self.pos, "invalid literal"));
        }
        self.pos = end;
        Ok(())
    }

    fn enter(&mut self) -> CodecResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CodecError::NestingTooDeep {
                max_depth: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn decode_object(&mut self, mut on_entry: impl FnMut(String, Value)) -> CodecResult<()> {
        self.enter()?;
        self.expect_byte(b'{')?;
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(());
        }

        loop {
            self.skip_whitespace();
            if self.peek() != Some(b'"') {
                return match self.peek() {
                    None => Err(CodecError::UnexpectedEof),
                    Some(_) => Err(CodecError::decoding_failed(
                        self.pos,
                        "object key must be a string",
                    )),
                };
            }
            let key = self.decode_string()?;
            self.skip_whitespace();
            self.expect_byte(b':')?;
            let value = self.decode()?;
            on_entry(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    return Err(CodecError::decoding_failed(
                        self.pos,
                        "expected ',' or '}' in object",
                    ))
                }
                None => return Err(CodecError::UnexpectedEof),
            }
        }

        self.depth -= 1;
        Ok(())
    }

    fn decode_map(&mut self) -> CodecResult<Value> {
        let mut pairs = Vec::new();
        self.decode_object(|key, value| pairs.push((Value::Text(key), value)))?;
        Ok(Value::Map(pairs))
    }

    fn decode_list(&mut self) -> CodecResult<Value> {
        self.enter()?;
        self.expect_byte(b'[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::List(items));
        }

        loop {
            items.push(self.decode()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    return Err(CodecError::decoding_failed(
                        self.pos,
                        "expected ',' or ']' in list",
                    ))
                }
                None => return Err(CodecError::UnexpectedEof),
            }
        }

        self.depth -= 1;
        Ok(Value::List(items))
    }

    fn decode_string(&mut self) -> CodecResult<String> {
        let start = self.pos;
        let mut i = start + 1;
        let mut escaped = false;

        loop {
            match self.data.get(i) {
                None => return Err(CodecError::UnexpectedEof),
                Some(b'"') => break,
                Some(b'\\') => {
                    escaped = true;
                    i += 2;
                }
                Some(&b) if b < 0x20 => {
                    return Err(CodecError::decoding_failed(
                        i,
                        "control character in string",
                    ))
                }
                Some(_) => i += 1,
            }
        }

        let raw = &self.data[start..=i];
        self.pos = i + 1;

        if escaped {
            serde_json::from_slice::<String>(raw)
                .map_err(|e| CodecError::decoding_failed(start, e.to_string()))
        } else {
            std::str::from_utf8(&raw[1..raw.len() - 1])
                .map(str::to_string)
                .map_err(|_| CodecError::InvalidUtf8 { offset: start })
        }
    }

    fn decode_number(&mut self) -> CodecResult<Value> {
        let start = self.pos;
        let scan = scan_number(&self.data[start..])
            .ok_or_else(|| CodecError::decoding_failed(start, "malformed number"))?;
        let literal = std::str::from_utf8(&self.data[start..start + scan.len])
            .map_err(|_| CodecError::InvalidUtf8 { offset: start })?;
        self.pos += scan.len;

        if scan.integral {
            if let Ok(n) = literal.parse::<i64>() {
                return Ok(Value::Int(n));
            }
        } else if let Ok(f) = literal.parse::<f64>() {
            if f.is_finite() && is_shortest_rendering(literal, f) {
                return Ok(Value::Float(f));
            }
        }

        Decimal::parse(literal)
            .map(Value::Decimal)
            .map_err(|_| CodecError::decoding_failed(start, "malformed number"))
    }
}

/// True if `literal` is exactly how the encoder renders `f`.
fn is_shortest_rendering(literal: &str, f: f64) -> bool {
    serde_json::to_string(&f).is_ok_and(|rendered| rendered == literal)
}
