//! Arbitrary-precision decimal literals.

use crate::error::{CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// An arbitrary-precision number kept in its literal form.
///
/// The text is always a valid JSON number literal, so it can be written to
/// the wire verbatim and read back without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

impl Decimal {
    /// Parses a decimal literal.
    ///
    /// Accepts the JSON number grammar: an optional minus sign, an integral
    /// part without leading zeros, an optional fraction and an optional
    /// exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ValueShape`] if the text is not a number literal.
    pub fn parse(text: &str) -> CodecResult<Self> {
        match scan_number(text.as_bytes()) {
            Some(scan) if scan.len == text.len() => Ok(Self(text.to_string())),
            _ => Err(CodecError::value_shape(format!(
                "invalid decimal literal {text:?}"
            ))),
        }
    }

    /// Returns the literal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the literal has neither a fraction nor an exponent.
    pub fn is_integral(&self) -> bool {
        !self.0.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
    }

    /// Converts to the nearest double. Out-of-range values become infinite.
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }

    /// Converts to `i128` if the literal is integral and in range.
    pub fn to_i128(&self) -> Option<i128> {
        if self.is_integral() {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Consumes the decimal and returns the literal text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for Decimal {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for Decimal {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i128> for Decimal {
    fn from(n: i128) -> Self {
        Self(n.to_string())
    }
}

impl From<u128> for Decimal {
    fn from(n: u128) -> Self {
        Self(n.to_string())
    }
}

/// Result of scanning a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumberScan {
    /// Length of the literal in bytes.
    pub len: usize,
    /// Whether the literal has no fraction and no exponent.
    pub integral: bool,
}

/// Scans a JSON number literal at the start of `bytes`.
///
/// Returns `None` if `bytes` does not start with a well-formed literal.
pub(crate) fn scan_number(bytes: &[u8]) -> Option<NumberScan> {
    let mut pos = 0;
    let mut integral = true;

    if bytes.first() == Some(&b'-') {
        pos += 1;
    }

    match bytes.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => pos = skip_digits(bytes, pos),
        _ => return None,
    }

    if bytes.get(pos) == Some(&b'.') {
        integral = false;
        let end = skip_digits(bytes, pos + 1);
        if end == pos + 1 {
            return None;
        }
        pos = end;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        integral = false;
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let end = skip_digits(bytes, pos);
        if end == pos {
            return None;
        }
        pos = end;
    }

    Some(NumberScan { len: pos, integral })
}

fn skip_digits(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b'0'..=b'9')) {
        pos += 1;
    }
    pos
}
