//! # recordlog codec
//!
//! Value model and JSON-line wire format for recordlog.
//!
//! Every record is encoded as one self-contained JSON object followed by a
//! single `\n`:
//! - Keys are text, values come from the closed [`Value`] set
//! - Null map entries are omitted; null list elements are kept
//! - Strings are escaped, so a line never contains a raw newline
//! - Numeric kind survives a round trip (integer, double or decimal)
//!
//! ## Usage
//!
//! ```
//! use recordlog_codec::{decode_record, encode_record_line, Record, Value};
//!
//! let mut record = Record::new();
//! record.put("origin", "a");
//! record.put("n", 1000);
//!
//! let line = encode_record_line(&record).unwrap();
//! assert_eq!(line, b"{\"origin\":\"a\",\"n\":1000}\n");
//!
//! let decoded = decode_record(&line).unwrap();
//! assert_eq!(decoded.get("n"), Some(&Value::Int(1000)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decimal;
mod decoder;
mod encoder;
mod error;
mod record;
mod value;

pub use decimal::Decimal;
pub use decoder::{decode_record, from_json, JsonDecoder, MAX_NESTING_DEPTH};
pub use encoder::{encode_record, encode_record_line, to_json, JsonEncoder};
pub use error::{CodecError, CodecResult};
pub use record::Record;
pub use value::Value;
