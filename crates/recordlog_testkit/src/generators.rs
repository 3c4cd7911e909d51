//! Property-based test generators using proptest.
//!
//! Every generated value survives an encode/decode round trip unchanged:
//! no nulls inside maps, finite floats only, and decimals that cannot be
//! mistaken for an integer or a double.

use proptest::prelude::*;
use recordlog_codec::{Decimal, Record, Value};

/// Strategy for record keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for text values, biased towards characters that stress framing.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        prop::string::string_regex("[a-z{}\\[\\]\"\\\\:, \n\t]{0,24}").expect("Invalid regex"),
    ]
}

/// Strategy for decimals outside the `Int` and `Float` ranges.
pub fn decimal_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        "-?[1-9][0-9]{19,29}",
        "-?(0|[1-9][0-9]{0,2})\\.[0-9]{18,24}[1-9]",
    ]
    .prop_map(|literal| Decimal::parse(&literal).expect("generated decimal"))
}

/// Strategy for scalar values that are legal in a record.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Float),
        decimal_strategy().prop_map(Value::Decimal),
        text_strategy().prop_map(Value::Text),
    ]
}

/// Strategy for values, nested up to three levels.
///
/// Lists may hold nulls; maps never do, since null map entries are not
/// written.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(prop_oneof![Just(Value::Null), inner.clone()], 0..4)
                .prop_map(Value::List),
            prop::collection::vec((key_strategy(), inner), 0..4)
                .prop_map(|pairs| pairs.into_iter().collect::<Record>().into_value()),
        ]
    })
}

/// Strategy for records with up to `max_fields` fields.
pub fn record_strategy(max_fields: usize) -> impl Strategy<Value = Record> {
    prop::collection::vec((key_strategy(), value_strategy()), 0..=max_fields)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for a batch of records.
pub fn records_strategy(max_records: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(6), 1..=max_records)
}

/// Strategy for read chunk sizes, from single bytes to large reads.
pub fn chunk_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), 2usize..16, 16usize..4096]
}
