//! Predefined field names.
//!
//! Producers are free to use any key; these are the ones shared by most
//! records and understood by the `recordlog` tool.

/// Component that produced the record.
pub const ORIGIN: &str = "origin";

/// Start of the measured operation, in epoch milliseconds.
pub const START_TIME: &str = "startTime";

/// Duration of the measured operation, in milliseconds.
pub const TIME_DELTA: &str = "timeDelta";

/// Whether the measured operation succeeded.
pub const SUCCEEDED: &str = "succeeded";
