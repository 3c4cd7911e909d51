//! CLI command implementations.

pub mod compress;
pub mod dump;
pub mod verify;
