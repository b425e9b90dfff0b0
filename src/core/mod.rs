//! Shared primitives: errors, field encodings and bit-vector helpers.

pub mod bits;
pub mod errors;
pub mod field_utils;

pub use errors::{CircuitError, CircuitResult};
