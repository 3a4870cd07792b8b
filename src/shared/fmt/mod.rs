//! Formatting helpers for rate values.

pub mod num;
