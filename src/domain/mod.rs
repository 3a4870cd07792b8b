//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Domain types plus the decoder for its backend response
//! - `wire.rs`: Positional serde visitors matching backend payloads
//! - `convert.rs`: `From` conversions from wire to domain types
//! - `state.rs`: State containers with update methods

pub mod coin;
pub mod currency;
pub mod rate;
