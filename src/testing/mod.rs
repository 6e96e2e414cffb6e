//! Test-only support code: property-based generators and checks for the
//! universal invariants every operation in this crate must uphold.
//!
//! Gated behind `#[cfg(test)]` in `lib.rs`; nothing here is part of the
//! public API.

pub mod properties;
