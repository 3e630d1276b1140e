//! Fundamental types for the delegraph governance indexer.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, timestamps, and voting-power amounts.

pub mod address;
pub mod amount;
pub mod time;

pub use address::{Address, AddressParseError};
pub use amount::{u128_str, VotePower, ALLOWANCE_SCALE};
pub use time::Timestamp;
