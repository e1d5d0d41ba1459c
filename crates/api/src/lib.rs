//! Evidence API client.
//!
//! Async HTTP client using `reqwest`. Covers upload negotiation, direct
//! writes to presigned destinations, completion, manifest verification and
//! audit replay.

pub mod client;

pub use casevault_transfer::ProgressFn;
pub use client::{Client, Error};
