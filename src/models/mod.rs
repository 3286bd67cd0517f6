//! Data models for the Cheddar Proxy rule engine
//!
//! Snapshots flow from the proxy host into hooks, decisions flow back.

pub mod decision;
pub mod snapshot;

pub use decision::*;
pub use snapshot::*;
