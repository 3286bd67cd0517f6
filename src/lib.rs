//! # Cheddar Proxy Rules

//! Rule engine hooks for the Cheddar Proxy traffic interceptor.
//! The proxy host hands each hook a read-only snapshot of the transaction
//! and applies the decision it returns.
//!
//! ## Features
//!
//! - Table-driven request mocking (first match wins)
//! - Response capture forwarded to a collector, fire-and-forget
//! - CONNECT intercept/tunnel decisions and local file serving
//! - TOML configuration
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Proxy host (dispatcher)                  │
//! ├─────────────────────────────────────────────────────────┤
//! │                 RuleHooks (this crate)                   │
//! │  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐  │
//! │  │ Matcher │──│ Decision │  │ Decoder  │──│ Reporter │──┼──► collector
//! │  │         │  │ Builder  │  │          │  │          │  │
//! │  └─────────┘  └──────────┘  └──────────┘  └──────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod rules;

pub use error::{RuleError, RuleResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
