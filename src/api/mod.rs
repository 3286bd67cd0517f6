//! Public API surface
//!
//! This module exposes the functions a proxy host calls to set up the rule engine.

pub mod rule_api;
