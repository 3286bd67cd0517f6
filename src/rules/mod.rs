//! Rule engine
//!
//! Matching, canned responses, lifecycle hooks and the side-channel reporter.

pub mod builder;
pub mod decode;
pub mod hooks;
pub mod matcher;
pub mod reporter;

pub use hooks::{DefaultRule, RuleHooks};
pub use reporter::{HttpReporter, Reporter, SideChannelMessage};
