//! Rule API for proxy hosts
//!
//! Entry points a host calls at startup: initialize logging, load the rule
//! configuration and install the one rule the deployment runs.

use crate::config::RuleConfig;
use crate::rules::{DefaultRule, RuleHooks};
use anyhow::{anyhow, Context};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;

static ACTIVE_RULE: OnceCell<Arc<dyn RuleHooks>> = OnceCell::new();

/// Initialize logging (call once at startup)
/// `log_dir` is used to store log files in release mode
#[allow(unused_variables)]
pub fn init_core(log_dir: Option<String>) -> anyhow::Result<()> {
    let level = resolve_log_level();

    // Debug mode: log to console (stderr)
    #[cfg(debug_assertions)]
    {
        let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    }

    // Release mode: log to file
    #[cfg(not(debug_assertions))]
    {
        let log_dir = log_dir
            .as_ref()
            .map(|p| std::path::PathBuf::from(p).join("logs"))
            .unwrap_or_else(|| std::path::PathBuf::from("logs"));

        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, "cheddarproxy_rules");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Logging lasts until program exit
        std::mem::forget(guard);

        // The host may already have installed a subscriber
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(non_blocking)
            .try_init();
    }

    tracing::info!("Cheddar Proxy rules initialized v{}", crate::VERSION);
    Ok(())
}

fn resolve_log_level() -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter;

    match std::env::var("RUST_LOG") {
        Ok(val) => match val.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        },
        Err(_) => LevelFilter::INFO,
    }
}

/// Configuration reproducing the built-in rule
pub fn create_default_config() -> RuleConfig {
    RuleConfig::default()
}

/// Build the default rule from a TOML file, or from built-in defaults when
/// no path is given.
pub fn load_rule(config_path: Option<&Path>) -> anyhow::Result<DefaultRule> {
    let config = match config_path {
        Some(path) => RuleConfig::load(path)
            .with_context(|| format!("loading rule config from {}", path.display()))?,
        None => create_default_config(),
    };
    DefaultRule::from_config(&config).context("building rule from config")
}

/// Install the rule the host dispatches to. Only one rule may be installed
/// per process.
pub fn install_rule(rule: Arc<dyn RuleHooks>) -> anyhow::Result<()> {
    let summary = rule.summary().to_string();
    ACTIVE_RULE
        .set(rule)
        .map_err(|_| anyhow!("A rule is already installed"))?;
    tracing::info!("Installed rule: {}", summary);
    Ok(())
}

pub fn active_rule() -> Option<Arc<dyn RuleHooks>> {
    ACTIVE_RULE.get().cloned()
}
