//! Logging infrastructure for migrun.
//!
//! Two layers live here:
//!
//! - [`Diagnostics`], the verbosity-gated sink the runner and watchdog write
//!   their human-oriented progress lines to. It is built from a
//!   [`RunnerConfig`] and passed in explicitly; there is no global verbose
//!   switch.
//! - [`init`], an optional `tracing-subscriber` setup controlled by
//!   environment variables, for binaries that do not install their own
//!   subscriber.
//!
//! # Environment Variables
//!
//! - `MIGRUN_DEBUG=true` - Enable debug logging
//! - `MIGRUN_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `MIGRUN_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)

use std::env;
use std::fmt;
use std::sync::Once;

use owo_colors::OwoColorize;

use crate::config::RunnerConfig;

static INIT: Once = Once::new();

/// Target used for diagnostic lines.
pub const DIAGNOSTICS_TARGET: &str = "migrun";

/// Verbosity-gated diagnostic sink.
///
/// When disabled every call is a no-op and its arguments are never
/// formatted. When enabled, lines are emitted as `info` events on the
/// `migrun` target, optionally wrapped in gray.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    verbose: bool,
    color: bool,
}

impl Diagnostics {
    /// Create a sink with explicit flags.
    pub fn new(verbose: bool, color: bool) -> Self {
        Self { verbose, color }
    }

    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build a sink from runner configuration.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.verbose, config.color)
    }

    /// Whether diagnostic lines are emitted.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.verbose
    }

    /// Emit a diagnostic line.
    pub fn info(&self, message: impl fmt::Display) {
        if !self.verbose {
            return;
        }
        let line = self.render(message);
        tracing::info!(target: DIAGNOSTICS_TARGET, "{}", line);
    }

    /// Format a line the way [`Diagnostics::info`] would emit it.
    pub fn render(&self, message: impl fmt::Display) -> String {
        if self.color {
            message.bright_black().to_string()
        } else {
            message.to_string()
        }
    }
}

impl From<&RunnerConfig> for Diagnostics {
    fn from(config: &RunnerConfig) -> Self {
        Self::from_config(config)
    }
}

/// Check if debug logging is enabled via `MIGRUN_DEBUG`.
///
/// Returns `true` if `MIGRUN_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("MIGRUN_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `MIGRUN_LOG_LEVEL`.
///
/// Defaults to "debug" if `MIGRUN_DEBUG` is enabled, otherwise "info" so
/// verbose diagnostics are visible.
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "info" };
    match env::var("MIGRUN_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `MIGRUN_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("MIGRUN_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the migrun logging system.
///
/// Call once at startup; later calls are no-ops. Without the
/// `tracing-subscriber` feature this does nothing and events go to whatever
/// subscriber the application installs.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "migrun={},migrun_core={},migrun_sqlite={}",
                level, level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("info"));

            let result = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if result.is_ok() {
                tracing::debug!(
                    level = level,
                    format = get_log_format(),
                    "migrun logging initialized"
                );
            }
        }
    });
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let diag = Diagnostics::new(true, false);
        assert_eq!(diag.render("Begin transaction"), "Begin transaction");
    }

    #[test]
    fn test_render_gray() {
        let diag = Diagnostics::new(true, true);
        let line = diag.render("Commit transaction");
        assert!(line.starts_with("\u{1b}[90m"));
        assert!(line.contains("Commit transaction"));
        assert!(line.ends_with("\u{1b}[39m"));
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(!Diagnostics::default().is_enabled());
        assert!(!Diagnostics::disabled().is_enabled());
        // no subscriber, no panic
        Diagnostics::disabled().info(format_args!("ignored {}", 1));
    }

    #[test]
    fn test_from_config() {
        let config = RunnerConfig::new().verbose(true).color(false);
        let diag = Diagnostics::from(&config);
        assert!(diag.is_enabled());
        assert_eq!(diag, Diagnostics::new(true, false));
    }

    #[test]
    fn test_info_emits_only_when_verbose() {
        let (logs, _guard) = capture::CapturedLogs::install();

        Diagnostics::new(false, false).info("quiet line");
        Diagnostics::new(true, false).info("loud line");

        assert!(logs.lines_containing("quiet line").is_empty());
        let loud = logs.lines_containing("loud line");
        assert_eq!(loud.len(), 1);
        assert!(loud[0].contains("INFO"));
        assert!(loud[0].contains(DIAGNOSTICS_TARGET));
    }

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
