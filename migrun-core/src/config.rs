//! Runner configuration.
//!
//! Configuration can be built in code, parsed from a TOML table, or read from
//! `MIGRUN_*` environment variables:
//!
//! ```toml
//! verbose = true
//! progress_interval = 30
//! color = false
//! table_name = "schema_versions"
//! ```

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interval between progress notices for a running statement.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Default name of the version tracking table.
pub const DEFAULT_VERSION_TABLE: &str = "migrun_db_version";

/// Configuration for the migration runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Emit diagnostic lines (transaction lifecycle, statements, progress).
    pub verbose: bool,
    /// Interval between progress notices while a statement is running.
    #[serde(with = "duration_secs")]
    pub progress_interval: Duration,
    /// Render diagnostic lines in gray.
    pub color: bool,
    /// Version tracking table used by the built-in dialects.
    pub table_name: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            color: true,
            table_name: DEFAULT_VERSION_TABLE.to_string(),
        }
    }
}

impl RunnerConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable diagnostic output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the progress notice interval.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Enable or disable gray diagnostic output.
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Set the version tracking table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let config: Self = toml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Build configuration from `MIGRUN_*` environment variables.
    ///
    /// - `MIGRUN_VERBOSE` - `true`, `1` or `yes` enables diagnostics
    /// - `MIGRUN_PROGRESS_INTERVAL_SECS` - progress interval in seconds
    /// - `MIGRUN_COLOR` - `false`, `0` or `no` disables gray output
    /// - `MIGRUN_TABLE` - version table name
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `MIGRUN_*` environment variables on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("MIGRUN_VERBOSE") {
            self.verbose = is_truthy(&v);
        }
        if let Some(secs) = env::var("MIGRUN_PROGRESS_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.progress_interval = Duration::from_secs(secs);
        }
        if let Ok(v) = env::var("MIGRUN_COLOR") {
            self.color = !matches!(v.to_lowercase().as_str(), "false" | "0" | "no");
        }
        if let Ok(v) = env::var("MIGRUN_TABLE") {
            if !v.trim().is_empty() {
                self.table_name = v.trim().to_string();
            }
        }
        self.normalized()
    }

    // tokio intervals panic on a zero period
    fn normalized(mut self) -> Self {
        if self.progress_interval.is_zero() {
            self.progress_interval = DEFAULT_PROGRESS_INTERVAL;
        }
        self
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "true" | "1" | "yes")
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
