//! Progress reporting for long-running statements.
//!
//! A statement that rewrites a large table can run for a long time without
//! any output. The [`Watchdog`] wraps a single executor call and, while
//! diagnostics are enabled, logs how long the call has been running at a
//! fixed interval. It only observes: the call is never cancelled, timed out
//! or retried, and its result is returned exactly as produced.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{DEFAULT_PROGRESS_INTERVAL, RunnerConfig};
use crate::executor::{StatementExecutor, Value};
use crate::logging::Diagnostics;

/// Wraps executor calls with periodic progress notices.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    diagnostics: Diagnostics,
    interval: Duration,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(Diagnostics::disabled(), DEFAULT_PROGRESS_INTERVAL)
    }
}

impl Watchdog {
    /// Create a watchdog.
    ///
    /// A zero `interval` is replaced with the default of one minute.
    pub fn new(diagnostics: Diagnostics, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_PROGRESS_INTERVAL
        } else {
            interval
        };
        Self {
            diagnostics,
            interval,
        }
    }

    /// Create a watchdog from runner configuration.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(Diagnostics::from_config(config), config.progress_interval)
    }

    /// Interval between progress notices.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Execute `statement` through `exec`, reporting progress until it returns.
    ///
    /// With diagnostics disabled this is a plain call. Otherwise the call is
    /// spawned onto its own task and the caller waits on the task handle
    /// while a timer logs the elapsed time on every tick. The first notice
    /// appears one full interval after dispatch.
    ///
    /// # Panics
    ///
    /// A panic inside the executor is resumed on the caller. If the spawned
    /// task is cancelled because the runtime is shutting down, this panics
    /// with a cancellation message, since no executor result exists.
    pub async fn watch<E>(
        &self,
        exec: &E,
        statement: &str,
        args: &[Value],
    ) -> Result<(), E::Error>
    where
        E: StatementExecutor,
    {
        if !self.diagnostics.is_enabled() {
            return exec.execute(statement, args).await;
        }

        let started = Instant::now();
        let mut handle = {
            let exec = exec.clone();
            let statement = statement.to_string();
            let args = args.to_vec();
            tokio::spawn(async move { exec.execute(&statement, &args).await })
        };

        let mut ticker = time::interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                joined = &mut handle => {
                    return match joined {
                        Ok(result) => result,
                        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                        // only reachable while the runtime shuts down
                        Err(err) => panic!("statement task was cancelled: {}", err),
                    };
                }
                _ = ticker.tick() => {
                    self.diagnostics.info(format_args!(
                        "Executing statement still in progress for {}",
                        format_elapsed(started.elapsed())
                    ));
                }
            }
        }
    }
}

/// Format a duration rounded to whole seconds, e.g. `1h2m5s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let mut secs = elapsed.as_secs();
    if elapsed.subsec_millis() >= 500 {
        secs += 1;
    }

    let (hours, rest) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
