//! Timing configuration for an extraction run.

use std::time::Duration;

/// Timeouts and intervals used by one extraction run.
///
/// Nothing here is persisted; the defaults mirror the page's observed
/// behavior and can be overridden from the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long to wait for the group-info panel to appear.
    pub panel_timeout: Duration,
    /// How long to wait for the roster dialog after clicking the
    /// disclosure control.
    pub dialog_timeout: Duration,
    /// Fixed observation window during which the operator scrolls the
    /// member list and lazily rendered rows are collected.
    pub observe_window: Duration,
    /// Poll interval for the live backend's mutation counter.
    pub mutation_poll: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panel_timeout: Duration::from_secs(15),
            dialog_timeout: Duration::from_secs(15),
            observe_window: Duration::from_secs(30),
            mutation_poll: Duration::from_millis(250),
        }
    }
}
