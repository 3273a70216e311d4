//! Error types shared across the extraction pipeline.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by DOM backends, the wait primitive, and the export path.
#[derive(Debug, Error)]
pub enum Error {
    /// No element matched the selector before the deadline.
    #[error("timed out after {}ms waiting for `{selector}`", .timeout.as_millis())]
    WaitTimeout { selector: String, timeout: Duration },

    /// The underlying page backend failed (CDP transport, JS evaluation, ...).
    #[error("page backend error: {0}")]
    Backend(String),

    /// A node handle no longer resolves against the current document.
    #[error("stale node handle")]
    StaleNode,

    /// The selector could not be parsed.
    #[error("invalid selector `{0}`")]
    Selector(String),

    /// Writing the export file failed.
    #[error("csv export failed: {0}")]
    Export(#[from] std::io::Error),

    /// The export file could not be parsed back.
    #[error("malformed csv: {0}")]
    Parse(String),

    /// The relay task is gone and can no longer answer commands.
    #[error("relay channel closed")]
    RelayClosed,
}

impl Error {
    /// Wrap any backend failure as a [`Error::Backend`].
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Error::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
