//! Error type for the engine's fallible entry points.

use thiserror::Error;

/// Errors reported by [`StreamPager`](crate::StreamPager) and
/// [`PagerConfig`](crate::PagerConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PagerError {
    /// No page source is attached.
    #[error("no page source is attached")]
    NoSource,
    /// The viewport has not been measured, or measured zero wide.
    #[error("the pager viewport has zero width")]
    ZeroViewport,
    /// The current key could not be materialized.
    #[error("the current page has no render handle")]
    MissingAnchor,
    /// A configuration value is out of range.
    #[error("invalid pager config `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
