//! The page supplier the engine pulls keys, widths and render handles from.
//!
//! ## Usage
//!
//! Implement [`PageSource`] for anything that can enumerate pages by
//! adjacency: a list of documents, an endless calendar, a chat history that
//! grows in both directions.

use std::fmt::Debug;

use tracing::warn;

/// How many pages a [`PageSource`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CountHint {
    /// The sequence is bounded on both ends.
    Finite,
    /// The sequence never ends in at least one direction.
    #[default]
    Infinite,
    /// The source cannot tell.
    Unknown,
}

impl CountHint {
    /// Whether scrollability should be reported without consulting the
    /// current position.
    pub fn has_at_least_one_item(self) -> bool {
        matches!(self, CountHint::Infinite | CountHint::Unknown)
    }
}

/// Supplies page keys and page lifecycle for a
/// [`StreamPager`](crate::StreamPager).
///
/// Keys must be totally ordered consistently with adjacency: for every key
/// `k`, `next_key(k) > k` and `prev_key(k) < k`. The engine relies on that
/// order to keep its materialized items sorted without walking the sequence.
pub trait PageSource {
    /// Opaque page identifier.
    type Key: Clone + Ord + Debug;
    /// Handle returned on instantiation; the source owns whatever it refers to.
    type Handle;

    /// The key selected when the source is attached.
    fn initial_key(&self) -> Self::Key;

    /// The key after `key`, or `None` at the end of the sequence.
    fn next_key(&self, key: &Self::Key) -> Option<Self::Key>;

    /// The key before `key`, or `None` at the start of the sequence.
    fn prev_key(&self, key: &Self::Key) -> Option<Self::Key>;

    /// How many pages the source reports.
    fn count_hint(&self) -> CountHint {
        CountHint::Infinite
    }

    /// Creates the page content for `key`.
    ///
    /// Called at most once per key while that key stays materialized.
    /// Returning `None` leaves a gap in the window instead of failing.
    fn instantiate(&mut self, key: &Self::Key) -> Option<Self::Handle>;

    /// Releases the page content created for `key`.
    fn destroy(&mut self, key: &Self::Key, handle: Self::Handle);

    /// Page width as a fraction of the pager width, in `(0, 1]`.
    fn page_width_fraction(&self, _key: &Self::Key) -> f32 {
        1.0
    }

    /// Maps a requested key onto the nearest key the source can reach.
    ///
    /// Bounded sources override this to clamp out-of-range navigation to
    /// their first or last key.
    fn clamp_key(&self, key: Self::Key) -> Self::Key {
        key
    }
}

/// Reads a page width fraction, forcing it into `(0, 1]`.
pub(crate) fn width_fraction<S: PageSource>(source: &S, key: &S::Key) -> f32 {
    let width = source.page_width_fraction(key);
    if width.is_finite() && width > 0.0 && width <= 1.0 {
        return width;
    }
    // Zero, negative and NaN widths would collapse the offset walk, so every
    // out-of-range value falls back to a full page.
    warn!("Page {key:?} reported width fraction {width}; using 1.0");
    1.0
}

/// Counts adjacency hops from `from` to `to`, giving up after `max` hops.
///
/// Returns `None` when `to` is further away than `max` or unreachable.
pub(crate) fn hops_within<S: PageSource>(
    source: &S,
    from: &S::Key,
    to: &S::Key,
    max: usize,
) -> Option<usize> {
    let forward = to > from;
    let mut cursor = from.clone();
    for hops in 0..=max {
        if &cursor == to {
            return Some(hops);
        }
        let step = if forward {
            source.next_key(&cursor)
        } else {
            source.prev_key(&cursor)
        };
        match step {
            Some(key) => cursor = key,
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{IndexSource, InfiniteSource};

    #[test]
    fn count_hint_reports_unbounded_sources_as_scrollable() {
        assert!(!CountHint::Finite.has_at_least_one_item());
        assert!(CountHint::Infinite.has_at_least_one_item());
        assert!(CountHint::Unknown.has_at_least_one_item());
    }

    #[test]
    fn hops_are_counted_in_both_directions() {
        let source = IndexSource::new(10);
        assert_eq!(hops_within(&source, &2, &5, 10), Some(3));
        assert_eq!(hops_within(&source, &5, &2, 10), Some(3));
        assert_eq!(hops_within(&source, &5, &5, 0), Some(0));
        assert_eq!(hops_within(&source, &0, &9, 3), None);
        assert_eq!(hops_within(&source, &8, &12, 10), None);
    }

    #[test]
    fn infinite_source_walks_below_zero() {
        let source = InfiniteSource::new();
        assert_eq!(source.prev_key(&0), Some(-1));
        assert_eq!(hops_within(&source, &0, &-4, 4), Some(4));
    }

    #[test]
    fn width_fractions_are_forced_into_range() {
        let source = IndexSource::new(4).with_widths(vec![0.5, 1.5, 0.0, -2.0]);
        assert_eq!(width_fraction(&source, &0), 0.5);
        assert_eq!(width_fraction(&source, &1), 1.0);
        assert_eq!(width_fraction(&source, &2), 1.0);
        assert_eq!(width_fraction(&source, &3), 1.0);
    }
}
