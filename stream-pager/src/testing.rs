//! Fixtures shared by the unit tests, the scenario suite and downstream hosts
//! that enable the `testing` feature.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use smallvec::smallvec;

use crate::{
    Px,
    gesture::{Pointer, PointerAction, PointerEvent},
    listener::{Edge, PageChangeListener, ScrollState},
    source::{CountHint, PageSource},
};

/// Tolerance used by [`assert_close`].
pub const TOLERANCE: f64 = 1e-4;

/// Asserts that two floats agree within [`TOLERANCE`].
#[track_caller]
pub fn assert_close(actual: impl Into<f64>, expected: impl Into<f64>) {
    let (actual, expected) = (actual.into(), expected.into());
    assert!(
        (actual - expected).abs() <= TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

/// Finite source over the keys `0..count`.
///
/// Handles are sequential ids so tests can tell re-instantiations apart.
#[derive(Debug, Clone, Default)]
pub struct IndexSource {
    count: i64,
    widths: Vec<f32>,
    uniform_width: Option<f32>,
    missing: Vec<i64>,
    live: BTreeMap<i64, u64>,
    next_handle: u64,
    instantiations: usize,
}

impl IndexSource {
    /// Creates a source with `count` full-width pages.
    pub fn new(count: i64) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Per-key width fractions; keys past the end of `widths` are full width.
    pub fn with_widths(mut self, widths: Vec<f32>) -> Self {
        self.widths = widths;
        self
    }

    /// Gives every page the same width fraction.
    pub fn with_uniform_width(mut self, width: f32) -> Self {
        self.uniform_width = Some(width);
        self
    }

    /// Keys whose instantiation yields no render handle.
    pub fn with_missing(mut self, missing: Vec<i64>) -> Self {
        self.missing = missing;
        self
    }

    /// Keys that are currently instantiated, ascending.
    pub fn live_keys(&self) -> Vec<i64> {
        self.live.keys().copied().collect()
    }

    /// Total number of successful instantiations so far.
    pub fn instantiations(&self) -> usize {
        self.instantiations
    }
}

impl PageSource for IndexSource {
    type Key = i64;
    type Handle = u64;

    fn initial_key(&self) -> i64 {
        0
    }

    fn next_key(&self, key: &i64) -> Option<i64> {
        (key + 1 < self.count).then_some(key + 1)
    }

    fn prev_key(&self, key: &i64) -> Option<i64> {
        (*key > 0).then_some(key - 1)
    }

    fn count_hint(&self) -> CountHint {
        CountHint::Finite
    }

    fn instantiate(&mut self, key: &i64) -> Option<u64> {
        if self.missing.contains(key) {
            return None;
        }
        assert!(
            !self.live.contains_key(key),
            "page {key} instantiated twice"
        );
        let handle = self.next_handle;
        self.next_handle += 1;
        self.instantiations += 1;
        self.live.insert(*key, handle);
        Some(handle)
    }

    fn destroy(&mut self, key: &i64, handle: u64) {
        assert_eq!(self.live.remove(key), Some(handle), "stale handle for {key}");
    }

    fn page_width_fraction(&self, key: &i64) -> f32 {
        if let Some(width) = self.uniform_width {
            return width;
        }
        usize::try_from(*key)
            .ok()
            .and_then(|index| self.widths.get(index).copied())
            .unwrap_or(1.0)
    }

    fn clamp_key(&self, key: i64) -> i64 {
        key.clamp(0, (self.count - 1).max(0))
    }
}

/// Unbounded source over every `i64`, starting at `0`.
#[derive(Debug, Clone, Default)]
pub struct InfiniteSource {
    live: BTreeMap<i64, u64>,
    next_handle: u64,
}

impl InfiniteSource {
    /// Creates the source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that are currently instantiated, ascending.
    pub fn live_keys(&self) -> Vec<i64> {
        self.live.keys().copied().collect()
    }
}

impl PageSource for InfiniteSource {
    type Key = i64;
    type Handle = u64;

    fn initial_key(&self) -> i64 {
        0
    }

    fn next_key(&self, key: &i64) -> Option<i64> {
        key.checked_add(1)
    }

    fn prev_key(&self, key: &i64) -> Option<i64> {
        key.checked_sub(1)
    }

    fn instantiate(&mut self, key: &i64) -> Option<u64> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.insert(*key, handle);
        Some(handle)
    }

    fn destroy(&mut self, key: &i64, _handle: u64) {
        self.live.remove(key);
    }
}

/// One recorded listener callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PagerEvent<K> {
    /// `on_page_scrolled`.
    Scrolled {
        /// Page under the left edge.
        key: K,
        /// Fraction of that page scrolled past.
        offset: f32,
        /// The same fraction in pixels.
        offset_pixels: Px,
    },
    /// `on_page_selected`.
    Selected(K),
    /// `on_scroll_state_changed`.
    State(ScrollState),
    /// `on_edge_pull`.
    EdgePull(Edge, f32),
    /// `on_edge_release`.
    EdgeRelease,
}

/// Listener that appends every callback to a shared log.
#[derive(Debug)]
pub struct RecordingListener<K> {
    events: Arc<Mutex<Vec<PagerEvent<K>>>>,
}

impl<K> RecordingListener<K> {
    /// Creates the listener and the log it writes into.
    pub fn new() -> (Self, Arc<Mutex<Vec<PagerEvent<K>>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl<K: Clone> PageChangeListener<K> for RecordingListener<K> {
    fn on_page_scrolled(&mut self, key: &K, offset: f32, offset_pixels: Px) {
        self.events.lock().push(PagerEvent::Scrolled {
            key: key.clone(),
            offset,
            offset_pixels,
        });
    }

    fn on_page_selected(&mut self, key: &K) {
        self.events.lock().push(PagerEvent::Selected(key.clone()));
    }

    fn on_scroll_state_changed(&mut self, state: ScrollState) {
        self.events.lock().push(PagerEvent::State(state));
    }

    fn on_edge_pull(&mut self, edge: Edge, pull: f32) {
        self.events.lock().push(PagerEvent::EdgePull(edge, pull));
    }

    fn on_edge_release(&mut self) {
        self.events.lock().push(PagerEvent::EdgeRelease);
    }
}

/// Milliseconds expressed in the nanosecond timestamps pointer events carry.
pub const fn ms(millis: u64) -> u64 {
    millis * 1_000_000
}

fn single(action: PointerAction, x: f32, y: f32, time_nanos: u64) -> PointerEvent {
    PointerEvent {
        action,
        pointers: smallvec![Pointer { id: 0, x, y }],
        time_nanos,
    }
}

/// Primary pointer touching down.
pub fn down(x: f32, y: f32, time_nanos: u64) -> PointerEvent {
    single(PointerAction::Down, x, y, time_nanos)
}

/// Primary pointer moving.
pub fn move_to(x: f32, y: f32, time_nanos: u64) -> PointerEvent {
    single(PointerAction::Move, x, y, time_nanos)
}

/// Primary pointer lifting.
pub fn up(x: f32, y: f32, time_nanos: u64) -> PointerEvent {
    single(PointerAction::Up, x, y, time_nanos)
}

/// Gesture cancelled by the host.
pub fn cancel(x: f32, y: f32, time_nanos: u64) -> PointerEvent {
    single(PointerAction::Cancel, x, y, time_nanos)
}
