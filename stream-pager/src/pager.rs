//! The paging engine.
//!
//! [`StreamPager`] owns the materialized page window, the scroll position and
//! the drag and settle state machines. It never draws anything: hosts feed it
//! measurements, pointer events and frame ticks, and read page placements
//! back from [`StreamPager::layout`].
//!
//! ## Usage
//!
//! ```
//! use stream_pager::{PageSource, PagerConfig, Px, StreamPager};
//!
//! struct Days;
//!
//! impl PageSource for Days {
//!     type Key = i64;
//!     type Handle = ();
//!
//!     fn initial_key(&self) -> i64 {
//!         0
//!     }
//!     fn next_key(&self, day: &i64) -> Option<i64> {
//!         day.checked_add(1)
//!     }
//!     fn prev_key(&self, day: &i64) -> Option<i64> {
//!         day.checked_sub(1)
//!     }
//!     fn instantiate(&mut self, _day: &i64) -> Option<()> {
//!         Some(())
//!     }
//!     fn destroy(&mut self, _day: &i64, _handle: ()) {}
//! }
//!
//! let mut pager = StreamPager::with_source(PagerConfig::default(), Days);
//! pager.measure(Px(1080));
//! assert_eq!(pager.layout().map(|pages| pages.len()), Ok(3));
//!
//! pager.set_current_item(-40);
//! let mut frame_nanos = 0;
//! while pager.tick(frame_nanos) {
//!     frame_nanos += 16_000_000;
//! }
//! assert_eq!(pager.current_key(), Some(&-40));
//! ```

use tracing::{debug, trace, warn};

use crate::{
    Px,
    config::PagerConfig,
    error::PagerError,
    gesture::{
        DragContext, DragStep, DragTracker, GestureDisposition, GesturePhase, NestedScroll,
        PointerEvent,
    },
    items::{Item, ItemWindow},
    listener::{Edge, PageChangeListener, ScrollState},
    offsets::{self, AnchorSnapshot, Bounds},
    resolver::{FlingThresholds, resolve_target},
    settle::{SettleMetrics, Settler, settle_duration},
    source::{PageSource, hops_within, width_fraction},
};

/// Host-side identifier of the drawable painted into page margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecorationHandle(pub u64);

/// A visible gap between two pages, in content pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginSpan {
    /// Decoration to paint into the gap.
    pub decoration: DecorationHandle,
    /// Left edge of the gap.
    pub left: Px,
    /// Width of the gap.
    pub width: Px,
}

/// Where one materialized page goes, in content pixels.
///
/// Content pixels scroll with the pager: subtract
/// [`StreamPager::scroll_x`] to get viewport coordinates.
#[derive(Debug, PartialEq)]
pub struct PageLayout<'a, K, H> {
    /// Page key.
    pub key: &'a K,
    /// Render handle the source returned for the page.
    pub handle: &'a H,
    /// Left edge of the page.
    pub left: Px,
    /// Width of the page.
    pub width: Px,
}

/// Virtualized horizontal pager over a [`PageSource`].
///
/// Every entry point is synchronous and runs on the host's event thread.
/// Navigation requested from inside a [`PageChangeListener`] callback cannot
/// reach the pager (it is mutably borrowed), so it must be queued by the host
/// and issued afterwards.
pub struct StreamPager<S: PageSource> {
    config: PagerConfig,
    source: Option<S>,
    items: ItemWindow<S::Key, S::Handle>,
    current: Option<S::Key>,
    pending_anchor: Option<AnchorSnapshot<S::Key>>,
    bounds: Bounds,
    scroll_x: f64,
    width: Px,
    gutter: f32,
    state: ScrollState,
    settler: Option<Settler>,
    tracker: DragTracker,
    listener: Option<Box<dyn PageChangeListener<S::Key>>>,
    nested: Option<Box<dyn NestedScroll>>,
    decoration: Option<DecorationHandle>,
    first_layout: bool,
    populate_pending: bool,
    edge_pulled: bool,
}

impl<S: PageSource> StreamPager<S> {
    /// Creates a pager without a source.
    ///
    /// Out-of-range config values are replaced with usable ones.
    pub fn new(config: PagerConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("{err}; falling back to sanitized values");
        }
        Self {
            config: config.sanitized(),
            source: None,
            items: ItemWindow::new(),
            current: None,
            pending_anchor: None,
            bounds: Bounds::UNKNOWN,
            scroll_x: 0.0,
            width: Px::ZERO,
            gutter: 0.0,
            state: ScrollState::Idle,
            settler: None,
            tracker: DragTracker::new(),
            listener: None,
            nested: None,
            decoration: None,
            first_layout: true,
            populate_pending: false,
            edge_pulled: false,
        }
    }

    /// Creates a pager and attaches `source`.
    pub fn with_source(config: PagerConfig, source: S) -> Self {
        let mut pager = Self::new(config);
        pager.set_source(source);
        pager
    }

    /// Replaces the page source, returning the previous one.
    ///
    /// Every page of the old source is destroyed through it; the pager then
    /// starts over at the new source's initial key.
    pub fn set_source(&mut self, source: S) -> Option<S> {
        let previous = self.detach_source();
        self.current = Some(source.initial_key());
        self.source = Some(source);
        self.populate(None);
        previous
    }

    /// Detaches and returns the page source, destroying every page.
    pub fn take_source(&mut self) -> Option<S> {
        let previous = self.detach_source();
        self.current = None;
        previous
    }

    fn detach_source(&mut self) -> Option<S> {
        let mut previous = self.source.take();
        let drained = self.items.drain();
        if let Some(source) = previous.as_mut() {
            for item in drained {
                source.destroy(&item.key, item.handle);
            }
        }
        self.pending_anchor = None;
        self.bounds = Bounds::UNKNOWN;
        self.settler = None;
        self.tracker.reset();
        self.populate_pending = false;
        self.edge_pulled = false;
        self.first_layout = true;
        self.scroll_x = 0.0;
        self.set_scroll_state(ScrollState::Idle);
        previous
    }

    /// The attached source.
    pub fn source(&self) -> Option<&S> {
        self.source.as_ref()
    }

    /// The current configuration.
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Key of the selected page.
    pub fn current_key(&self) -> Option<&S::Key> {
        self.current.as_ref()
    }

    /// Scroll state.
    pub fn scroll_state(&self) -> ScrollState {
        self.state
    }

    /// Phase of the gesture in progress.
    pub fn gesture_phase(&self) -> GesturePhase {
        self.tracker.phase()
    }

    /// Horizontal scroll position in content pixels.
    pub fn scroll_x(&self) -> f64 {
        self.scroll_x
    }

    /// Scroll bounds in pager widths.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Materialized items in key order.
    pub fn items(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Item<S::Key, S::Handle>> + ExactSizeIterator {
        self.items.iter()
    }

    /// Measured viewport width.
    pub fn viewport_width(&self) -> Px {
        self.width
    }

    /// Selects `key`, animating unless the pager has not been laid out yet.
    pub fn set_current_item(&mut self, key: S::Key) {
        let smooth = !self.first_layout;
        self.set_current_item_internal(key, smooth, false, 0.0);
    }

    /// Selects `key`, animating when `smooth` is set.
    pub fn set_current_item_with(&mut self, key: S::Key, smooth: bool) {
        self.set_current_item_internal(key, smooth, false, 0.0);
    }

    /// Sets how many pages stay alive on each side of the current one.
    pub fn set_offscreen_limit(&mut self, limit: usize) {
        if limit < 1 {
            warn!("Requested offscreen page limit {limit} too small; using 1");
        }
        let limit = limit.max(1);
        if limit != self.config.offscreen_limit {
            self.config.offscreen_limit = limit;
            self.populate(None);
        }
    }

    /// Sets the gap between pages, keeping the current page in view.
    pub fn set_page_margin(&mut self, margin: Px) {
        let margin = Px(margin.raw().max(0));
        let old_margin = self.config.page_margin;
        self.config.page_margin = margin;
        let width = self.width;
        self.recompute_scroll_position(width, width, margin, old_margin);
        self.populate(None);
    }

    /// Sets the decoration painted into page margins.
    pub fn set_page_margin_decoration(&mut self, decoration: Option<DecorationHandle>) {
        self.decoration = decoration;
    }

    /// Installs the page-change listener.
    pub fn set_listener(&mut self, listener: Box<dyn PageChangeListener<S::Key>>) {
        self.listener = Some(listener);
    }

    /// Removes the page-change listener.
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Installs the probe for nested horizontally scrollable content.
    pub fn set_nested_scroll(&mut self, nested: Box<dyn NestedScroll>) {
        self.nested = Some(nested);
    }

    /// Injects the measured viewport width.
    pub fn measure(&mut self, width: Px) {
        let width = Px(width.raw().max(0));
        let old_width = self.width;
        self.width = width;
        self.gutter = self
            .config
            .gutter_size
            .to_pixels_f32()
            .min(width.to_f32() / 10.0);
        if old_width != width {
            let margin = self.config.page_margin;
            self.recompute_scroll_position(width, old_width, margin, margin);
        }
        self.populate(None);
    }

    /// Reconciles the window and reports where every materialized page goes.
    ///
    /// The first successful layout also snaps the scroll position onto the
    /// current page.
    pub fn layout(&mut self) -> Result<Vec<PageLayout<'_, S::Key, S::Handle>>, PagerError> {
        if self.source.is_none() {
            return Err(PagerError::NoSource);
        }
        if self.width.raw() <= 0 {
            warn!("Layout requested before the viewport was measured");
            return Err(PagerError::ZeroViewport);
        }
        self.populate(None);
        let current = self.current.clone().ok_or(PagerError::NoSource)?;
        if !self.items.contains(&current) {
            return Err(PagerError::MissingAnchor);
        }
        if self.first_layout {
            self.first_layout = false;
            self.scroll_to_item(current, false, 0.0, false);
        }

        let width = self.width.to_f64();
        Ok(self
            .items
            .iter()
            .map(|item| PageLayout {
                key: &item.key,
                handle: &item.handle,
                left: Px::saturating_from_f64((item.offset * width).round()),
                width: Px::saturating_from_f64((f64::from(item.width_factor) * width).round()),
            })
            .collect())
    }

    /// Visible page gaps to paint the margin decoration into.
    ///
    /// Empty without a margin, a decoration or materialized pages.
    pub fn margin_spans(&self) -> Vec<MarginSpan> {
        let (Some(decoration), Some(source)) = (self.decoration, self.source.as_ref()) else {
            return Vec::new();
        };
        let margin = self.config.page_margin.to_f64();
        let width = self.width.to_f64();
        let (Some(first), Some(last)) = (self.items.first(), self.items.last()) else {
            return Vec::new();
        };
        if margin <= 0.0 || width <= 0.0 {
            return Vec::new();
        }

        let margin_offset = margin / width;
        let mut spans = Vec::new();
        let mut key = first.key.clone();
        let mut offset = first.offset;
        while key < last.key {
            let item = self.items.find(&key).and_then(|id| self.items.get(id));
            let (draw_at, next_offset) = match item {
                Some(item) => {
                    let right = item.offset + f64::from(item.width_factor);
                    (right * width, right + margin_offset)
                }
                None => {
                    let width_factor = f64::from(width_fraction(source, &key));
                    ((offset + width_factor) * width, offset + width_factor + margin_offset)
                }
            };
            offset = next_offset;
            if draw_at + margin > self.scroll_x {
                spans.push(MarginSpan {
                    decoration,
                    left: Px::saturating_from_f64(draw_at.round()),
                    width: self.config.page_margin,
                });
            }
            if draw_at > self.scroll_x + width {
                break;
            }
            let Some(next) = source.next_key(&key) else {
                break;
            };
            key = next;
        }
        spans
    }

    /// Feeds a pointer event through the drag state machine.
    pub fn on_pointer_event(&mut self, event: &PointerEvent) -> GestureDisposition {
        if self.source.is_none() || self.items.is_empty() || self.width.raw() <= 0 {
            self.tracker.reset();
            return GestureDisposition::PassedThrough;
        }

        let context = DragContext {
            touch_slop: self.config.touch_slop.to_pixels_f32(),
            gutter: self.gutter,
            width: self.width.to_f32(),
            max_velocity: self.config.max_fling_velocity.to_pixels_f32(),
            nested: self.nested.as_deref(),
        };
        let step = self.tracker.handle(event, &context);
        match step {
            DragStep::Touched => self.catch_or_complete(),
            DragStep::Began { delta_x } => {
                self.set_scroll_state(ScrollState::Dragging);
                self.perform_drag(delta_x);
            }
            DragStep::Dragged { delta_x } => self.perform_drag(delta_x),
            DragStep::Released { velocity, travel } => self.release_drag(velocity, travel),
            DragStep::Cancelled => self.cancel_drag(),
            DragStep::Ignored | DragStep::Pending | DragStep::Declined | DragStep::Ended => {}
        }
        self.tracker.phase().disposition()
    }

    /// Advances a running settle to `frame_nanos`.
    ///
    /// Returns whether another frame is needed.
    pub fn tick(&mut self, frame_nanos: u64) -> bool {
        let Some(settler) = self.settler.as_mut() else {
            return false;
        };
        let x = settler.tick(frame_nanos);
        let finished = settler.is_finished();
        if x != self.scroll_x {
            self.scroll_x = x;
            self.page_scrolled(x);
        }
        if finished {
            self.complete_scroll();
            return false;
        }
        true
    }

    /// Pages toward the start. Returns whether there was a page to go to.
    pub fn page_left(&mut self) -> bool {
        let previous = match (self.source.as_ref(), self.current.as_ref()) {
            (Some(source), Some(current)) => source.prev_key(current),
            _ => None,
        };
        match previous {
            Some(key) => {
                self.set_current_item_with(key, true);
                true
            }
            None => false,
        }
    }

    /// Pages toward the end. Returns whether there was a page to go to.
    pub fn page_right(&mut self) -> bool {
        let next = match (self.source.as_ref(), self.current.as_ref()) {
            (Some(source), Some(current)) => source.next_key(current),
            _ => None,
        };
        match next {
            Some(key) => {
                self.set_current_item_with(key, true);
                true
            }
            None => false,
        }
    }

    /// Whether the content can scroll toward the start.
    pub fn can_scroll_backward(&self) -> bool {
        self.source.is_some()
            && self.width.raw() > 0
            && self.scroll_x > self.width.to_f64() * self.bounds.first
    }

    /// Whether the content can scroll toward the end.
    pub fn can_scroll_forward(&self) -> bool {
        self.source.is_some()
            && self.width.raw() > 0
            && self.scroll_x < self.width.to_f64() * self.bounds.last
    }

    /// Whether there is anywhere to page to.
    pub fn is_scrollable(&self) -> bool {
        let (Some(source), Some(current)) = (self.source.as_ref(), self.current.as_ref()) else {
            return false;
        };
        source.count_hint().has_at_least_one_item()
            || source.next_key(current).is_some()
            || source.prev_key(current).is_some()
    }

    /// Whether the source has any page to show.
    pub fn has_at_least_one_item(&self) -> bool {
        self.source.as_ref().is_some_and(|source| {
            source.count_hint().has_at_least_one_item() || !self.items.is_empty()
        })
    }

    fn set_current_item_internal(
        &mut self,
        key: S::Key,
        smooth: bool,
        always: bool,
        velocity: f32,
    ) {
        let Some(source) = self.source.as_ref() else {
            debug!("Ignoring selection of {key:?} without a page source");
            return;
        };
        let key = source.clamp_key(key);
        if !always && self.current.as_ref() == Some(&key) && !self.items.is_empty() {
            return;
        }
        let is_jump = self
            .current
            .as_ref()
            .is_some_and(|current| {
                hops_within(source, current, &key, self.config.offscreen_limit).is_none()
            });
        let dispatch_selected = self.current.as_ref() != Some(&key);

        if self.first_layout {
            self.retarget(key.clone());
            if dispatch_selected {
                self.dispatch_selected(&key);
            }
            return;
        }

        if is_jump {
            debug!("Jumping to {key:?}; pinning the current window");
            self.items.pin_all();
        }
        if !self.items.contains(&key) {
            // A target outside the window must be materialized before it can
            // be scrolled to.
            self.populate_pending = false;
        }
        self.populate(Some(key.clone()));
        self.scroll_to_item(key, smooth, velocity, dispatch_selected);
    }

    fn scroll_to_item(
        &mut self,
        key: S::Key,
        smooth: bool,
        velocity: f32,
        dispatch_selected: bool,
    ) {
        let width = self.width.to_f64();
        let dest_x = match self.items.find(&key).and_then(|id| self.items.get(id)) {
            Some(item) => width * self.bounds.clamp(item.offset),
            None => {
                warn!("Page {key:?} is not materialized; staying at {}", self.scroll_x);
                self.scroll_x
            }
        };

        if smooth {
            self.smooth_scroll_to(dest_x, velocity);
            if dispatch_selected {
                self.dispatch_selected(&key);
            }
        } else {
            if dispatch_selected {
                self.dispatch_selected(&key);
            }
            self.complete_scroll();
            self.scroll_x = dest_x;
            self.page_scrolled(dest_x);
        }
    }

    fn smooth_scroll_to(&mut self, dest_x: f64, velocity: f32) {
        if self.items.is_empty() {
            return;
        }
        let start_x = self.scroll_x;
        let dx = dest_x - start_x;
        if dx == 0.0 {
            self.complete_scroll();
            self.populate(None);
            self.set_scroll_state(ScrollState::Idle);
            return;
        }

        self.set_scroll_state(ScrollState::Settling);
        let width = self.width.to_f32();
        let width_factor = self
            .current
            .as_ref()
            .and_then(|key| self.items.find(key))
            .and_then(|id| self.items.get(id))
            .map_or(1.0, |item| item.width_factor);
        let duration = settle_duration(
            SettleMetrics {
                dx: dx as f32,
                width,
                velocity,
                page_width: width * width_factor,
                margin: self.config.page_margin.to_f32(),
            },
            self.config.max_settle_duration,
        );
        debug!(start_x, dest_x, velocity, ?duration, "Settling");
        self.settler = Some(Settler::start(start_x, dest_x, duration));
    }

    /// Finishes any settle, releases pins and reconciles what was deferred.
    fn complete_scroll(&mut self) {
        let mut need_populate = self.state == ScrollState::Settling;
        if need_populate && let Some(mut settler) = self.settler.take() {
            settler.finish();
            let x = settler.final_x();
            if x != self.scroll_x {
                self.scroll_x = x;
                self.page_scrolled(x);
            }
        }
        self.populate_pending = false;
        need_populate |= self.items.clear_pins();
        if need_populate {
            self.set_scroll_state(ScrollState::Idle);
            self.populate(None);
        }
    }

    fn catch_or_complete(&mut self) {
        let close_enough = f64::from(self.config.close_enough.to_pixels_f32());
        let catchable = self.state == ScrollState::Settling
            && self
                .settler
                .as_ref()
                .is_some_and(|settler| settler.remaining_distance() > close_enough);
        if !catchable {
            self.complete_scroll();
            return;
        }

        if let Some(mut settler) = self.settler.take() {
            settler.abort();
            self.scroll_x = settler.current_x();
        }
        debug!(scroll_x = self.scroll_x, "Caught a running settle");
        self.populate_pending = false;
        self.populate(None);
        self.tracker.claim();
        self.set_scroll_state(ScrollState::Dragging);
    }

    fn perform_drag(&mut self, delta_x: f32) {
        let width = self.width.to_f64();
        let (Some(first), Some(last)) = (self.items.first(), self.items.last()) else {
            return;
        };
        let (left_bound, left_exact) = if self.bounds.is_first_exact() {
            (width * self.bounds.first, true)
        } else {
            (width * first.offset, false)
        };
        let (right_bound, right_exact) = if self.bounds.is_last_exact() {
            (width * self.bounds.last, true)
        } else {
            (width * last.offset, false)
        };

        let mut scroll_x = self.scroll_x - f64::from(delta_x);
        if scroll_x < left_bound {
            if left_exact {
                self.edge_pull(Edge::Left, ((left_bound - scroll_x) / width) as f32);
            }
            scroll_x = left_bound;
        }
        if scroll_x > right_bound {
            if right_exact {
                self.edge_pull(Edge::Right, ((scroll_x - right_bound) / width) as f32);
            }
            scroll_x = right_bound;
        }
        trace!(delta_x, scroll_x, "Drag");
        self.scroll_x = scroll_x;
        self.page_scrolled(scroll_x);
    }

    fn release_drag(&mut self, velocity: f32, travel: f32) {
        self.populate_pending = true;
        let width = self.width.to_f64();
        let margin_offset = self.margin_offset();
        let thresholds = FlingThresholds {
            distance: self.config.fling_distance.to_pixels_f32(),
            velocity: self.config.min_fling_velocity.to_pixels_f32(),
        };
        let target = self.source.as_ref().and_then(|source| {
            let page = offsets::page_at(&self.items, source, self.scroll_x / width, margin_offset)?;
            let page_offset = (self.scroll_x / width - page.offset)
                / (f64::from(page.width_factor) + margin_offset);
            Some(resolve_target(
                source,
                &self.items,
                &page,
                page_offset as f32,
                velocity,
                travel,
                thresholds,
            ))
        });
        let Some(target) = target.or_else(|| self.current.clone()) else {
            return;
        };
        debug!(?target, velocity, travel, "Drag released");
        self.set_current_item_internal(target, true, true, velocity);
        self.release_edges();
    }

    fn cancel_drag(&mut self) {
        if let Some(current) = self.current.clone() {
            self.set_current_item_internal(current, true, true, 0.0);
        }
        self.release_edges();
    }

    fn edge_pull(&mut self, edge: Edge, pull: f32) {
        self.edge_pulled = true;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_edge_pull(edge, pull);
        }
    }

    fn release_edges(&mut self) {
        if std::mem::take(&mut self.edge_pulled)
            && let Some(listener) = self.listener.as_mut()
        {
            listener.on_edge_release();
        }
    }

    /// Keeps the current page in view across a width or margin change.
    fn recompute_scroll_position(&mut self, width: Px, old_width: Px, margin: Px, old_margin: Px) {
        let rescale = old_width.raw() > 0 && width.raw() > 0 && !self.items.is_empty();
        let width = width.to_f64();
        let stride = width + margin.to_f64();
        let old_stride = old_width.to_f64() + old_margin.to_f64();
        if rescale {
            // Offsets are in pager widths; move them with the scroll position.
            let factor = old_width.to_f64() / old_stride * stride / width;
            self.items.scale_offsets(factor);
            if let Some(anchor) = self.pending_anchor.as_mut() {
                anchor.offset *= factor;
            }
        }
        self.refresh_offsets();
        let current_offset = self
            .current
            .as_ref()
            .and_then(|key| self.items.find(key))
            .and_then(|id| self.items.get(id))
            .map(|item| item.offset);

        if rescale {
            let rescaled = self.scroll_x / old_stride * stride;
            self.scroll_x = rescaled;
            if let Some(settler) = self.settler.as_mut()
                && !settler.is_finished()
            {
                let final_x = current_offset.map_or(settler.final_x(), |offset| offset * width);
                settler.restart(rescaled, final_x);
            }
        } else {
            let offset = current_offset.map_or(0.0, |offset| offset.min(self.bounds.last));
            let scroll_x = offset * width;
            if scroll_x != self.scroll_x {
                self.complete_scroll();
                self.scroll_x = scroll_x;
            }
        }
    }

    fn margin_offset(&self) -> f64 {
        let width = self.width.to_f64();
        if width > 0.0 {
            self.config.page_margin.to_f64() / width
        } else {
            0.0
        }
    }

    /// Moves the selection to `key`, remembering where the old anchor was laid
    /// out until offsets are recomputed.
    fn retarget(&mut self, key: S::Key) {
        if self.current.as_ref() == Some(&key) {
            return;
        }
        if self.pending_anchor.is_none() {
            self.pending_anchor = self
                .current
                .as_ref()
                .and_then(|current| self.items.find(current))
                .and_then(|id| self.items.get(id))
                .map(|item| AnchorSnapshot {
                    key: item.key.clone(),
                    offset: item.offset,
                    width_factor: item.width_factor,
                });
        }
        self.current = Some(key);
    }

    fn populate(&mut self, new_key: Option<S::Key>) {
        if let Some(key) = new_key {
            self.retarget(key);
        }
        if self.populate_pending {
            trace!("Window maintenance deferred until the settle finishes");
            return;
        }
        let (Some(source), Some(current)) = (self.source.as_mut(), self.current.as_ref()) else {
            return;
        };
        self.items.reconcile(source, current, self.config.offscreen_limit);
        self.refresh_offsets();
    }

    fn refresh_offsets(&mut self) {
        let margin_offset = self.margin_offset();
        let (Some(source), Some(current)) = (self.source.as_ref(), self.current.as_ref()) else {
            return;
        };
        let Some(anchor) = self.items.find(current) else {
            return;
        };
        let previous = self.pending_anchor.take();
        self.bounds = offsets::recompute(
            &mut self.items,
            source,
            anchor,
            previous.as_ref(),
            margin_offset,
        );
    }

    fn page_scrolled(&mut self, x: f64) -> bool {
        let width = self.width.to_f64();
        if width <= 0.0 {
            return false;
        }
        let margin_offset = self.margin_offset();
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        let Some(page) = offsets::page_at(&self.items, source, x / width, margin_offset) else {
            return false;
        };
        let page_offset =
            (x / width - page.offset) / (f64::from(page.width_factor) + margin_offset);
        let stride = width + self.config.page_margin.to_f64();
        let offset_pixels = Px::saturating_from_f64((page_offset * stride).round());
        if let Some(listener) = self.listener.as_mut() {
            listener.on_page_scrolled(&page.key, page_offset as f32, offset_pixels);
        }
        true
    }

    fn dispatch_selected(&mut self, key: &S::Key) {
        debug!("Page {key:?} selected");
        if let Some(listener) = self.listener.as_mut() {
            listener.on_page_selected(key);
        }
    }

    fn set_scroll_state(&mut self, state: ScrollState) {
        if self.state == state {
            return;
        }
        debug!(from = ?self.state, to = ?state, "Scroll state changed");
        self.state = state;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_scroll_state_changed(state);
        }
    }
}

impl<S> std::fmt::Debug for StreamPager<S>
where
    S: PageSource,
    S::Handle: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPager")
            .field("current", &self.current)
            .field("items", &self.items)
            .field("bounds", &self.bounds)
            .field("scroll_x", &self.scroll_x)
            .field("width", &self.width)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
