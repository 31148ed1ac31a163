use std::{fmt::Debug, marker::PhantomData};

use smallvec::smallvec;
use stream_pager::{
    Edge, PageChangeListener, PageSource, PagerConfig, Pointer, PointerAction, PointerEvent, Px,
    ScrollState, StreamPager,
};
use tracing::{debug, info, warn};

/// Nominal frame length of the simulated display.
const FRAME_NANOS: u64 = 16_000_000;
/// Interval between synthesized pointer moves.
const MOVE_NANOS: u64 = 8_000_000;
/// Row swipes happen on unless told otherwise.
const DEFAULT_Y: f32 = 1500.0;
/// Upper bound on frames per settle.
const MAX_FRAMES: usize = 600;

/// Logs every pager callback.
struct LoggingListener<K> {
    _key: PhantomData<fn(&K)>,
}

impl<K: Debug> PageChangeListener<K> for LoggingListener<K> {
    fn on_page_scrolled(&mut self, key: &K, offset: f32, offset_pixels: Px) {
        debug!(?key, offset, offset_pixels = offset_pixels.raw(), "Scrolled");
    }

    fn on_page_selected(&mut self, key: &K) {
        info!("Selected {key:?}");
    }

    fn on_scroll_state_changed(&mut self, state: ScrollState) {
        info!(?state, "Scroll state");
    }

    fn on_edge_pull(&mut self, edge: Edge, pull: f32) {
        info!(?edge, pull, "Overscroll");
    }

    fn on_edge_release(&mut self) {
        info!("Overscroll released");
    }
}

/// Owns a pager and a virtual clock, and plays scripted input into it.
pub struct ScriptedHost<S: PageSource> {
    pager: StreamPager<S>,
    clock_nanos: u64,
}

impl<S> ScriptedHost<S>
where
    S: PageSource,
    S::Key: 'static,
    S::Handle: Debug,
{
    pub fn new(config: PagerConfig, source: S, width: Px) -> Self {
        let mut pager = StreamPager::with_source(config, source);
        pager.set_listener(Box::new(LoggingListener { _key: PhantomData }));
        pager.measure(width);
        let mut host = Self {
            pager,
            clock_nanos: 0,
        };
        host.lay_out();
        host
    }

    pub fn pager_mut(&mut self) -> &mut StreamPager<S> {
        &mut self.pager
    }

    /// Drags from `from_x` to `to_x` over `duration_ms`, then lets the pager settle.
    pub fn swipe(&mut self, from_x: f32, to_x: f32, duration_ms: u64) {
        self.swipe_at(from_x, to_x, DEFAULT_Y, duration_ms);
    }

    pub fn swipe_at(&mut self, from_x: f32, to_x: f32, y: f32, duration_ms: u64) {
        info!(from_x, to_x, y, duration_ms, "Swipe");
        let disposition = self.send(PointerAction::Down, from_x, y);
        debug!(?disposition, "Down");

        let duration_nanos = duration_ms * 1_000_000;
        let steps = (duration_nanos / MOVE_NANOS).max(1);
        let mut x = from_x;
        for step in 1..=steps {
            self.clock_nanos += MOVE_NANOS;
            x = from_x + (to_x - from_x) * step as f32 / steps as f32;
            let disposition = self.send(PointerAction::Move, x, y);
            debug!(x, ?disposition, "Move");
        }
        self.send(PointerAction::Up, x, y);
        self.settle();
    }

    /// A short, fast swipe.
    pub fn fling(&mut self, from_x: f32, distance: f32) {
        self.swipe(from_x, from_x + distance, 16);
    }

    pub fn jump_to(&mut self, key: S::Key) {
        info!("Jumping to {key:?}");
        self.pager.set_current_item(key);
        self.settle();
    }

    pub fn page_left(&mut self) {
        if !self.pager.page_left() {
            info!("Already on the first page");
        }
        self.settle();
    }

    /// Ticks until the pager is at rest.
    pub fn settle(&mut self) {
        let mut frames = 0;
        while self.pager.tick(self.clock_nanos) {
            self.clock_nanos += FRAME_NANOS;
            frames += 1;
            if frames >= MAX_FRAMES {
                warn!("Settle still running after {frames} frames");
                break;
            }
        }
        if frames > 0 {
            debug!(frames, "Settled");
        }
        self.lay_out();
    }

    /// Logs where the host would place every page.
    pub fn report(&mut self) {
        info!(
            current = ?self.pager.current_key(),
            scroll_x = self.pager.scroll_x(),
            bounds = ?self.pager.bounds(),
            "Pager at rest"
        );
        let scroll_x = self.pager.scroll_x();
        match self.pager.layout() {
            Ok(pages) => {
                for page in pages {
                    info!(
                        "{:?} at {} ({} px wide)",
                        page.handle,
                        page.left.to_f64() - scroll_x,
                        page.width.raw()
                    );
                }
            }
            Err(err) => warn!("Nothing to place: {err}"),
        }
        for span in self.pager.margin_spans() {
            debug!(left = span.left.raw(), width = span.width.raw(), "Margin");
        }
    }

    fn lay_out(&mut self) {
        match self.pager.layout() {
            Ok(pages) => debug!(pages = pages.len(), "Laid out"),
            Err(err) => warn!("Layout failed: {err}"),
        }
    }

    fn send(&mut self, action: PointerAction, x: f32, y: f32) -> stream_pager::GestureDisposition {
        let event = PointerEvent {
            action,
            pointers: smallvec![Pointer { id: 0, x, y }],
            time_nanos: self.clock_nanos,
        };
        self.pager.on_pointer_event(&event)
    }
}
