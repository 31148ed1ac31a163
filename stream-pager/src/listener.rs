//! Callbacks the engine reports scroll progress through.

use crate::Px;

/// Scroll state of the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollState {
    /// Fully at rest on a page; no gesture or animation in progress.
    #[default]
    Idle,
    /// Following the user's finger.
    Dragging,
    /// Animating toward a resting page.
    Settling,
}

/// Which end of the page sequence an overscroll signal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The first page's leading edge.
    Left,
    /// The last page's trailing edge.
    Right,
}

/// Observer of page changes.
///
/// Every method has an empty default, so implementors only override what they
/// need. The engine is borrowed mutably while it calls into the listener;
/// navigation requested in response must be issued after the call returns.
pub trait PageChangeListener<K> {
    /// The scroll position moved.
    ///
    /// `key` is the page under the left edge of the viewport, `offset` is in
    /// `[0, 1)` and `offset_pixels` is the same offset in pixels.
    fn on_page_scrolled(&mut self, _key: &K, _offset: f32, _offset_pixels: Px) {}

    /// A new page became the current one. The settle may still be running.
    fn on_page_selected(&mut self, _key: &K) {}

    /// The scroll state changed.
    fn on_scroll_state_changed(&mut self, _state: ScrollState) {}

    /// The user dragged past a sequence boundary by `pull` page widths.
    fn on_edge_pull(&mut self, _edge: Edge, _pull: f32) {}

    /// The finger lifted after an edge pull.
    fn on_edge_release(&mut self) {}
}
