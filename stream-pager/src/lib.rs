//! stream-pager is a headless horizontal pager engine for page sequences that
//! may be unbounded in either direction.
//!
//! # Pages
//!
//! Pages come from a [`PageSource`]: anything that can name a starting key and
//! step from a key to its neighbours. The engine keeps a small window of pages
//! materialized around the current one and asks the source to create and
//! destroy page content as that window slides.
//!
//! ```
//! use stream_pager::{CountHint, PageSource};
//!
//! struct Chapters {
//!     titles: Vec<&'static str>,
//! }
//!
//! impl PageSource for Chapters {
//!     type Key = usize;
//!     type Handle = String;
//!
//!     fn initial_key(&self) -> usize {
//!         0
//!     }
//!
//!     fn next_key(&self, key: &usize) -> Option<usize> {
//!         (key + 1 < self.titles.len()).then_some(key + 1)
//!     }
//!
//!     fn prev_key(&self, key: &usize) -> Option<usize> {
//!         key.checked_sub(1)
//!     }
//!
//!     fn count_hint(&self) -> CountHint {
//!         CountHint::Finite
//!     }
//!
//!     fn instantiate(&mut self, key: &usize) -> Option<String> {
//!         self.titles.get(*key).map(|title| title.to_uppercase())
//!     }
//!
//!     fn destroy(&mut self, _key: &usize, _handle: String) {}
//! }
//! ```
//!
//! # Driving the engine
//!
//! A host adapter owns the real render tree. It reports the viewport width
//! through [`StreamPager::measure`], forwards pointer input to
//! [`StreamPager::on_pointer_event`], calls [`StreamPager::tick`] once per
//! frame while a settle runs, and places pages where
//! [`StreamPager::layout`] says. Progress is reported through a
//! [`PageChangeListener`].
//!
//! # Units
//!
//! Tuning values are [`Dp`]; page placement is reported in [`Px`]. Call
//! [`dp::set_scale_factor`] once with the display density.
#![deny(missing_docs, clippy::unwrap_used)]

pub mod config;
pub mod dp;
pub mod error;
pub mod gesture;
pub mod items;
pub mod listener;
pub mod offsets;
pub mod pager;
pub mod px;
pub mod resolver;
pub mod settle;
pub mod source;
mod velocity;

#[cfg(any(test, feature = "testing"))]
pub mod testing;


pub use crate::{
    config::PagerConfig,
    dp::Dp,
    error::PagerError,
    gesture::{
        GestureDisposition, GesturePhase, NestedScroll, Pointer, PointerAction, PointerEvent,
        ScrollRegion,
    },
    items::{Item, ItemId},
    listener::{Edge, PageChangeListener, ScrollState},
    offsets::Bounds,
    pager::{DecorationHandle, MarginSpan, PageLayout, StreamPager},
    px::Px,
    source::{CountHint, PageSource},
};
