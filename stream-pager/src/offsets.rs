//! Fractional page offsets and the scroll bounds derived from them.
//!
//! Offsets are measured in pager widths: an item at offset `2.0` starts two
//! viewport widths to the right of the content origin. Neighbouring items are
//! separated by their width factor plus the page margin expressed in pager
//! widths. Keys that are not materialized still take up the width their
//! source reports for them.

use crate::{
    items::{Item, ItemId, ItemWindow},
    source::{PageSource, width_fraction},
};

/// Scroll extremes of the page sequence, in pager widths.
///
/// A bound is exact only while the sequence boundary it belongs to is
/// materialized; otherwise it stays infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Offset of the very first page.
    pub first: f64,
    /// Largest scroll offset: the last page's right edge meets the viewport's
    /// right edge.
    pub last: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl Bounds {
    /// Neither sequence boundary is known.
    pub const UNKNOWN: Self = Self {
        first: f64::NEG_INFINITY,
        last: f64::INFINITY,
    };

    /// Whether the first page is materialized.
    pub fn is_first_exact(&self) -> bool {
        self.first.is_finite()
    }

    /// Whether the last page is materialized.
    pub fn is_last_exact(&self) -> bool {
        self.last.is_finite()
    }

    /// Clamps a fractional offset into the bounds.
    pub fn clamp(&self, offset: f64) -> f64 {
        offset.min(self.last).max(self.first)
    }
}

/// Snapshot of the previous anchor, taken before the window was reconciled
/// (the old anchor may have been evicted since).
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSnapshot<K> {
    /// Key of the previous anchor.
    pub key: K,
    /// Its offset at the time of the snapshot.
    pub offset: f64,
    /// Its width factor.
    pub width_factor: f32,
}

/// Recomputes every item's offset around `anchor` and returns the new bounds.
///
/// When the anchor changed, the items between the old and the new anchor are
/// first re-stamped from the old anchor's offset so that the new anchor lands
/// exactly where the old layout had it. All items are then laid out outward
/// from the anchor.
pub fn recompute<S>(
    window: &mut ItemWindow<S::Key, S::Handle>,
    source: &S,
    anchor: ItemId,
    previous: Option<&AnchorSnapshot<S::Key>>,
    margin_offset: f64,
) -> Bounds
where
    S: PageSource,
{
    let Some(anchor_item) = window.get(anchor) else {
        return Bounds::UNKNOWN;
    };
    let anchor_key = anchor_item.key.clone();

    if let Some(previous) = previous
        && previous.key != anchor_key
    {
        carry_forward(window, source, previous, &anchor_key, margin_offset);
    }

    let Some((anchor_index, _)) = window.find_indexed(&anchor_key) else {
        return Bounds::UNKNOWN;
    };
    let anchor_offset = window.get(anchor).map_or(0.0, |item| item.offset);
    let anchor_width = window
        .get(anchor)
        .map_or(1.0, |item| f64::from(item.width_factor));
    let ids = window.ids().to_vec();

    let mut bounds = Bounds::UNKNOWN;
    if source.prev_key(&anchor_key).is_none() {
        bounds.first = anchor_offset;
    }
    if source.next_key(&anchor_key).is_none() {
        bounds.last = anchor_offset + anchor_width - 1.0;
    }

    // Previous pages.
    let mut offset = anchor_offset;
    let mut cursor = source.prev_key(&anchor_key);
    for &id in ids[..anchor_index].iter().rev() {
        let Some(item) = window.get_mut(id) else {
            continue;
        };
        while let Some(gap) = cursor.as_ref().filter(|&gap| gap > &item.key) {
            offset -= f64::from(width_fraction(source, gap)) + margin_offset;
            cursor = source.prev_key(gap);
        }
        offset -= f64::from(item.width_factor) + margin_offset;
        item.offset = offset;
        cursor = source.prev_key(&item.key);
        if cursor.is_none() {
            bounds.first = offset;
        }
    }

    // Next pages.
    let mut offset = anchor_offset + anchor_width + margin_offset;
    let mut cursor = source.next_key(&anchor_key);
    for &id in &ids[anchor_index + 1..] {
        let Some(item) = window.get_mut(id) else {
            continue;
        };
        while let Some(gap) = cursor.as_ref().filter(|&gap| gap < &item.key) {
            offset += f64::from(width_fraction(source, gap)) + margin_offset;
            cursor = source.next_key(gap);
        }
        item.offset = offset;
        offset += f64::from(item.width_factor) + margin_offset;
        cursor = source.next_key(&item.key);
        if cursor.is_none() {
            bounds.last = item.offset + f64::from(item.width_factor) - 1.0;
        }
    }

    bounds
}

fn carry_forward<S>(
    window: &mut ItemWindow<S::Key, S::Handle>,
    source: &S,
    previous: &AnchorSnapshot<S::Key>,
    anchor_key: &S::Key,
    margin_offset: f64,
) where
    S: PageSource,
{
    let ids = window.ids().to_vec();
    if &previous.key < anchor_key {
        let mut offset = previous.offset + f64::from(previous.width_factor) + margin_offset;
        let mut cursor = source.next_key(&previous.key);
        for id in ids {
            let Some(item) = window.get_mut(id) else {
                continue;
            };
            if item.key <= previous.key {
                continue;
            }
            if &item.key > anchor_key {
                break;
            }
            while let Some(gap) = cursor.as_ref().filter(|&gap| gap < &item.key) {
                offset += f64::from(width_fraction(source, gap)) + margin_offset;
                cursor = source.next_key(gap);
            }
            item.offset = offset;
            offset += f64::from(item.width_factor) + margin_offset;
            cursor = source.next_key(&item.key);
        }
    } else {
        let mut offset = previous.offset;
        let mut cursor = source.prev_key(&previous.key);
        for id in ids.into_iter().rev() {
            let Some(item) = window.get_mut(id) else {
                continue;
            };
            if item.key >= previous.key {
                continue;
            }
            if &item.key < anchor_key {
                break;
            }
            while let Some(gap) = cursor.as_ref().filter(|&gap| gap > &item.key) {
                offset -= f64::from(width_fraction(source, gap)) + margin_offset;
                cursor = source.prev_key(gap);
            }
            offset -= f64::from(item.width_factor) + margin_offset;
            item.offset = offset;
            cursor = source.prev_key(&item.key);
        }
    }
}

/// The page under the viewport's left edge at some scroll position.
///
/// May describe a key that is not materialized when the scroll position falls
/// into a gap of the window.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePosition<K> {
    /// Key of the page.
    pub key: K,
    /// Its offset, in pager widths.
    pub offset: f64,
    /// Its width factor.
    pub width_factor: f32,
}

/// Finds the page containing `scroll_offset` (in pager widths).
///
/// Positions left of the first item resolve to the first item, positions past
/// the last item to the last item.
pub fn page_at<S>(
    window: &ItemWindow<S::Key, S::Handle>,
    source: &S,
    scroll_offset: f64,
    margin_offset: f64,
) -> Option<PagePosition<S::Key>>
where
    S: PageSource,
{
    let mut last: Option<PagePosition<S::Key>> = None;
    let mut items = window.iter().peekable();
    while let Some(next) = items.peek() {
        let candidate = match &last {
            Some(previous) => match source.next_key(&previous.key) {
                // A key between two materialized items was skipped.
                Some(gap) if gap < next.key => PagePosition {
                    offset: previous.offset + f64::from(previous.width_factor) + margin_offset,
                    width_factor: width_fraction(source, &gap),
                    key: gap,
                },
                _ => take_item(&mut items)?,
            },
            None => take_item(&mut items)?,
        };

        let left_bound = candidate.offset;
        let right_bound = candidate.offset + f64::from(candidate.width_factor) + margin_offset;
        if last.is_some() && scroll_offset < left_bound {
            return last;
        }
        if scroll_offset < right_bound || items.peek().is_none() {
            return Some(candidate);
        }
        last = Some(candidate);
    }
    last
}

fn take_item<'a, K: Clone + 'a, H: 'a>(
    items: &mut impl Iterator<Item = &'a Item<K, H>>,
) -> Option<PagePosition<K>> {
    items.next().map(|item| PagePosition {
        key: item.key.clone(),
        offset: item.offset,
        width_factor: item.width_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{IndexSource, InfiniteSource, assert_close};

    fn offsets<H>(window: &ItemWindow<i64, H>) -> Vec<(i64, f64)> {
        window.iter().map(|item| (item.key, item.offset)).collect()
    }

    fn assert_continuous<H>(window: &ItemWindow<i64, H>, margin_offset: f64) {
        for (left, right) in window.iter().zip(window.iter().skip(1)) {
            if right.key == left.key + 1 {
                assert_close(
                    right.offset - left.offset,
                    f64::from(left.width_factor) + margin_offset,
                );
            }
        }
    }

    #[test]
    fn offsets_are_laid_out_from_the_anchor() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &0, 1).anchor.expect("anchor materialized");
        let bounds = recompute(&mut window, &source, anchor, None, 0.0);
        assert_eq!(offsets(&window), vec![(0, 0.0), (1, 1.0)]);
        assert_eq!(bounds.first, 0.0);
        assert!(!bounds.is_last_exact());
    }

    #[test]
    fn anchor_change_carries_offsets_forward() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &0, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, None, 0.1);

        let snapshot = AnchorSnapshot {
            key: 0,
            offset: 0.0,
            width_factor: 1.0,
        };
        let anchor = window.reconcile(&mut source, &1, 1).anchor.expect("anchor materialized");
        let bounds = recompute(&mut window, &source, anchor, Some(&snapshot), 0.1);
        assert_close(window.get(anchor).expect("anchor item").offset, 1.1);
        assert_eq!(bounds.first, 0.0);
        assert_continuous(&window, 0.1);
    }

    #[test]
    fn jump_fills_gaps_with_source_widths() {
        let widths = vec![1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut source = IndexSource::new(10).with_widths(widths);
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &0, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, None, 0.0);
        window.pin_all();

        let snapshot = AnchorSnapshot {
            key: 0,
            offset: 0.0,
            width_factor: 1.0,
        };
        let anchor = window.reconcile(&mut source, &5, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, Some(&snapshot), 0.0);
        // Keys 0 through 4 span 1 + 1 + 0.5 + 0.5 + 1 pager widths.
        assert_close(window.get(anchor).expect("anchor item").offset, 4.0);
        let all = offsets(&window);
        let keys: Vec<i64> = all.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec![0, 1, 4, 5, 6]);
        assert_close(all[0].1, 0.0);
        assert_close(all[1].1, 1.0);
        assert_close(all[2].1, 3.0);
        assert_close(all[4].1, 5.0);
    }

    #[test]
    fn moving_backwards_re_stamps_from_the_old_anchor() {
        let mut source = InfiniteSource::new();
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &0, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, None, 0.0);
        let snapshot = AnchorSnapshot {
            key: 0,
            offset: 0.0,
            width_factor: 1.0,
        };
        let anchor = window.reconcile(&mut source, &-1, 1).anchor.expect("anchor materialized");
        let bounds = recompute(&mut window, &source, anchor, Some(&snapshot), 0.0);
        assert_eq!(offsets(&window), vec![(-2, -2.0), (-1, -1.0), (0, 0.0)]);
        assert_eq!(bounds, Bounds::UNKNOWN);
    }

    #[test]
    fn last_bound_aligns_the_last_page_with_the_right_edge() {
        let mut source = IndexSource::new(3).with_widths(vec![1.0, 1.0, 0.5]);
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &1, 1).anchor.expect("anchor materialized");
        let bounds = recompute(&mut window, &source, anchor, None, 0.0);
        assert_eq!(bounds.first, -1.0);
        assert_close(bounds.last, 0.5);
        assert_close(bounds.clamp(7.0), 0.5);
        assert_close(bounds.clamp(-3.0), -1.0);
    }

    #[test]
    fn page_at_resolves_gaps_and_edges() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        let anchor = window.reconcile(&mut source, &0, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, None, 0.0);
        window.pin_all();
        let snapshot = AnchorSnapshot {
            key: 0,
            offset: 0.0,
            width_factor: 1.0,
        };
        let anchor = window.reconcile(&mut source, &5, 1).anchor.expect("anchor materialized");
        recompute(&mut window, &source, anchor, Some(&snapshot), 0.0);

        let at = |offset| page_at(&window, &source, offset, 0.0).expect("page under offset");
        assert_eq!(at(-0.5).key, 0);
        assert_eq!(at(0.5).key, 0);
        assert_eq!(at(1.25).key, 1);
        let gap = at(2.5);
        assert_eq!(gap.key, 2);
        assert_close(gap.offset, 2.0);
        assert_eq!(at(5.5).key, 5);
        assert_eq!(at(42.0).key, 6);
    }

    #[test]
    fn page_at_on_an_empty_window_is_none() {
        let source = IndexSource::new(3);
        let window: ItemWindow<i64, u64> = ItemWindow::new();
        assert!(page_at(&window, &source, 0.0, 0.0).is_none());
    }
}
