//! Materialized pages and the sliding window that keeps them alive.
//!
//! Items live in a [`SlotMap`] arena and are addressed by stable [`ItemId`]s.
//! A separate `order` vector holds the ids sorted by key, so inserting or
//! evicting during a reconciliation pass never invalidates the handles the
//! pass is still holding.

use slotmap::{SlotMap, new_key_type};
use tracing::{debug, warn};

use crate::source::{PageSource, width_fraction};

new_key_type! {
    /// Stable handle of a materialized item.
    pub struct ItemId;
}

/// Width, in pager widths, that must be materialized on each side of the
/// anchor before items past the offscreen limit may be evicted.
const WIDTH_BUFFER: f32 = 2.0;

/// One materialized page.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<K, H> {
    /// Page key.
    pub key: K,
    /// Handle returned by [`PageSource::instantiate`].
    pub handle: H,
    /// Page width as a fraction of the pager width.
    pub width_factor: f32,
    /// Left edge of the page, in pager widths.
    pub offset: f64,
    /// Immune to eviction while a long jump is in flight.
    pub pinned: bool,
}

/// Keys created and destroyed by one [`ItemWindow::reconcile`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<K> {
    /// The anchor's item, if it could be materialized.
    pub anchor: Option<ItemId>,
    /// Keys instantiated during the pass, in creation order.
    pub created: Vec<K>,
    /// Keys destroyed during the pass, in eviction order.
    pub destroyed: Vec<K>,
}

impl<K> Default for Reconciled<K> {
    fn default() -> Self {
        Self {
            anchor: None,
            created: Vec::new(),
            destroyed: Vec::new(),
        }
    }
}

/// Sorted, sparse list of materialized items.
#[derive(Debug, Clone)]
pub struct ItemWindow<K, H> {
    arena: SlotMap<ItemId, Item<K, H>>,
    order: Vec<ItemId>,
}

impl<K, H> Default for ItemWindow<K, H> {
    fn default() -> Self {
        Self {
            arena: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<K: Ord + Clone, H> ItemWindow<K, H> {
    /// Creates an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is materialized.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Items in key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Item<K, H>> + ExactSizeIterator {
        self.order.iter().map(|&id| &self.arena[id])
    }

    /// Item ids in key order.
    pub fn ids(&self) -> &[ItemId] {
        &self.order
    }

    /// Looks up an item by handle.
    pub fn get(&self, id: ItemId) -> Option<&Item<K, H>> {
        self.arena.get(id)
    }

    /// Looks up an item by handle, mutably.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item<K, H>> {
        self.arena.get_mut(id)
    }

    /// First item in key order.
    pub fn first(&self) -> Option<&Item<K, H>> {
        self.order.first().map(|&id| &self.arena[id])
    }

    /// Last item in key order.
    pub fn last(&self) -> Option<&Item<K, H>> {
        self.order.last().map(|&id| &self.arena[id])
    }

    /// Index in key order of `key`, or where it would be inserted.
    pub fn search(&self, key: &K) -> Result<usize, usize> {
        self.order
            .binary_search_by(|&id| self.arena[id].key.cmp(key))
    }

    /// Finds the item for `key`.
    pub fn find(&self, key: &K) -> Option<ItemId> {
        self.search(key).ok().map(|index| self.order[index])
    }

    /// Finds the item for `key` together with its index in key order.
    pub fn find_indexed(&self, key: &K) -> Option<(usize, ItemId)> {
        self.search(key).ok().map(|index| (index, self.order[index]))
    }

    /// Inserts an item at its sorted position.
    ///
    /// An item that already exists for the same key is replaced and returned.
    pub fn insert(&mut self, item: Item<K, H>) -> (ItemId, Option<Item<K, H>>) {
        match self.search(&item.key) {
            Ok(index) => {
                let id = self.order[index];
                let previous = std::mem::replace(&mut self.arena[id], item);
                (id, Some(previous))
            }
            Err(index) => {
                let id = self.arena.insert(item);
                self.order.insert(index, id);
                (id, None)
            }
        }
    }

    /// Removes an item.
    pub fn remove(&mut self, id: ItemId) -> Option<Item<K, H>> {
        let item = self.arena.remove(id)?;
        self.order.retain(|&other| other != id);
        Some(item)
    }

    /// Removes every item, in key order.
    pub fn drain(&mut self) -> Vec<Item<K, H>> {
        let order = std::mem::take(&mut self.order);
        let items = order
            .into_iter()
            .filter_map(|id| self.arena.remove(id))
            .collect();
        self.arena.clear();
        items
    }

    /// Pins every item so a long jump cannot evict it mid-flight.
    pub fn pin_all(&mut self) {
        for item in self.arena.values_mut() {
            item.pinned = true;
        }
    }

    /// Clears every pin, returning whether any item was pinned.
    pub fn clear_pins(&mut self) -> bool {
        let mut any = false;
        for item in self.arena.values_mut() {
            any |= std::mem::replace(&mut item.pinned, false);
        }
        any
    }

    /// Multiplies every offset by `factor`.
    pub fn scale_offsets(&mut self, factor: f64) {
        for item in self.arena.values_mut() {
            item.offset *= factor;
        }
    }

    /// Whether `key` has a materialized item.
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }
}

impl<K: Ord + Clone + std::fmt::Debug, H> ItemWindow<K, H> {
    /// Reconciles the window against `anchor`.
    ///
    /// Walks outward from the anchor in both directions. A neighbour is kept
    /// when it lies within `limit` hops, or when the side's width buffer is not
    /// yet satisfied and it lies within `2 * limit` hops. Missing neighbours in
    /// that range are instantiated; items beyond it are destroyed unless
    /// pinned. The anchor itself is never destroyed.
    pub fn reconcile<S>(&mut self, source: &mut S, anchor: &K, limit: usize) -> Reconciled<K>
    where
        S: PageSource<Key = K, Handle = H>,
    {
        let limit = limit.max(1);
        let mut outcome = Reconciled::default();

        let anchor_id = match self.find(anchor) {
            Some(id) => id,
            None => match self.materialize(source, anchor, &mut outcome) {
                Some(id) => id,
                None => {
                    warn!("No render handle for anchor page {anchor:?}; window left untouched");
                    return outcome;
                }
            },
        };
        outcome.anchor = Some(anchor_id);
        let anchor_width = self.arena[anchor_id].width_factor;

        let left_edge = self.fill_side(
            source,
            anchor,
            limit,
            WIDTH_BUFFER - anchor_width,
            Side::Left,
            &mut outcome,
        );
        self.evict_beyond(source, &left_edge, Side::Left, &mut outcome);

        let right_edge = self.fill_side(
            source,
            anchor,
            limit,
            WIDTH_BUFFER - anchor_width,
            Side::Right,
            &mut outcome,
        );
        self.evict_beyond(source, &right_edge, Side::Right, &mut outcome);

        debug!(
            created = ?outcome.created,
            destroyed = ?outcome.destroyed,
            "Reconciled window around {anchor:?}: {:?}",
            self.iter().map(|item| &item.key).collect::<Vec<_>>()
        );
        outcome
    }

    /// Walks one side of the anchor, materializing what the window needs.
    /// Returns the outermost key kept on that side.
    fn fill_side<S>(
        &mut self,
        source: &mut S,
        anchor: &K,
        limit: usize,
        width_needed: f32,
        side: Side,
        outcome: &mut Reconciled<K>,
    ) -> K
    where
        S: PageSource<Key = K, Handle = H>,
    {
        let mut edge = anchor.clone();
        let mut extra_width = 0.0f32;
        let mut hops = 0usize;
        loop {
            let Some(key) = side.step(source, &edge) else {
                break;
            };
            hops += 1;
            let within_limit = hops <= limit;
            let buffer_short = extra_width < width_needed && hops <= limit.saturating_mul(2);
            if !within_limit && !buffer_short {
                break;
            }

            extra_width += match self.find(&key) {
                Some(id) => self.arena[id].width_factor,
                None => match self.materialize(source, &key, outcome) {
                    Some(id) => self.arena[id].width_factor,
                    // The gap still takes up layout space.
                    None => width_fraction(source, &key),
                },
            };
            edge = key;
        }
        edge
    }

    fn evict_beyond<S>(&mut self, source: &mut S, edge: &K, side: Side, outcome: &mut Reconciled<K>)
    where
        S: PageSource<Key = K, Handle = H>,
    {
        let doomed: Vec<ItemId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| {
                let item = &self.arena[id];
                !item.pinned && side.is_beyond(&item.key, edge)
            })
            .collect();
        for id in doomed {
            if let Some(item) = self.remove(id) {
                outcome.destroyed.push(item.key.clone());
                source.destroy(&item.key, item.handle);
            }
        }
    }

    fn materialize<S>(
        &mut self,
        source: &mut S,
        key: &K,
        outcome: &mut Reconciled<K>,
    ) -> Option<ItemId>
    where
        S: PageSource<Key = K, Handle = H>,
    {
        let Some(handle) = source.instantiate(key) else {
            warn!("Page source returned no render handle for {key:?}; leaving a gap");
            return None;
        };
        let item = Item {
            key: key.clone(),
            handle,
            width_factor: width_fraction(source, key),
            offset: 0.0,
            pinned: false,
        };
        let (id, _) = self.insert(item);
        outcome.created.push(key.clone());
        Some(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn step<S: PageSource>(self, source: &S, key: &S::Key) -> Option<S::Key> {
        match self {
            Side::Left => source.prev_key(key),
            Side::Right => source.next_key(key),
        }
    }

    fn is_beyond<K: Ord>(self, key: &K, edge: &K) -> bool {
        match self {
            Side::Left => key < edge,
            Side::Right => key > edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{IndexSource, InfiniteSource};

    fn keys<H>(window: &ItemWindow<i64, H>) -> Vec<i64> {
        window.iter().map(|item| item.key).collect()
    }

    #[test]
    fn reconcile_materializes_one_page_each_side() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        let outcome = window.reconcile(&mut source, &0, 1);
        assert_eq!(keys(&window), vec![0, 1]);
        assert_eq!(outcome.created, vec![0, 1]);

        let outcome = window.reconcile(&mut source, &1, 1);
        assert_eq!(keys(&window), vec![0, 1, 2]);
        assert_eq!(outcome.created, vec![2]);
        assert!(outcome.destroyed.is_empty());
    }

    #[test]
    fn moving_the_anchor_inserts_and_evicts_in_one_pass() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &3, 1);
        assert_eq!(keys(&window), vec![2, 3, 4]);

        let outcome = window.reconcile(&mut source, &4, 1);
        assert_eq!(keys(&window), vec![3, 4, 5]);
        assert_eq!(outcome.created, vec![5]);
        assert_eq!(outcome.destroyed, vec![2]);
        assert_eq!(source.live_keys(), vec![3, 4, 5]);
    }

    #[test]
    fn jumping_far_replaces_the_whole_window() {
        let mut source = InfiniteSource::new();
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &0, 1);
        let outcome = window.reconcile(&mut source, &100, 1);
        assert_eq!(keys(&window), vec![99, 100, 101]);
        assert_eq!(outcome.destroyed, vec![-1, 0, 1]);
        assert_eq!(source.live_keys(), vec![99, 100, 101]);
    }

    #[test]
    fn pinned_items_survive_until_unpinned() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &0, 1);
        window.pin_all();
        window.reconcile(&mut source, &5, 1);
        assert_eq!(keys(&window), vec![0, 1, 4, 5, 6]);

        assert!(window.clear_pins());
        let outcome = window.reconcile(&mut source, &5, 1);
        assert_eq!(keys(&window), vec![4, 5, 6]);
        assert_eq!(outcome.destroyed, vec![0, 1]);
        assert!(!window.clear_pins());
    }

    #[test]
    fn narrow_pages_extend_the_window_up_to_twice_the_limit() {
        let mut source = IndexSource::new(20).with_uniform_width(0.5);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &10, 1);
        // Left needs 1.5 widths, right 1.5 beyond the anchor; both capped at two hops.
        assert_eq!(keys(&window), vec![8, 9, 10, 11, 12]);

        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &10, 2);
        assert_eq!(keys(&window), vec![7, 8, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn wide_limit_keeps_full_pages_past_the_width_buffer() {
        let mut source = IndexSource::new(20);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &10, 3);
        assert_eq!(keys(&window), vec![7, 8, 9, 10, 11, 12, 13]);
    }

    #[test]
    fn unbounded_limit_stops_at_the_sequence_ends() {
        let mut source = IndexSource::new(10);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &5, usize::MAX);
        assert_eq!(keys(&window), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn missing_handles_leave_gaps() {
        let mut source = IndexSource::new(10).with_missing(vec![4]);
        let mut window = ItemWindow::new();
        let outcome = window.reconcile(&mut source, &5, 1);
        assert_eq!(keys(&window), vec![5, 6]);
        assert_eq!(outcome.created, vec![5, 6]);

        let outcome = window.reconcile(&mut source, &4, 1);
        assert!(outcome.anchor.is_none());
        assert_eq!(keys(&window), vec![5, 6]);
    }

    #[test]
    fn no_duplicate_keys_across_repeated_passes() {
        let mut source = IndexSource::new(30);
        let mut window = ItemWindow::new();
        for anchor in [0, 3, 2, 9, 8, 8, 29, 0, 15] {
            window.reconcile(&mut source, &anchor, 2);
            let keys = keys(&window);
            let mut deduped = keys.clone();
            deduped.dedup();
            assert_eq!(keys, deduped);
            assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(keys.contains(&anchor));
            assert!(keys.iter().all(|key| (key - anchor).abs() <= 4));
        }
        assert_eq!(source.live_keys(), keys(&window));
    }

    #[test]
    fn drain_returns_items_in_key_order() {
        let mut source = IndexSource::new(5);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &2, 1);
        let drained: Vec<i64> = window.drain().into_iter().map(|item| item.key).collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(window.is_empty());
    }
}
