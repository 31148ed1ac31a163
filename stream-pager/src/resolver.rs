//! Picks the page a released drag settles on.

use crate::{items::ItemWindow, offsets::PagePosition, source::PageSource};

/// Pixel thresholds a release must exceed to count as a fling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingThresholds {
    /// Minimum finger displacement since the gesture started.
    pub distance: f32,
    /// Minimum release velocity, in pixels per second.
    pub velocity: f32,
}

/// Resolves the settle target of a drag released while `page` sat under the
/// viewport's left edge, `page_offset` of the way scrolled past.
///
/// A fling settles on `page` when the finger moved right and on the page after
/// it otherwise. Slower releases snap to the nearest page. The result is always
/// a materialized key: a gap resolves to the next page in the settle direction.
pub fn resolve_target<S>(
    source: &S,
    window: &ItemWindow<S::Key, S::Handle>,
    page: &PagePosition<S::Key>,
    page_offset: f32,
    velocity: f32,
    travel: f32,
    thresholds: FlingThresholds,
) -> S::Key
where
    S: PageSource,
{
    let is_fling = travel.abs() > thresholds.distance && velocity.abs() > thresholds.velocity;
    let advance = if is_fling {
        velocity <= 0.0
    } else {
        page_offset + 0.5 >= 1.0
    };
    let target = if advance {
        source.next_key(&page.key).unwrap_or_else(|| page.key.clone())
    } else {
        page.key.clone()
    };

    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return target;
    };
    let target = target.clamp(first.key.clone(), last.key.clone());
    match window.search(&target) {
        Ok(_) => target,
        // A gap has no handle to show; settle on its materialized neighbour.
        Err(index) => {
            let neighbour = if advance { index } else { index.saturating_sub(1) };
            window
                .ids()
                .get(neighbour)
                .and_then(|id| window.get(*id))
                .map_or(target, |item| item.key.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::IndexSource;

    const THRESHOLDS: FlingThresholds = FlingThresholds {
        distance: 25.0,
        velocity: 50.0,
    };

    fn page(key: i64) -> PagePosition<i64> {
        PagePosition {
            key,
            offset: key as f64,
            width_factor: 1.0,
        }
    }

    fn window_around(source: &mut IndexSource, anchor: i64) -> ItemWindow<i64, u64> {
        let mut window = ItemWindow::new();
        window.reconcile(source, &anchor, 1);
        window
    }

    #[test]
    fn slow_release_snaps_to_the_nearest_page() {
        let mut source = IndexSource::new(10);
        let window = window_around(&mut source, 3);
        let resolve =
            |offset| resolve_target(&source, &window, &page(3), offset, 0.0, -300.0, THRESHOLDS);
        assert_eq!(resolve(0.2), 3);
        assert_eq!(resolve(0.49), 3);
        assert_eq!(resolve(0.5), 4);
        assert_eq!(resolve(0.9), 4);
    }

    #[test]
    fn fling_follows_the_finger() {
        let mut source = IndexSource::new(10);
        let window = window_around(&mut source, 3);
        assert_eq!(
            resolve_target(&source, &window, &page(3), 0.05, -2000.0, -30.0, THRESHOLDS),
            4
        );
        assert_eq!(
            resolve_target(&source, &window, &page(2), 0.95, 2000.0, 30.0, THRESHOLDS),
            2
        );
    }

    #[test]
    fn short_fling_falls_back_to_snapping() {
        let mut source = IndexSource::new(10);
        let window = window_around(&mut source, 3);
        assert_eq!(
            resolve_target(&source, &window, &page(3), 0.1, -2000.0, -20.0, THRESHOLDS),
            3
        );
    }

    #[test]
    fn target_stays_within_materialized_keys() {
        let mut source = IndexSource::new(10);
        let window = window_around(&mut source, 9);
        assert_eq!(
            resolve_target(&source, &window, &page(9), 0.9, -5000.0, -400.0, THRESHOLDS),
            9
        );

        let mut source = IndexSource::new(10);
        let window = window_around(&mut source, 0);
        assert_eq!(
            resolve_target(&source, &window, &page(1), 0.9, 0.0, -400.0, THRESHOLDS),
            1
        );
    }

    #[test]
    fn gaps_resolve_to_the_neighbour_in_the_settle_direction() {
        let mut source = IndexSource::new(10).with_missing(vec![5]);
        let mut window = ItemWindow::new();
        window.reconcile(&mut source, &4, 2);
        let keys: Vec<i64> = window.iter().map(|item| item.key).collect();
        assert_eq!(keys, vec![2, 3, 4, 6]);

        assert_eq!(
            resolve_target(&source, &window, &page(4), 0.7, 0.0, -900.0, THRESHOLDS),
            6
        );
        assert_eq!(
            resolve_target(&source, &window, &page(5), 0.2, 0.0, 300.0, THRESHOLDS),
            4
        );
    }
}
