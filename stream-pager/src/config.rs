//! Tuning knobs of the pager engine.

use std::time::Duration;

use derive_setters::Setters;

use crate::{Dp, Px, PagerError};

/// Configuration of a [`StreamPager`](crate::StreamPager).
///
/// # Examples
///
/// ```
/// use stream_pager::{Dp, PagerConfig};
///
/// let config = PagerConfig::default()
///     .offscreen_limit(2)
///     .touch_slop(Dp(8.0));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Setters)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PagerConfig {
    /// Pages kept alive on each side of the current one. At least 1.
    pub offscreen_limit: usize,
    /// Gap between neighbouring pages.
    pub page_margin: Px,
    /// Distance a pointer travels before a drag starts.
    pub touch_slop: Dp,
    /// Slowest release, per second, that still counts as a fling.
    pub min_fling_velocity: Dp,
    /// Release velocities, per second, are clamped to this.
    pub max_fling_velocity: Dp,
    /// Shortest finger travel that still counts as a fling.
    pub fling_distance: Dp,
    /// A settle closer than this to its destination is finished, not caught.
    pub close_enough: Dp,
    /// Upper bound of the edge zones that defer to nested content; never
    /// more than a tenth of the viewport.
    pub gutter_size: Dp,
    /// Longest a settle may run.
    pub max_settle_duration: Duration,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            offscreen_limit: 1,
            page_margin: Px::ZERO,
            touch_slop: Dp(16.0),
            min_fling_velocity: Dp(50.0),
            max_fling_velocity: Dp(8000.0),
            fling_distance: Dp(25.0),
            close_enough: Dp(2.0),
            gutter_size: Dp(16.0),
            max_settle_duration: Duration::from_millis(600),
        }
    }
}

impl PagerConfig {
    /// Checks every field, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), PagerError> {
        if self.offscreen_limit == 0 {
            return Err(invalid("offscreen_limit", "must be at least 1"));
        }
        if self.page_margin.raw() < 0 {
            return Err(invalid("page_margin", "must not be negative"));
        }
        let distances = [
            ("touch_slop", self.touch_slop),
            ("min_fling_velocity", self.min_fling_velocity),
            ("max_fling_velocity", self.max_fling_velocity),
            ("fling_distance", self.fling_distance),
            ("close_enough", self.close_enough),
            ("gutter_size", self.gutter_size),
        ];
        for (field, value) in distances {
            if !value.0.is_finite() || value.0 < 0.0 {
                return Err(invalid(field, "must be a finite, non-negative distance"));
            }
        }
        if self.max_fling_velocity.0 < self.min_fling_velocity.0 {
            return Err(invalid(
                "max_fling_velocity",
                "must not be below min_fling_velocity",
            ));
        }
        Ok(())
    }

    /// Forces every field into range.
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.offscreen_limit = self.offscreen_limit.max(1);
        self.page_margin = Px(self.page_margin.raw().max(0));
        for (value, fallback) in [
            (&mut self.touch_slop, defaults.touch_slop),
            (&mut self.min_fling_velocity, defaults.min_fling_velocity),
            (&mut self.max_fling_velocity, defaults.max_fling_velocity),
            (&mut self.fling_distance, defaults.fling_distance),
            (&mut self.close_enough, defaults.close_enough),
            (&mut self.gutter_size, defaults.gutter_size),
        ] {
            if !value.0.is_finite() || value.0 < 0.0 {
                *value = fallback;
            }
        }
        if self.max_fling_velocity.0 < self.min_fling_velocity.0 {
            self.max_fling_velocity = self.min_fling_velocity;
        }
        self
    }
}

fn invalid(field: &'static str, reason: &str) -> PagerError {
    PagerError::InvalidConfig {
        field,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PagerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_limit_is_rejected_and_sanitized() {
        let config = PagerConfig::default().offscreen_limit(0);
        assert!(matches!(
            config.validate(),
            Err(PagerError::InvalidConfig {
                field: "offscreen_limit",
                ..
            })
        ));
        assert_eq!(config.sanitized().offscreen_limit, 1);
    }

    #[test]
    fn negative_distances_fall_back_to_defaults() {
        let config = PagerConfig::default()
            .touch_slop(Dp(-3.0))
            .page_margin(Px(-10))
            .close_enough(Dp(f64::NAN));
        assert!(config.validate().is_err());
        let sanitized = config.sanitized();
        assert_eq!(sanitized.touch_slop, Dp(16.0));
        assert_eq!(sanitized.page_margin, Px::ZERO);
        assert_eq!(sanitized.close_enough, Dp(2.0));
        assert_eq!(sanitized.validate(), Ok(()));
    }

    #[test]
    fn inverted_fling_range_is_rejected() {
        let config = PagerConfig::default().max_fling_velocity(Dp(10.0));
        assert!(config.validate().is_err());
        assert_eq!(config.sanitized().max_fling_velocity, Dp(50.0));
    }
}
