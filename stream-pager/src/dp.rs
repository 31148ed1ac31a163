//! # Density-Independent Pixels (Dp)
//!
//! Pager tuning values (touch slop, fling distance, gutter width, fling
//! velocities) are expressed in dp so that a swipe feels the same on a
//! low-density laptop panel and a high-density phone screen.
//!
//! ## Scale Factor
//!
//! The conversion between dp and physical pixels is controlled by the global
//! [`SCALE_FACTOR`]. Hosts set it once from the display density; when it was
//! never set the engine behaves as if it were `1.0`.
//!
//! ```
//! use stream_pager::Dp;
//!
//! let fling_distance = Dp(25.0);
//! let pixels = fling_distance.to_pixels_f32();
//! assert!(pixels > 0.0);
//! ```

use std::sync::OnceLock;

use parking_lot::RwLock;

/// Global scale factor for converting between density-independent pixels and
/// physical pixels.
///
/// The value is the number of physical pixels per dp: `2.0` on a typical
/// high-density phone, `1.0` on a standard-density desktop display.
pub static SCALE_FACTOR: OnceLock<RwLock<f64>> = OnceLock::new();

/// Sets the global scale factor, initializing it on first use.
pub fn set_scale_factor(scale_factor: f64) {
    let lock = SCALE_FACTOR.get_or_init(|| RwLock::new(1.0));
    *lock.write() = scale_factor;
}

fn scale_factor() -> f64 {
    SCALE_FACTOR.get().map(|lock| *lock.read()).unwrap_or(1.0)
}

/// Density-independent pixels (dp).
///
/// Velocities are also stored as `Dp` and read as "dp per second".
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dp(pub f64);

impl Dp {
    /// Converts this dp value to physical pixels as an `f32`.
    pub fn to_pixels_f32(&self) -> f32 {
        (self.0 * scale_factor()) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_scale_factor_is_identity() {
        // Nothing in the test suite sets the scale factor, so conversions are 1:1.
        assert_eq!(Dp(25.0).to_pixels_f32(), 25.0);
        assert_eq!(Dp(0.5).to_pixels_f32(), 0.5);
    }
}
