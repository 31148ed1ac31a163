//! Physical pixel values used at the host boundary.
//!
//! The engine keeps its scroll position in `f64` pixels so that sub-pixel drag
//! deltas are never lost, even thousands of pages away from the origin. Hosts
//! get whole [`Px`] values for page placement and for the `offset_pixels`
//! argument of page-scrolled callbacks.
//!
//! ```
//! use stream_pager::Px;
//!
//! assert_eq!(Px::saturating_from_f32(12.9), Px(12));
//! assert_eq!(Px(12).to_f32(), 12.0);
//! ```

/// A physical pixel value.
///
/// Negative values are allowed; page left edges to the left of the first
/// materialized page are negative in content coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Px(pub i32);

impl Px {
    /// A constant representing zero pixels.
    pub const ZERO: Self = Self(0);

    /// Returns the raw i32 value.
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Converts the pixel value to f32.
    pub fn to_f32(self) -> f32 {
        self.0 as f32
    }

    /// Converts the pixel value to f64.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Creates a `Px` from an f32 value, truncating toward zero and saturating
    /// at the numeric bounds instead of overflowing.
    ///
    /// ```
    /// use stream_pager::Px;
    ///
    /// assert_eq!(Px::saturating_from_f32(42.7), Px(42));
    /// assert_eq!(Px::saturating_from_f32(-42.7), Px(-42));
    /// assert_eq!(Px::saturating_from_f32(f32::INFINITY), Px(i32::MAX));
    /// ```
    pub fn saturating_from_f32(value: f32) -> Self {
        if value.is_nan() {
            return Px::ZERO;
        }
        let clamped_value = value.clamp(i32::MIN as f32, i32::MAX as f32);
        Px(clamped_value as i32)
    }

    /// Creates a `Px` from an f64 value, truncating toward zero and saturating
    /// at the numeric bounds.
    pub fn saturating_from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Px::ZERO;
        }
        Px(value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_from_f32() {
        assert_eq!(Px::saturating_from_f32(f32::MAX), Px(i32::MAX));
        assert_eq!(Px::saturating_from_f32(f32::MIN), Px(i32::MIN));
        assert_eq!(Px::saturating_from_f32(f32::NAN), Px::ZERO);
        assert_eq!(Px::saturating_from_f32(-100.5), Px(-100));
    }

    #[test]
    fn test_saturating_from_f64() {
        assert_eq!(Px::saturating_from_f64(1e12), Px(i32::MAX));
        assert_eq!(Px::saturating_from_f64(f64::NAN), Px::ZERO);
        assert_eq!(Px::saturating_from_f64(128_000_000.75), Px(128_000_000));
    }
}
