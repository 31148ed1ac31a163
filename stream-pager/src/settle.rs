//! Time-based settle animation toward a resting scroll position.

use std::{f32::consts::PI, time::Duration};

use tracing::trace;

/// Length of the frame assumed for the first tick after a settle starts.
const FIRST_FRAME: Duration = Duration::from_millis(16);

/// Quintic ease-out: fast start, gentle landing.
pub(crate) fn interpolate(progress: f64) -> f64 {
    let t = progress.clamp(0.0, 1.0) - 1.0;
    t * t * t * t * t + 1.0
}

/// Maps a travel ratio in `[0, 1]` onto `[-sin(0.15π), sin(0.15π)]`, so short
/// settles are not proportionally faster than long ones.
fn distance_influence(ratio: f32) -> f32 {
    ((ratio - 0.5) * 0.3 * PI / 2.0).sin()
}

/// Inputs to [`settle_duration`], all in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleMetrics {
    /// Scroll distance to cover.
    pub dx: f32,
    /// Viewport width.
    pub width: f32,
    /// Release velocity in pixels per second, or zero.
    pub velocity: f32,
    /// Width of the current page.
    pub page_width: f32,
    /// Page margin.
    pub margin: f32,
}

/// Computes how long a settle should take, capped at `max`.
///
/// With a velocity the duration follows the finger's speed over an eased
/// distance; without one it grows by 100 ms per page crossed.
pub fn settle_duration(metrics: SettleMetrics, max: Duration) -> Duration {
    let SettleMetrics {
        dx,
        width,
        velocity,
        page_width,
        margin,
    } = metrics;
    let half_width = width / 2.0;
    let ratio = if width > 0.0 {
        (dx.abs() / width).min(1.0)
    } else {
        1.0
    };
    let distance = half_width + half_width * distance_influence(ratio);

    let velocity = velocity.abs();
    let millis = if velocity > 0.0 {
        4.0 * (1000.0 * (distance / velocity).abs()).round()
    } else {
        let stride = page_width + margin;
        let page_delta = if stride > 0.0 { dx.abs() / stride } else { 0.0 };
        (page_delta + 1.0) * 100.0
    };
    Duration::from_millis(millis.max(0.0) as u64).min(max)
}

/// A running settle, advanced by host frame ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Settler {
    start_x: f64,
    final_x: f64,
    current_x: f64,
    duration: Duration,
    elapsed: Duration,
    last_frame_nanos: Option<u64>,
    finished: bool,
}

impl Settler {
    /// Starts a settle from `start_x` to `final_x`.
    pub fn start(start_x: f64, final_x: f64, duration: Duration) -> Self {
        Self {
            start_x,
            final_x,
            current_x: start_x,
            duration,
            elapsed: Duration::ZERO,
            last_frame_nanos: None,
            finished: false,
        }
    }

    /// Advances to `frame_nanos` and returns the new position.
    pub fn tick(&mut self, frame_nanos: u64) -> f64 {
        if self.finished {
            return self.current_x;
        }
        let frame = match self.last_frame_nanos {
            Some(last) => Duration::from_nanos(frame_nanos.saturating_sub(last)),
            None => FIRST_FRAME,
        };
        self.last_frame_nanos = Some(frame_nanos);
        self.elapsed += frame;

        if self.elapsed >= self.duration || self.duration.is_zero() {
            self.finish();
        } else {
            let progress = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
            self.current_x = self.start_x + (self.final_x - self.start_x) * interpolate(progress);
        }
        trace!(x = self.current_x, elapsed = ?self.elapsed, "Settle frame");
        self.current_x
    }

    /// Jumps to the destination.
    pub fn finish(&mut self) {
        self.current_x = self.final_x;
        self.finished = true;
    }

    /// Stops where the settle currently is.
    pub fn abort(&mut self) {
        self.finished = true;
    }

    /// Starts over from `start_x` toward `final_x`, keeping the time that was
    /// left.
    pub fn restart(&mut self, start_x: f64, final_x: f64) {
        let remaining = self.remaining_duration();
        *self = Self::start(start_x, final_x, remaining);
    }

    /// Whether the settle reached its destination or was stopped.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Latest animated position.
    pub fn current_x(&self) -> f64 {
        self.current_x
    }

    /// Destination.
    pub fn final_x(&self) -> f64 {
        self.final_x
    }

    /// Distance still to cover.
    pub fn remaining_distance(&self) -> f64 {
        (self.final_x - self.current_x).abs()
    }

    /// Time still to run.
    pub fn remaining_duration(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_close, ms};

    const MAX: Duration = Duration::from_millis(600);

    fn metrics(dx: f32, velocity: f32) -> SettleMetrics {
        SettleMetrics {
            dx,
            width: 1280.0,
            velocity,
            page_width: 1280.0,
            margin: 0.0,
        }
    }

    #[test]
    fn interpolator_eases_out() {
        assert_eq!(interpolate(0.0), 0.0);
        assert_eq!(interpolate(1.0), 1.0);
        assert!(interpolate(0.5) > 0.9);
        assert_eq!(interpolate(3.0), 1.0);
    }

    #[test]
    fn duration_grows_with_pages_crossed() {
        assert_eq!(settle_duration(metrics(640.0, 0.0), MAX), Duration::from_millis(150));
        assert_eq!(settle_duration(metrics(1280.0, 0.0), MAX), Duration::from_millis(200));
        assert_eq!(settle_duration(metrics(6400.0, 0.0), MAX), MAX);
    }

    #[test]
    fn fast_flings_settle_quickly() {
        assert_eq!(settle_duration(metrics(100.0, 8000.0), MAX), Duration::from_millis(256));
        assert_eq!(settle_duration(metrics(1250.0, 2000.0), MAX), MAX);
    }

    #[test]
    fn ticks_advance_toward_the_destination() {
        let mut settler = Settler::start(0.0, 100.0, Duration::from_millis(160));
        let first = settler.tick(ms(1000));
        assert_close(first, 100.0 * interpolate(0.1));
        let second = settler.tick(ms(1080));
        assert_close(second, 100.0 * interpolate(0.6));
        assert!(!settler.is_finished());
        assert_eq!(settler.tick(ms(1200)), 100.0);
        assert!(settler.is_finished());
        assert_eq!(settler.remaining_distance(), 0.0);
    }

    #[test]
    fn abort_keeps_the_current_position() {
        let mut settler = Settler::start(0.0, 1000.0, Duration::from_millis(320));
        let x = settler.tick(0);
        settler.abort();
        assert!(settler.is_finished());
        assert_eq!(settler.current_x(), x);
        assert_eq!(settler.tick(ms(500)), x);
    }

    #[test]
    fn restart_keeps_the_remaining_time() {
        let mut settler = Settler::start(0.0, 1000.0, Duration::from_millis(160));
        settler.tick(0);
        settler.restart(50.0, 500.0);
        assert_eq!(settler.remaining_duration(), Duration::from_millis(144));
        assert_eq!(settler.current_x(), 50.0);
        assert_eq!(settler.final_x(), 500.0);
    }
}
