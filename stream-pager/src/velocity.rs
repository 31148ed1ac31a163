//! Horizontal pointer velocity sampling.

use std::{collections::VecDeque, time::Duration};

const VELOCITY_SAMPLE_WINDOW: Duration = Duration::from_millis(90);
const VELOCITY_IDLE_CUTOFF: Duration = Duration::from_millis(65);

fn elapsed_secs(later: u64, earlier: u64) -> f32 {
    later.saturating_sub(earlier) as f32 / 1_000_000_000.0
}

/// Tracks recent horizontal movement of the active pointer.
///
/// Velocities are in pixels per second; positive means the finger moved right.
/// Samples older than the window are dropped, newer samples weigh more, and a
/// finger that stopped before lifting resolves toward zero.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityTracker {
    samples: VecDeque<(u64, f32)>,
    last_x: Option<f32>,
    last_sample_nanos: u64,
}

impl VelocityTracker {
    /// Creates an empty tracker anchored at `now_nanos`.
    pub fn new(now_nanos: u64) -> Self {
        Self {
            samples: VecDeque::new(),
            last_x: None,
            last_sample_nanos: now_nanos,
        }
    }

    /// Records the pointer at `x`.
    pub fn add_position(&mut self, now_nanos: u64, x: f32) {
        let Some(last_x) = self.last_x.replace(x) else {
            self.last_sample_nanos = now_nanos;
            return;
        };
        let delta_time = elapsed_secs(now_nanos, self.last_sample_nanos);
        self.last_sample_nanos = now_nanos;
        if delta_time <= 0.0 {
            return;
        }

        let velocity = (x - last_x) / delta_time;
        if velocity.is_finite() {
            self.samples.push_back((now_nanos, velocity));
        }
        self.prune(now_nanos);
    }

    /// Drops every sample, e.g. when the active pointer changes.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_x = None;
    }

    /// Resolves the current velocity, clamped to `±max_velocity`.
    pub fn resolve(&mut self, now_nanos: u64, max_velocity: f32) -> f32 {
        self.prune(now_nanos);
        if self.samples.is_empty() {
            return 0.0;
        }

        let window_secs = VELOCITY_SAMPLE_WINDOW.as_secs_f32().max(f32::EPSILON);
        let mut weighted_sum = 0.0f32;
        let mut total_weight = 0.0f32;
        for &(timestamp, velocity) in &self.samples {
            let age_secs = elapsed_secs(now_nanos, timestamp).clamp(0.0, window_secs);
            let weight = (window_secs - age_secs).max(0.0);
            if weight > 0.0 {
                weighted_sum += velocity * weight;
                total_weight += weight;
            }
        }

        if total_weight <= f32::EPSILON {
            self.samples.clear();
            return 0.0;
        }

        let idle_time = elapsed_secs(now_nanos, self.last_sample_nanos);
        let damping = (1.0 - idle_time / VELOCITY_IDLE_CUTOFF.as_secs_f32()).clamp(0.0, 1.0);
        let velocity = weighted_sum / total_weight * damping;
        let max_velocity = max_velocity.abs();
        velocity.clamp(-max_velocity, max_velocity)
    }

    fn prune(&mut self, now_nanos: u64) {
        let window_nanos = VELOCITY_SAMPLE_WINDOW.as_nanos() as u64;
        while let Some(&(timestamp, _)) = self.samples.front() {
            if now_nanos.saturating_sub(timestamp) > window_nanos {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}
