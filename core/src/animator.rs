use std::time::{Duration, Instant};

use crate::playback::PlaybackSnapshot;

/// Smooths the seek bar between the one-second `currentTime` ticks.
///
/// Each new target starts a short eased tween from whatever is on screen, so
/// the bar sweeps instead of jumping. Purely cosmetic.
#[derive(Debug, Clone)]
pub struct SeekBarAnimator {
    from: f64,
    to: f64,
    started: Option<Instant>,
    duration: Duration,
}

impl SeekBarAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            started: None,
            duration,
        }
    }

    /// Retarget at the snapshot's elapsed fraction. No snapshot means an
    /// empty bar.
    pub fn track(&mut self, snapshot: Option<&PlaybackSnapshot>, now: Instant) {
        let target = snapshot.map_or(0.0, PlaybackSnapshot::fraction);
        self.retarget(target, now);
    }

    /// Start a tween towards `target` unless it is already the target
    pub fn retarget(&mut self, target: f64, now: Instant) {
        let target = if target.is_finite() { target.clamp(0.0, 1.0) } else { 0.0 };
        if (target - self.to).abs() < f64::EPSILON {
            return;
        }

        self.from = self.value(now);
        self.to = target;
        self.started = Some(now);
    }

    /// Jump to an empty bar without animating
    pub fn reset(&mut self) {
        self.from = 0.0;
        self.to = 0.0;
        self.started = None;
    }

    /// Fraction to draw at `now`, in `[0, 1]`
    pub fn value(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return self.to;
        };

        let elapsed = now.saturating_duration_since(started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from + (self.to - self.from) * ease_in_out(t)
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|started| now.saturating_duration_since(started) < self.duration)
    }
}

impl Default for SeekBarAnimator {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

/// Cubic ease-in-out over `t` in `[0, 1]`
fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
