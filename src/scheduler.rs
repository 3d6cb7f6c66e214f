//! Randomized auto-launch timer.
//!
//! The timer is polled from the frame loop with the show's clock in
//! milliseconds; it never runs on its own, so it cannot race a frame.

use crate::entities::FireworkKind;
use std::ops::RangeInclusive;

pub const MIN_AUTO_DELAY_MS: u64 = 2000;
pub const MAX_AUTO_DELAY_MS: u64 = 7000;

/// Launch target in viewport units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaunchRequest {
    pub x: f32,
    pub y: f32,
    /// `None` rolls the firework type at launch.
    pub kind: Option<FireworkKind>,
}

#[derive(Debug)]
pub struct AutoLauncher {
    next_fire_ms: Option<f64>,
    delay_ms: RangeInclusive<u64>,
}

impl Default for AutoLauncher {
    fn default() -> Self {
        Self::new(MIN_AUTO_DELAY_MS..=MAX_AUTO_DELAY_MS)
    }
}

impl AutoLauncher {
    pub fn new(delay_ms: RangeInclusive<u64>) -> Self {
        Self {
            next_fire_ms: None,
            delay_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_fire_ms.is_some()
    }

    /// Arms the timer to fire on the next poll. A running timer is left alone.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.is_running() {
            return false;
        }
        self.next_fire_ms = Some(now_ms);
        true
    }

    pub fn cancel(&mut self) {
        self.next_fire_ms = None;
    }

    /// Fires at most once per call: picks a target in the top 80% of the
    /// viewport and re-arms itself a random delay after the due time.
    pub fn poll(&mut self, now_ms: f64, viewport: (f32, f32), rng: &mut fastrand::Rng) -> Option<LaunchRequest> {
        let due = self.next_fire_ms?;
        if now_ms < due {
            return None;
        }

        let request = LaunchRequest {
            x: rng.f32() * viewport.0,
            y: rng.f32() * viewport.1 * 0.8,
            kind: None,
        };
        let delay = rng.u64(self.delay_ms.clone());
        self.next_fire_ms = Some(due + delay as f64);
        log::debug!("auto launch at ({:.0}, {:.0}); next in {} ms", request.x, request.y, delay);
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_idempotent() {
        let mut timer = AutoLauncher::default();
        assert!(timer.start(0.0));
        assert!(!timer.start(50.0));
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(timer.poll(0.0, (100.0, 100.0), &mut rng).is_some());
        assert!(timer.poll(0.0, (100.0, 100.0), &mut rng).is_none());
    }

    #[test]
    fn delays_stay_in_range() {
        let mut timer = AutoLauncher::default();
        let mut rng = fastrand::Rng::with_seed(42);
        timer.start(0.0);

        let mut now = 0.0;
        let mut fired_at = Vec::new();
        while fired_at.len() < 200 {
            if let Some(req) = timer.poll(now, (800.0, 600.0), &mut rng) {
                assert!((0.0..800.0).contains(&req.x));
                assert!((0.0..480.0).contains(&req.y));
                fired_at.push(now);
            }
            now += 1.0;
        }
        for gap in fired_at.windows(2).map(|w| w[1] - w[0]) {
            assert!((2000.0..=7000.0).contains(&gap));
        }
    }

    #[test]
    fn late_poll_does_not_delay_the_next_launch() {
        let mut timer = AutoLauncher::default();
        let mut rng = fastrand::Rng::with_seed(17);
        let mut replay = rng.clone();
        timer.start(0.0);

        // The first launch is picked up 10.5 ms after it was due.
        assert!(timer.poll(10.5, (800.0, 600.0), &mut rng).is_some());
        replay.f32();
        replay.f32();
        let delay = replay.u64(MIN_AUTO_DELAY_MS..=MAX_AUTO_DELAY_MS) as f64;

        assert!(timer.poll(delay - 0.5, (800.0, 600.0), &mut rng).is_none());
        assert!(timer.poll(delay, (800.0, 600.0), &mut rng).is_some());
    }

    #[test]
    fn cancelled_timer_stays_quiet() {
        let mut timer = AutoLauncher::default();
        let mut rng = fastrand::Rng::with_seed(3);
        timer.start(0.0);
        timer.cancel();
        assert!(!timer.is_running());
        assert!(timer.poll(1_000_000.0, (10.0, 10.0), &mut rng).is_none());
        assert!(timer.start(10.0));
    }
}
