//! Procedural idle motion layered over the blended pose
//!
//! Always on: breathing, blinking, eye drift, and a mouth flap while talking.
//! Blink timing comes from a seeded PRNG so runs are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use visage_core::{PoseParam, PoseVector, Side};

pub const DEFAULT_IDLE_SEED: u64 = 42;

/// Seconds a blink takes from open to closed and back
pub const BLINK_DURATION: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct IdleOverlay {
    rng: StdRng,
    time: f64,
    next_blink: f64,
    blinking: bool,
    blink_t: f64,
    talking: bool,
}

impl IdleOverlay {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_blink = 2.0 + rng.gen::<f64>() * 3.0;
        Self {
            rng,
            time: 0.0,
            next_blink,
            blinking: false,
            blink_t: 0.0,
            talking: false,
        }
    }

    pub fn set_talking(&mut self, talking: bool) {
        self.talking = talking;
    }

    pub fn is_talking(&self) -> bool {
        self.talking
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    /// Seconds of motion applied so far
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    /// Seconds until the next blink is due
    pub fn next_blink_in(&self) -> f64 {
        self.next_blink
    }

    /// Apply one tick of idle motion to `pose`
    pub fn step(&mut self, pose: PoseVector, dt: f64) -> PoseVector {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.time += dt;
        let t = self.time;
        let mut out = pose;

        out[PoseParam::FaceScale] += 0.008 * (t * 1.5).sin();

        self.next_blink -= dt;
        if self.next_blink <= 0.0 && !self.blinking {
            self.blinking = true;
            self.blink_t = 0.0;
            self.next_blink = 2.0 + self.rng.gen::<f64>() * 4.0;
        }

        if self.blinking {
            self.blink_t += dt;
            if self.blink_t < BLINK_DURATION {
                // Multiplicative, so an eye already held shut stays shut
                let closure = (self.blink_t / BLINK_DURATION * PI).sin();
                for side in Side::BOTH {
                    out[PoseParam::eye_open(side)] *= 1.0 - closure * 0.95;
                }
            } else {
                self.blinking = false;
            }
        }

        let drift_x = 0.008 * (t * 0.7 + 1.3).sin();
        let drift_y = 0.005 * (t * 0.5 + 2.7).sin();
        for side in Side::BOTH {
            out[PoseParam::pupil_x(side)] += drift_x;
            out[PoseParam::pupil_y(side)] += drift_y;
        }

        if self.talking {
            out[PoseParam::MouthOpen] += 0.15 * (t * 5.0 * PI).sin().abs();
        }

        out
    }
}

impl Default for IdleOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_first_blink_window() {
        for seed in 0..20 {
            let idle = IdleOverlay::new(seed);
            assert!((2.0..5.0).contains(&idle.next_blink_in()));
        }
    }

    #[test]
    fn test_same_seed_same_motion() {
        let mut a = IdleOverlay::default();
        let mut b = IdleOverlay::default();
        for _ in 0..600 {
            let pa = a.step(PoseVector::neutral(), DT);
            let pb = b.step(PoseVector::neutral(), DT);
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn test_blink_happens_within_first_window() {
        let mut idle = IdleOverlay::default();
        let mut min_eye = f64::MAX;
        for _ in 0..(5.2 / DT) as usize {
            let pose = idle.step(PoseVector::neutral(), DT);
            min_eye = min_eye.min(pose[PoseParam::LeftEyeOpen]);
        }
        assert!(min_eye < 0.3, "expected a blink, min eye openness {}", min_eye);
    }

    #[test]
    fn test_closed_eye_stays_closed() {
        let mut idle = IdleOverlay::default();
        let closed = PoseVector::neutral()
            .with(PoseParam::LeftEyeOpen, 0.0)
            .with(PoseParam::RightEyeOpen, 0.0);
        for _ in 0..600 {
            let pose = idle.step(closed, DT);
            assert_eq!(pose[PoseParam::LeftEyeOpen], 0.0);
            assert_eq!(pose[PoseParam::RightEyeOpen], 0.0);
        }
    }

    #[test]
    fn test_motion_is_small() {
        let mut idle = IdleOverlay::default();
        for _ in 0..600 {
            let pose = idle.step(PoseVector::neutral(), DT);
            assert!((pose[PoseParam::FaceScale] - 1.0).abs() < 0.0081);
            assert!(pose[PoseParam::LeftPupilX].abs() < 0.0081);
            assert!(pose[PoseParam::RightPupilY].abs() < 0.0051);
            assert_eq!(pose[PoseParam::MouthOpen], 0.0);
        }
    }

    #[test]
    fn test_talking_flaps_mouth() {
        let mut idle = IdleOverlay::default();
        idle.set_talking(true);
        let mut max_open: f64 = 0.0;
        for _ in 0..60 {
            let pose = idle.step(PoseVector::neutral(), DT);
            assert!(pose[PoseParam::MouthOpen] >= 0.0);
            max_open = max_open.max(pose[PoseParam::MouthOpen]);
        }
        assert!(max_open > 0.1 && max_open <= 0.15);
    }
}
