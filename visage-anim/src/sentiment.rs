//! Sentiment estimation over a sliding window of streamed text
//!
//! Every `feed` re-scores the whole window against the lexicons and pulls the
//! running affect toward the result; every `step` decays it toward zero, and
//! faster once the stream has gone quiet.

use crate::lexicon::{lookup, tokenize};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::trace;
use visage_core::AnimConfig;

/// Seconds since the last feed under which the face counts as talking
pub const TALKING_WINDOW: f64 = 0.5;

/// Seconds of silence after which decay runs three times faster
pub const SILENCE_THRESHOLD: f64 = 1.0;

const RECENCY_FALLOFF: f64 = 0.02;
const BLEND_PER_HIT: f64 = 0.15;
const MAX_BLEND: f64 = 0.6;

/// Continuous affect derived from text
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AffectState {
    /// -1 (negative) to +1 (positive)
    pub valence: f64,
    /// 0 (calm) to 1 (excited)
    pub arousal: f64,
    /// Text arrived within the last half second
    pub talking: bool,
}

impl AffectState {
    fn clamp(&mut self) {
        self.valence = self.valence.clamp(-1.0, 1.0);
        self.arousal = self.arousal.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone)]
pub struct SentimentEstimator {
    window: VecDeque<String>,
    capacity: usize,
    decay: f64,
    state: AffectState,
    last_feed: Option<f64>,
}

impl SentimentEstimator {
    pub fn new(window_size: usize, decay: f64) -> Self {
        let capacity = window_size.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            decay,
            state: AffectState::default(),
            last_feed: None,
        }
    }

    pub fn from_config(config: &AnimConfig) -> Self {
        Self::new(config.window_size, config.decay)
    }

    pub fn state(&self) -> AffectState {
        self.state
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Timestamp of the most recent non-empty feed
    pub fn last_feed(&self) -> Option<f64> {
        self.last_feed
    }

    /// Add a chunk of streamed text and re-score the window.
    ///
    /// Blank chunks are ignored entirely, including for talking detection.
    pub fn feed(&mut self, text: &str, timestamp: f64) {
        if text.trim().is_empty() {
            return;
        }

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(text.to_lowercase());
        self.last_feed = Some(timestamp);
        self.analyze();
    }

    /// Advance time: update talking and decay toward neutral
    pub fn step(&mut self, dt: f64, now: f64) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let silence = match self.last_feed {
            Some(last) => now - last,
            None => f64::INFINITY,
        };
        self.state.talking = silence < TALKING_WINDOW;

        let exponent = if silence > SILENCE_THRESHOLD { dt * 3.0 } else { dt };
        let factor = self.decay.powf(exponent);
        self.state.valence *= factor;
        self.state.arousal *= factor;
        self.state.clamp();
    }

    /// Drop all text and return to neutral affect
    pub fn reset(&mut self) {
        self.window.clear();
        self.state = AffectState::default();
        self.last_feed = None;
    }

    fn analyze(&mut self) {
        let text = self.window.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
        let tokens: Vec<&str> = tokenize(&text).collect();
        let n = tokens.len();

        let mut v_sum = 0.0;
        let mut a_sum = 0.0;
        let mut hits = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let recency = (-RECENCY_FALLOFF * (n - i) as f64).exp();
            for (v, a) in lookup(token) {
                v_sum += v * recency;
                a_sum += a * recency;
                hits += recency;
            }
        }

        if hits > 0.0 {
            let target_v = v_sum / f64::max(hits, 1.0);
            let target_a = a_sum / f64::max(hits, 1.0);
            let blend = f64::min(MAX_BLEND, hits * BLEND_PER_HIT);
            self.state.valence += (target_v - self.state.valence) * blend;
            self.state.arousal += (target_a - self.state.arousal) * blend;
            trace!(hits, target_v, target_a, blend, "Sentiment window scored");
        }

        self.state.clamp();
    }
}

impl Default for SentimentEstimator {
    fn default() -> Self {
        Self::from_config(&AnimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        let mut est = SentimentEstimator::default();
        est.feed("great, that works perfectly", 0.0);
        est.step(0.0, 0.0);
        let state = est.state();
        assert!(state.valence > 0.0);
        assert!(state.arousal > 0.0);
        assert!(state.talking);
    }

    #[test]
    fn test_negative_text() {
        let mut est = SentimentEstimator::default();
        est.feed("Unfortunately the build failed with an error", 0.0);
        assert!(est.state().valence < 0.0);
        assert!(est.state().arousal > 0.0);
    }

    #[test]
    fn test_blank_text_is_noop() {
        let mut est = SentimentEstimator::default();
        est.feed("   \n\t", 5.0);
        assert_eq!(est.window_len(), 0);
        assert_eq!(est.last_feed(), None);
        est.step(0.016, 5.0);
        assert!(!est.state().talking);
    }

    #[test]
    fn test_never_fed_is_not_talking() {
        let mut est = SentimentEstimator::default();
        est.step(0.016, 0.1);
        assert!(!est.state().talking);
        assert_eq!(est.state(), AffectState::default());
    }

    #[test]
    fn test_talking_window() {
        let mut est = SentimentEstimator::default();
        est.feed("hello", 10.0);
        est.step(0.016, 10.4);
        assert!(est.state().talking);
        est.step(0.016, 10.6);
        assert!(!est.state().talking);
    }

    #[test]
    fn test_window_capacity() {
        let mut est = SentimentEstimator::new(3, 0.92);
        for i in 0..10 {
            est.feed(&format!("chunk {}", i), i as f64);
        }
        assert_eq!(est.window_len(), 3);
    }

    #[test]
    fn test_silence_decays_faster() {
        let mut talking = SentimentEstimator::default();
        talking.feed("wonderful", 0.0);
        let mut silent = talking.clone();

        talking.step(0.1, 0.2);
        silent.step(0.1, 2.0);

        assert!(talking.state().valence > 0.0);
        assert!(silent.state().valence < talking.state().valence);

        let expected = talking.state().valence * 0.92f64.powf(0.2);
        assert!((silent.state().valence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_silence_monotonic_decay() {
        let mut est = SentimentEstimator::default();
        est.feed("wow this is awesome but there is a bug", 0.0);
        let mut prev = est.state();
        let mut now = 1.5;
        for _ in 0..2000 {
            est.step(0.05, now);
            now += 0.05;
            let s = est.state();
            assert!(s.valence.abs() <= prev.valence.abs());
            assert!(s.arousal <= prev.arousal);
            prev = s;
        }
        assert!(prev.valence.abs() < 1e-3);
        assert!(prev.arousal < 1e-3);
    }

    #[test]
    fn test_invalid_dt_is_zero() {
        let mut est = SentimentEstimator::default();
        est.feed("great", 0.0);
        let before = est.state();
        est.step(f64::NAN, 0.1);
        est.step(-1.0, 0.1);
        assert_eq!(est.state().valence, before.valence);
        assert_eq!(est.state().arousal, before.arousal);
    }

    #[test]
    fn test_deterministic() {
        let mut a = SentimentEstimator::default();
        let mut b = SentimentEstimator::default();
        for (i, text) in ["hmm let me check", "oh interesting!", "that is wrong"].iter().enumerate() {
            a.feed(text, i as f64);
            b.feed(text, i as f64);
            a.step(0.016, i as f64 + 0.5);
            b.step(0.016, i as f64 + 0.5);
        }
        assert_eq!(a.state(), b.state());
    }
}
