//! Multi-layer animation blending
//!
//! Each named layer contributes a full pose at a weight that decays linearly
//! over time. The blend target is the weighted average of all live layers plus
//! an implicit resting (neutral) layer of fixed weight, and the output follows
//! the target through exponential smoothing.

use crate::expressions::Expression;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use visage_core::{AnimConfig, PoseParam, PoseVector, Side};

/// Weight of the implicit neutral layer in every blend
pub const RESTING_WEIGHT: f64 = 0.3;

/// Layers at or below this weight are removed
pub const MIN_LAYER_WEIGHT: f64 = 0.001;

/// Sentiment layers lighter than this are not created
pub const MIN_SENTIMENT_WEIGHT: f64 = 0.05;

pub const DEFAULT_EXPRESSION_DECAY: f64 = 0.15;
pub const DEFAULT_SENTIMENT_DECAY: f64 = 0.08;
pub const DEFAULT_SMOOTHING: f64 = 8.0;

/// Name of the layer driven by the sentiment estimator
pub const SENTIMENT_LAYER: &str = "sentiment";

/// One weighted pose contribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationLayer {
    pub name: String,
    pub pose: PoseVector,
    pub weight: f64,
    /// Weight lost per second; 0 keeps the layer until replaced
    pub decay_rate: f64,
    /// Seconds since the layer was pushed
    pub age: f64,
}

impl AnimationLayer {
    pub fn new(name: impl Into<String>, pose: PoseVector, weight: f64, decay_rate: f64) -> Self {
        Self {
            name: name.into(),
            pose,
            weight,
            decay_rate,
            age: 0.0,
        }
    }

    fn step(&mut self, dt: f64) {
        self.age += dt;
        if self.decay_rate > 0.0 {
            self.weight = (self.weight - self.decay_rate * dt).max(0.0);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.weight > MIN_LAYER_WEIGHT
    }
}

#[derive(Debug, Clone)]
pub struct AnimationBlender {
    layers: BTreeMap<String, AnimationLayer>,
    current: PoseVector,
    smoothing: f64,
}

impl AnimationBlender {
    pub fn new(smoothing: f64) -> Self {
        Self {
            layers: BTreeMap::new(),
            current: PoseVector::neutral(),
            smoothing,
        }
    }

    pub fn from_config(config: &AnimConfig) -> Self {
        Self::new(config.smoothing)
    }

    /// Push a named expression, replacing any layer of the same name.
    ///
    /// Returns `false` (and changes nothing) for unknown names or a
    /// non-finite intensity.
    pub fn push_expression(&mut self, name: &str, intensity: f64, decay_rate: f64) -> bool {
        let Some(expression) = Expression::from_name(name) else {
            debug!("Ignoring unknown expression '{}'", name);
            return false;
        };
        if !intensity.is_finite() {
            debug!("Ignoring expression '{}' with non-finite intensity", name);
            return false;
        }

        let intensity = intensity.clamp(0.0, 1.0);
        let decay_rate = sanitize_decay(decay_rate);
        let layer = AnimationLayer::new(name, expression.pose(intensity), intensity, decay_rate);
        self.layers.insert(layer.name.clone(), layer);
        true
    }

    /// Replace the sentiment layer with one derived from (valence, arousal).
    ///
    /// The previous sentiment layer is always removed; a new one is only
    /// created when its weight would exceed `MIN_SENTIMENT_WEIGHT`.
    pub fn push_sentiment(&mut self, valence: f64, arousal: f64, decay_rate: f64) {
        self.layers.remove(SENTIMENT_LAYER);

        let v = if valence.is_finite() { valence.clamp(-1.0, 1.0) } else { 0.0 };
        let a = if arousal.is_finite() { arousal.clamp(0.0, 1.0) } else { 0.0 };

        let weight = v.abs().max(a) * 0.8;
        if weight <= MIN_SENTIMENT_WEIGHT {
            return;
        }

        let mut pose = PoseVector::neutral();
        pose[PoseParam::MouthSmile] = v * 0.25;
        pose[PoseParam::MouthOpen] = (a * 0.15).max(0.0);

        let eye_open = 1.0 + a * 0.2 * if v > 0.0 { 1.0 } else { -0.5 };
        let brow_height = a * 0.03 + v * 0.02;
        for side in Side::BOTH {
            pose[PoseParam::eye_open(side)] = eye_open;
            pose[PoseParam::brow_height(side)] = brow_height;
        }

        // Negative valence tilts the brows inward
        if v < 0.0 {
            pose[PoseParam::LeftBrowAngle] = -0.1 * v;
            pose[PoseParam::RightBrowAngle] = 0.1 * v;
        }

        let layer = AnimationLayer::new(SENTIMENT_LAYER, pose, weight, sanitize_decay(decay_rate));
        self.layers.insert(SENTIMENT_LAYER.to_string(), layer);
    }

    /// Advance layers by `dt` seconds and return the smoothed blend
    pub fn step(&mut self, dt: f64) -> PoseVector {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        for layer in self.layers.values_mut() {
            layer.step(dt);
        }
        self.layers.retain(|name, layer| {
            let alive = layer.is_alive();
            if !alive {
                debug!("Layer '{}' decayed after {:.2}s", name, layer.age);
            }
            alive
        });

        let target = self.target();
        let alpha = 1.0 - (-self.smoothing * dt).exp();
        self.current.approach(&target, alpha);
        self.current
    }

    /// Weighted average of the resting pose and every live layer
    pub fn target(&self) -> PoseVector {
        let mut blended = PoseVector::neutral();
        blended.scale(RESTING_WEIGHT);
        let mut total = RESTING_WEIGHT;

        for layer in self.layers.values() {
            blended.add_scaled(&layer.pose, layer.weight);
            total += layer.weight;
        }

        blended.scale(1.0 / total);
        blended
    }

    pub fn current(&self) -> PoseVector {
        self.current
    }

    /// Layers in name order
    pub fn layers(&self) -> impl Iterator<Item = &AnimationLayer> {
        self.layers.values()
    }

    pub fn layer(&self, name: &str) -> Option<&AnimationLayer> {
        self.layers.get(name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Drop every layer; the output then eases back to neutral
    pub fn clear(&mut self) {
        self.layers.clear();
    }
}

impl Default for AnimationBlender {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

fn sanitize_decay(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_expression_is_noop() {
        let mut blender = AnimationBlender::default();
        assert!(!blender.push_expression("ecstatic", 1.0, 0.15));
        assert!(blender.is_empty());
    }

    #[test]
    fn test_push_replaces_same_name() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("happy", 1.0, 0.15);
        blender.step(0.5);
        blender.push_expression("happy", 0.4, 0.0);
        assert_eq!(blender.len(), 1);
        let layer = blender.layer("happy").unwrap();
        assert_eq!(layer.weight, 0.4);
        assert_eq!(layer.decay_rate, 0.0);
        assert_eq!(layer.age, 0.0);
    }

    #[test]
    fn test_intensity_and_decay_clamped() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("sad", 7.0, -2.0);
        let layer = blender.layer("sad").unwrap();
        assert_eq!(layer.weight, 1.0);
        assert_eq!(layer.decay_rate, 0.0);

        assert!(!blender.push_expression("happy", f64::NAN, 0.1));
        assert!(blender.layer("happy").is_none());
    }

    #[test]
    fn test_layer_decays_and_is_pruned() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("thinking", 0.5, 1.0);
        blender.step(0.25);
        let w = blender.layer("thinking").unwrap().weight;
        assert!((w - 0.25).abs() < 1e-12);
        blender.step(0.3);
        assert!(blender.layer("thinking").is_none());
    }

    #[test]
    fn test_persistent_layer_survives() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("talking", 1.0, 0.0);
        for _ in 0..600 {
            blender.step(1.0 / 60.0);
        }
        assert_eq!(blender.layer("talking").unwrap().weight, 1.0);
    }

    #[test]
    fn test_sentiment_layer() {
        let mut blender = AnimationBlender::default();
        blender.push_sentiment(0.0, 0.0, 0.08);
        assert!(blender.is_empty());

        blender.push_sentiment(-0.5, 0.5, 0.08);
        let layer = blender.layer(SENTIMENT_LAYER).unwrap();
        assert!((layer.weight - 0.4).abs() < 1e-12);
        assert!((layer.pose[PoseParam::MouthSmile] + 0.125).abs() < 1e-12);
        assert!((layer.pose[PoseParam::LeftEyeOpen] - 0.95).abs() < 1e-12);
        assert!((layer.pose[PoseParam::LeftBrowAngle] - 0.05).abs() < 1e-12);
        assert!((layer.pose[PoseParam::RightBrowAngle] + 0.05).abs() < 1e-12);

        // A weak update removes the previous sentiment layer without replacing it
        blender.push_sentiment(0.01, 0.02, 0.08);
        assert!(blender.layer(SENTIMENT_LAYER).is_none());
    }

    #[test]
    fn test_target_weighting() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("talking", 0.7, 0.0);
        let target = blender.target();
        // (0.3 * 0 + 0.7 * 0.35 * 0.7) / (0.3 + 0.7)
        assert!((target[PoseParam::MouthOpen] - 0.1715).abs() < 1e-12);
        assert!((target[PoseParam::FaceScale] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dt_keeps_current() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("surprised", 1.0, 0.15);
        let before = blender.current();
        assert_eq!(blender.step(0.0), before);
    }

    #[test]
    fn test_clear_returns_to_neutral() {
        let mut blender = AnimationBlender::default();
        blender.push_expression("confused", 1.0, 0.0);
        for _ in 0..60 {
            blender.step(1.0 / 60.0);
        }
        assert!(blender.current().max_abs_diff(&PoseVector::neutral()) > 0.05);

        blender.clear();
        for _ in 0..600 {
            blender.step(1.0 / 60.0);
        }
        assert!(blender.current().max_abs_diff(&PoseVector::neutral()) < 1e-6);
    }
}
