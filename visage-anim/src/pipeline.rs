//! Local-generation pipeline
//!
//! One tick runs, in order and without suspension: sentiment step, sentiment
//! layer refresh, blender step, idle overlay, geometry. Identical input and dt
//! sequences therefore produce identical output.

use crate::blender::AnimationBlender;
use crate::command::ExpressionCommand;
use crate::idle::IdleOverlay;
use crate::sentiment::{AffectState, SentimentEstimator};
use tracing::debug;
use visage_core::{geometry, AnimConfig, FaceStyle, Geometry, PoseVector};

/// Affect below this (|valence| and arousal) leaves the sentiment layer alone
const SENTIMENT_PUSH_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct LocalPipeline {
    estimator: SentimentEstimator,
    blender: AnimationBlender,
    idle: IdleOverlay,
    expression_decay: f64,
    sentiment_decay: f64,
    pose: PoseVector,
}

impl LocalPipeline {
    pub fn new(config: &AnimConfig) -> Self {
        Self {
            estimator: SentimentEstimator::from_config(config),
            blender: AnimationBlender::from_config(config),
            idle: IdleOverlay::new(config.idle_seed),
            expression_decay: config.expression_decay,
            sentiment_decay: config.sentiment_decay,
            pose: PoseVector::neutral(),
        }
    }

    /// Feed streamed text to the sentiment estimator
    pub fn feed_text(&mut self, text: &str, now: f64) {
        self.estimator.feed(text, now);
    }

    /// Apply an explicit expression command.
    ///
    /// Returns whether the expression was recognised; attached text is fed
    /// to the sentiment estimator either way.
    pub fn apply_command(&mut self, command: &ExpressionCommand, now: f64) -> bool {
        let pushed = self.blender.push_expression(
            &command.expression,
            command.intensity,
            self.expression_decay,
        );
        if pushed {
            debug!(
                "Expression '{}' at intensity {:.2}",
                command.expression, command.intensity
            );
        }
        if let Some(ref text) = command.text {
            self.estimator.feed(text, now);
        }
        pushed
    }

    /// Advance the pipeline by `dt` and return the final pose
    pub fn step(&mut self, dt: f64, now: f64) -> PoseVector {
        self.estimator.step(dt, now);
        let affect = self.estimator.state();
        self.idle.set_talking(affect.talking);

        if affect.valence.abs() > SENTIMENT_PUSH_THRESHOLD || affect.arousal > SENTIMENT_PUSH_THRESHOLD {
            self.blender
                .push_sentiment(affect.valence, affect.arousal, self.sentiment_decay);
        }

        let blended = self.blender.step(dt);
        self.pose = self.idle.step(blended, dt);
        self.pose
    }

    /// Advance the pipeline and lay the resulting pose out for a viewport
    pub fn tick(&mut self, dt: f64, now: f64, viewport: (u32, u32), style: &FaceStyle) -> Geometry {
        let pose = self.step(dt, now);
        geometry::compute(&pose, viewport, style)
    }

    /// Drop every expression layer
    pub fn clear(&mut self) {
        self.blender.clear();
    }

    /// Pose produced by the last step
    pub fn pose(&self) -> PoseVector {
        self.pose
    }

    pub fn affect(&self) -> AffectState {
        self.estimator.state()
    }

    pub fn blender(&self) -> &AnimationBlender {
        &self.blender
    }

    pub fn blender_mut(&mut self) -> &mut AnimationBlender {
        &mut self.blender
    }

    pub fn estimator(&self) -> &SentimentEstimator {
        &self.estimator
    }

    pub fn idle(&self) -> &IdleOverlay {
        &self.idle
    }
}

impl Default for LocalPipeline {
    fn default() -> Self {
        Self::new(&AnimConfig::default())
    }
}
