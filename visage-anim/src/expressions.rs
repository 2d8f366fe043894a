//! Named expressions as sparse overrides of the neutral pose

use std::fmt;
use visage_core::{PoseParam, PoseVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expression {
    Idle,
    Thinking,
    Talking,
    Happy,
    Sad,
    Surprised,
    Confused,
}

use PoseParam::*;

const THINKING: &[(PoseParam, f64)] = &[
    (LeftEyeOpen, 0.7),
    (RightEyeOpen, 0.7),
    (LeftPupilX, 0.02),
    (LeftPupilY, -0.01),
    (RightPupilX, 0.02),
    (RightPupilY, -0.01),
    (MouthSmile, -0.08),
    (LeftBrowAngle, 0.12),
    (LeftBrowHeight, 0.03),
    (RightBrowAngle, -0.04),
    (RightBrowHeight, 0.01),
];

const TALKING: &[(PoseParam, f64)] = &[(MouthOpen, 0.35), (MouthSmile, 0.03)];

const HAPPY: &[(PoseParam, f64)] = &[
    (LeftEyeOpen, 0.85),
    (RightEyeOpen, 0.85),
    (MouthWide, 0.04),
    (MouthSmile, 0.25),
    (MouthOpen, 0.08),
];

const SAD: &[(PoseParam, f64)] = &[
    (LeftEyeOpen, 0.6),
    (RightEyeOpen, 0.6),
    (MouthSmile, -0.25),
    (LeftBrowAngle, -0.12),
    (LeftBrowHeight, -0.02),
    (RightBrowAngle, 0.12),
    (RightBrowHeight, -0.02),
];

const SURPRISED: &[(PoseParam, f64)] = &[
    (LeftEyeOpen, 1.3),
    (RightEyeOpen, 1.3),
    (MouthOpen, 0.45),
    (MouthWide, -0.03),
    (LeftBrowHeight, 0.06),
    (RightBrowHeight, 0.06),
];

const CONFUSED: &[(PoseParam, f64)] = &[
    (LeftEyeOpen, 0.8),
    (RightEyeOpen, 0.6),
    (LeftPupilX, -0.01),
    (RightPupilX, 0.01),
    (MouthSmile, -0.12),
    (MouthOpen, 0.04),
    (LeftBrowAngle, 0.18),
    (LeftBrowHeight, 0.04),
    (RightBrowAngle, -0.12),
    (RightBrowHeight, -0.01),
];

impl Expression {
    pub const ALL: [Expression; 7] = [
        Expression::Idle,
        Expression::Thinking,
        Expression::Talking,
        Expression::Happy,
        Expression::Sad,
        Expression::Surprised,
        Expression::Confused,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Expression::Idle => "idle",
            Expression::Thinking => "thinking",
            Expression::Talking => "talking",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Surprised => "surprised",
            Expression::Confused => "confused",
        }
    }

    pub fn from_name(name: &str) -> Option<Expression> {
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Parameters this expression moves away from neutral
    pub fn overrides(self) -> &'static [(PoseParam, f64)] {
        match self {
            Expression::Idle => &[],
            Expression::Thinking => THINKING,
            Expression::Talking => TALKING,
            Expression::Happy => HAPPY,
            Expression::Sad => SAD,
            Expression::Surprised => SURPRISED,
            Expression::Confused => CONFUSED,
        }
    }

    /// Pose at `intensity`: each override interpolated from its neutral value
    pub fn pose(self, intensity: f64) -> PoseVector {
        let mut pose = PoseVector::neutral();
        for &(param, value) in self.overrides() {
            let base = param.neutral();
            pose[param] = base + (value - base) * intensity;
        }
        pose
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
