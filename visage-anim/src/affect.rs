//! Emote vector -> pose mapping
//!
//! A small, explicit, linear mapping from high-level affect (valence, arousal
//! and named emotions) to the 18 face parameters. Total and deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use visage_core::{PoseParam, PoseVector, Side};

/// High-level affect.
///
/// Expected ranges: valence [-1, 1], everything else [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmoteVector {
    pub valence: f64,
    pub arousal: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fear: f64,
    pub surprise: f64,
    pub thinking: f64,
}

impl Default for EmoteVector {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.2,
            happy: 0.0,
            sad: 0.0,
            angry: 0.0,
            fear: 0.0,
            surprise: 0.0,
            thinking: 0.0,
        }
    }
}

impl EmoteVector {
    /// Read an emote wire message.
    ///
    /// Missing fields take their defaults, fields that are present but not
    /// numeric read as 0. `anger` is accepted as an alias of `angry` and wins
    /// when both are present.
    pub fn from_json(msg: &Value) -> Self {
        let defaults = Self::default();
        let field = |key: &str, default: f64| msg.get(key).map_or(default, to_f64);

        Self {
            valence: field("valence", defaults.valence),
            arousal: field("arousal", defaults.arousal),
            happy: field("happy", defaults.happy),
            sad: field("sad", defaults.sad),
            angry: msg
                .get("anger")
                .or_else(|| msg.get("angry"))
                .map_or(defaults.angry, to_f64),
            fear: field("fear", defaults.fear),
            surprise: field("surprise", defaults.surprise),
            thinking: field("thinking", defaults.thinking),
        }
    }

    pub fn to_pose(&self) -> PoseVector {
        emote_to_pose(self)
    }
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_finite() {
        x.clamp(lo, hi)
    } else {
        0.0_f64.clamp(lo, hi)
    }
}

fn unit(x: f64) -> f64 {
    clamp(x, 0.0, 1.0)
}

/// Map an emote vector to a pose
pub fn emote_to_pose(ev: &EmoteVector) -> PoseVector {
    let v = clamp(ev.valence, -1.0, 1.0);
    let a = unit(ev.arousal);
    let happy = unit(ev.happy);
    let sad = unit(ev.sad);
    let angry = unit(ev.angry);
    let fear = unit(ev.fear);
    let surprise = unit(ev.surprise);
    let thinking = unit(ev.thinking);

    // Arousal and surprise open the eyes; sadness and anger narrow them.
    let eye_open = clamp(
        0.65 + 0.25 * a + 0.15 * surprise - 0.20 * sad - 0.25 * angry,
        0.15,
        1.0,
    );

    let brow_height = -0.03 * angry + 0.05 * sad + 0.03 * surprise;
    let brow_angle = 0.06 * angry - 0.02 * sad + 0.03 * thinking;

    let mouth_smile = unit(0.45 * v.max(0.0) + 0.35 * happy - 0.55 * sad - 0.25 * angry);
    let mouth_open = unit(0.10 + 0.35 * surprise + 0.20 * a + 0.10 * fear);
    let jaw_open = unit(0.85 * mouth_open);
    let mouth_wide = unit(0.10 + 0.25 * happy + 0.10 * v.max(0.0) - 0.20 * angry);

    let mut pose = PoseVector::neutral();
    for side in Side::BOTH {
        pose[PoseParam::eye_open(side)] = eye_open;
        pose[PoseParam::brow_height(side)] = brow_height;
        pose[PoseParam::brow_angle(side)] = brow_angle;
    }
    pose[PoseParam::MouthSmile] = mouth_smile;
    pose[PoseParam::MouthOpen] = mouth_open;
    pose[PoseParam::JawOpen] = jaw_open;
    pose[PoseParam::MouthWide] = mouth_wide;
    pose[PoseParam::HeadYaw] = 0.04 * (happy - angry);
    pose[PoseParam::HeadPitch] = 0.03 * (sad - surprise);
    pose[PoseParam::HeadRoll] = 0.03 * (thinking - fear);
    pose
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_emote() {
        let pose = emote_to_pose(&EmoteVector::default());
        assert!(approx(pose[PoseParam::LeftEyeOpen], 0.70));
        assert!(approx(pose[PoseParam::RightEyeOpen], 0.70));
        assert!(approx(pose[PoseParam::MouthOpen], 0.14));
        assert!(approx(pose[PoseParam::JawOpen], 0.119));
        assert!(approx(pose[PoseParam::MouthWide], 0.10));
        assert_eq!(pose[PoseParam::MouthSmile], 0.0);
        assert_eq!(pose[PoseParam::FaceScale], 1.0);
        assert_eq!(pose[PoseParam::LeftPupilX], 0.0);
    }

    #[test]
    fn test_happy_emote() {
        let ev = EmoteVector {
            valence: 1.0,
            happy: 1.0,
            ..Default::default()
        };
        let pose = emote_to_pose(&ev);
        assert!(approx(pose[PoseParam::MouthSmile], 0.80));
        assert!(approx(pose[PoseParam::MouthWide], 0.45));
        assert!(approx(pose[PoseParam::HeadYaw], 0.04));
    }

    #[test]
    fn test_extremes_stay_in_range() {
        let ev = EmoteVector {
            valence: -50.0,
            arousal: 9.0,
            happy: -3.0,
            sad: 4.0,
            angry: 7.0,
            fear: f64::NAN,
            surprise: f64::INFINITY,
            thinking: 2.0,
        };
        let pose = emote_to_pose(&ev);
        for side in Side::BOTH {
            let eye = pose[PoseParam::eye_open(side)];
            assert!((0.15..=1.0).contains(&eye));
        }
        for param in [PoseParam::MouthSmile, PoseParam::MouthOpen, PoseParam::JawOpen, PoseParam::MouthWide] {
            assert!((0.0..=1.0).contains(&pose[param]), "{} out of range", param);
        }
        assert!(pose.iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_from_json_defaults_and_alias() {
        let ev = EmoteVector::from_json(&json!({"valence": 0.5, "anger": 0.4, "angry": 0.9}));
        assert_eq!(ev.valence, 0.5);
        assert_eq!(ev.arousal, 0.2);
        assert_eq!(ev.angry, 0.4);

        let ev = EmoteVector::from_json(&json!({"angry": 0.9}));
        assert_eq!(ev.angry, 0.9);
    }

    #[test]
    fn test_from_json_non_numeric() {
        let ev = EmoteVector::from_json(&json!({"arousal": "loud", "happy": "0.5", "sad": null}));
        assert_eq!(ev.arousal, 0.0);
        assert_eq!(ev.happy, 0.5);
        assert_eq!(ev.sad, 0.0);
    }
}
