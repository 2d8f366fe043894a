//! Face pose - the fixed, closed set of 18 named face parameters
//!
//! Every producer (blender, affect mapper, relay frames) emits a `PoseVector`
//! and every consumer (geometry mapper, relay publisher) reads one. The
//! parameter set never grows at runtime; the wire names below are also the
//! `pts` keys of the pose-frame JSON message.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Face side, used to address the mirrored eye/pupil/brow parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Horizontal direction from the face center (-1 left, +1 right)
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// One named pose parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoseParam {
    LeftEyeOpen,
    RightEyeOpen,
    LeftPupilX,
    LeftPupilY,
    RightPupilX,
    RightPupilY,
    LeftBrowHeight,
    LeftBrowAngle,
    RightBrowHeight,
    RightBrowAngle,
    MouthOpen,
    MouthWide,
    MouthSmile,
    JawOpen,
    FaceScale,
    HeadPitch,
    HeadYaw,
    HeadRoll,
}

impl PoseParam {
    pub const COUNT: usize = 18;

    /// Canonical parameter order
    pub const ALL: [PoseParam; PoseParam::COUNT] = [
        PoseParam::LeftEyeOpen,
        PoseParam::RightEyeOpen,
        PoseParam::LeftPupilX,
        PoseParam::LeftPupilY,
        PoseParam::RightPupilX,
        PoseParam::RightPupilY,
        PoseParam::LeftBrowHeight,
        PoseParam::LeftBrowAngle,
        PoseParam::RightBrowHeight,
        PoseParam::RightBrowAngle,
        PoseParam::MouthOpen,
        PoseParam::MouthWide,
        PoseParam::MouthSmile,
        PoseParam::JawOpen,
        PoseParam::FaceScale,
        PoseParam::HeadPitch,
        PoseParam::HeadYaw,
        PoseParam::HeadRoll,
    ];

    /// Wire name (`pts` key)
    pub fn name(self) -> &'static str {
        match self {
            PoseParam::LeftEyeOpen => "left_eye_open",
            PoseParam::RightEyeOpen => "right_eye_open",
            PoseParam::LeftPupilX => "left_pupil_x",
            PoseParam::LeftPupilY => "left_pupil_y",
            PoseParam::RightPupilX => "right_pupil_x",
            PoseParam::RightPupilY => "right_pupil_y",
            PoseParam::LeftBrowHeight => "left_brow_height",
            PoseParam::LeftBrowAngle => "left_brow_angle",
            PoseParam::RightBrowHeight => "right_brow_height",
            PoseParam::RightBrowAngle => "right_brow_angle",
            PoseParam::MouthOpen => "mouth_open",
            PoseParam::MouthWide => "mouth_wide",
            PoseParam::MouthSmile => "mouth_smile",
            PoseParam::JawOpen => "jaw_open",
            PoseParam::FaceScale => "face_scale",
            PoseParam::HeadPitch => "head_pitch",
            PoseParam::HeadYaw => "head_yaw",
            PoseParam::HeadRoll => "head_roll",
        }
    }

    /// Look up a parameter by wire name
    pub fn from_name(name: &str) -> Option<PoseParam> {
        PoseParam::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Resting value of this parameter
    pub fn neutral(self) -> f64 {
        NEUTRAL_POSE.values[self as usize]
    }

    pub fn eye_open(side: Side) -> PoseParam {
        match side {
            Side::Left => PoseParam::LeftEyeOpen,
            Side::Right => PoseParam::RightEyeOpen,
        }
    }

    pub fn pupil_x(side: Side) -> PoseParam {
        match side {
            Side::Left => PoseParam::LeftPupilX,
            Side::Right => PoseParam::RightPupilX,
        }
    }

    pub fn pupil_y(side: Side) -> PoseParam {
        match side {
            Side::Left => PoseParam::LeftPupilY,
            Side::Right => PoseParam::RightPupilY,
        }
    }

    pub fn brow_height(side: Side) -> PoseParam {
        match side {
            Side::Left => PoseParam::LeftBrowHeight,
            Side::Right => PoseParam::RightBrowHeight,
        }
    }

    pub fn brow_angle(side: Side) -> PoseParam {
        match side {
            Side::Left => PoseParam::LeftBrowAngle,
            Side::Right => PoseParam::RightBrowAngle,
        }
    }
}

impl fmt::Display for PoseParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The 18-parameter face pose
///
/// Values are deliberately unclamped here; each producer clamps its own
/// output range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseVector {
    values: [f64; PoseParam::COUNT],
}

/// Resting pose: eyes fully open, unit face scale, everything else zero.
pub const NEUTRAL_POSE: PoseVector = PoseVector {
    values: [
        1.0, 1.0, // eyes open
        0.0, 0.0, 0.0, 0.0, // pupils
        0.0, 0.0, 0.0, 0.0, // brows
        0.0, 0.0, 0.0, 0.0, // mouth + jaw
        1.0, // face scale
        0.0, 0.0, 0.0, // head
    ],
};

impl PoseVector {
    pub fn neutral() -> Self {
        NEUTRAL_POSE
    }

    pub fn get(&self, param: PoseParam) -> f64 {
        self.values[param as usize]
    }

    pub fn set(&mut self, param: PoseParam, value: f64) {
        self.values[param as usize] = value;
    }

    /// Builder-style setter
    pub fn with(mut self, param: PoseParam, value: f64) -> Self {
        self.set(param, value);
        self
    }

    /// Parameters with their values in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (PoseParam, f64)> + '_ {
        PoseParam::ALL.iter().map(move |&p| (p, self.get(p)))
    }

    pub fn as_array(&self) -> &[f64; PoseParam::COUNT] {
        &self.values
    }

    /// Neutral pose with the named values laid over it.
    ///
    /// Unknown names are ignored, so a producer speaking a newer parameter
    /// set never breaks a consumer.
    pub fn from_named<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut pose = PoseVector::neutral();
        for (name, value) in pairs {
            if let Some(param) = PoseParam::from_name(name) {
                pose.set(param, value);
            }
        }
        pose
    }

    /// `self += other * weight`, used to accumulate weighted blends
    pub fn add_scaled(&mut self, other: &PoseVector, weight: f64) {
        for (dst, src) in self.values.iter_mut().zip(other.values.iter()) {
            *dst += src * weight;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for v in self.values.iter_mut() {
            *v *= factor;
        }
    }

    /// Move every parameter `alpha` of the way toward `target`
    pub fn approach(&mut self, target: &PoseVector, alpha: f64) {
        for (cur, tgt) in self.values.iter_mut().zip(target.values.iter()) {
            *cur += (tgt - *cur) * alpha;
        }
    }

    /// Largest per-parameter absolute difference
    pub fn max_abs_diff(&self, other: &PoseVector) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for PoseVector {
    fn default() -> Self {
        NEUTRAL_POSE
    }
}

impl Index<PoseParam> for PoseVector {
    type Output = f64;

    fn index(&self, param: PoseParam) -> &f64 {
        &self.values[param as usize]
    }
}

impl IndexMut<PoseParam> for PoseVector {
    fn index_mut(&mut self, param: PoseParam) -> &mut f64 {
        &mut self.values[param as usize]
    }
}

impl Serialize for PoseVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PoseParam::COUNT))?;
        for (param, value) in self.iter() {
            map.serialize_entry(param.name(), &value)?;
        }
        map.end()
    }
}

/// Deserializes a `pts` object: missing keys stay neutral, unknown keys and
/// non-numeric values are skipped.
impl<'de> Deserialize<'de> for PoseVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PtsVisitor;

        impl<'de> Visitor<'de> for PtsVisitor {
            type Value = PoseVector;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of pose parameter names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<PoseVector, A::Error> {
                let mut pose = PoseVector::neutral();
                while let Some(key) = access.next_key::<String>()? {
                    let value: serde_json::Value = access.next_value()?;
                    if let (Some(param), Some(v)) = (PoseParam::from_name(&key), value.as_f64()) {
                        pose.set(param, v);
                    }
                }
                Ok(pose)
            }
        }

        deserializer.deserialize_map(PtsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names_round_trip() {
        for param in PoseParam::ALL {
            assert_eq!(PoseParam::from_name(param.name()), Some(param));
        }
        assert_eq!(PoseParam::from_name("left_eye_rx"), None);
    }

    #[test]
    fn test_canonical_order_matches_discriminants() {
        for (i, param) in PoseParam::ALL.iter().enumerate() {
            assert_eq!(*param as usize, i);
        }
    }

    #[test]
    fn test_neutral_defaults() {
        let pose = PoseVector::neutral();
        assert_eq!(pose[PoseParam::LeftEyeOpen], 1.0);
        assert_eq!(pose[PoseParam::RightEyeOpen], 1.0);
        assert_eq!(pose[PoseParam::FaceScale], 1.0);
        assert_eq!(pose[PoseParam::MouthSmile], 0.0);
        assert_eq!(pose[PoseParam::HeadRoll], 0.0);
    }

    #[test]
    fn test_deserialize_merges_over_neutral() {
        let pose: PoseVector = serde_json::from_str(
            r#"{"mouth_smile": 0.4, "bogus": 3.0, "head_yaw": "left", "left_eye_open": 0.2}"#,
        )
        .unwrap();
        assert_eq!(pose[PoseParam::MouthSmile], 0.4);
        assert_eq!(pose[PoseParam::LeftEyeOpen], 0.2);
        assert_eq!(pose[PoseParam::HeadYaw], 0.0);
        assert_eq!(pose[PoseParam::RightEyeOpen], 1.0);
    }

    #[test]
    fn test_deserialize_rejects_non_map() {
        assert!(serde_json::from_str::<PoseVector>("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let json = serde_json::to_value(PoseVector::neutral()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), PoseParam::COUNT);
        assert_eq!(obj["face_scale"], 1.0);
        assert_eq!(obj["jaw_open"], 0.0);
    }

    #[test]
    fn test_approach_and_weighted_sum() {
        let mut pose = PoseVector::neutral();
        let target = PoseVector::neutral().with(PoseParam::MouthOpen, 1.0);
        pose.approach(&target, 0.25);
        assert!((pose[PoseParam::MouthOpen] - 0.25).abs() < 1e-12);

        let mut acc = PoseVector::neutral();
        acc.scale(0.5);
        acc.add_scaled(&target, 0.5);
        assert!((acc[PoseParam::MouthOpen] - 0.5).abs() < 1e-12);
        assert!((acc[PoseParam::FaceScale] - 1.0).abs() < 1e-12);
        assert!((acc.max_abs_diff(&PoseVector::neutral()) - 0.5).abs() < 1e-12);
    }
}
