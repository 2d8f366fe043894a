//! Mocap frames - a timestamped pose as carried on the wire
//!
//! Wire form: `{"t": <seconds, optional>, "pts": {<name>: <float>, ...}}`.

use crate::error::{Error, Result};
use crate::pose::PoseVector;
use serde::{Deserialize, Serialize};

/// A single timestamped pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MocapFrame {
    /// Producer timestamp in seconds (0.0 when the producer omitted it)
    pub t: f64,
    /// Pose values
    #[serde(rename = "pts")]
    pub pose: PoseVector,
}

#[derive(Deserialize)]
struct FrameWire {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    pts: Option<PoseVector>,
}

impl MocapFrame {
    pub fn new(t: f64, pose: PoseVector) -> Self {
        Self { t, pose }
    }

    /// Neutral frame at t = 0, served before any producer has spoken
    pub fn neutral() -> Self {
        Self {
            t: 0.0,
            pose: PoseVector::neutral(),
        }
    }

    /// Parse one JSON frame message.
    ///
    /// Missing `pts` keys take neutral values; unknown keys are ignored.
    pub fn from_json(text: &str) -> Result<Self> {
        let wire: FrameWire = serde_json::from_str(text)
            .map_err(|e| Error::Deserialization(format!("Invalid pose frame: {}", e)))?;
        Ok(Self {
            t: wire.t.unwrap_or(0.0),
            pose: wire.pts.unwrap_or_default(),
        })
    }

    /// Parse a JSON value that has already been decoded
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let wire: FrameWire = serde_json::from_value(value)
            .map_err(|e| Error::Deserialization(format!("Invalid pose frame: {}", e)))?;
        Ok(Self {
            t: wire.t.unwrap_or(0.0),
            pose: wire.pts.unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Default for MocapFrame {
    fn default() -> Self {
        Self::neutral()
    }
}
