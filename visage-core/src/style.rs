//! Face style - palette and proportions handed to the geometry mapper and
//! renderers. Read-only to the core.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// RGB color, serialized as a `[r, g, b]` triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Colors plus normalized proportions (fractions of the viewport)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceStyle {
    pub bg: Rgb,
    pub skin_lit: Rgb,
    pub skin_shadow: Rgb,
    pub eye_white: Rgb,
    pub iris: Rgb,
    pub pupil: Rgb,
    pub mouth: Rgb,
    pub mouth_interior: Rgb,
    pub brow: Rgb,
    pub highlight: Rgb,

    pub face_width: f64,
    pub face_height: f64,
    pub eye_spacing: f64,
    /// Vertical eye position, fraction of face height from the top
    pub eye_y: f64,
    /// Eye horizontal radius
    pub eye_rx: f64,
    /// Eye vertical radius at full openness
    pub eye_ry: f64,
    pub pupil_radius: f64,
    /// Mouth vertical position, fraction of face height from the top
    pub mouth_y: f64,
    pub mouth_width: f64,
    pub brow_width: f64,
    pub brow_y_offset: f64,
}

impl FaceStyle {
    /// Flat-shaded cinematic palette; the default look
    pub fn another_world() -> Self {
        Self {
            bg: Rgb(8, 10, 22),
            skin_lit: Rgb(198, 156, 109),
            skin_shadow: Rgb(132, 92, 64),
            eye_white: Rgb(180, 185, 190),
            iris: Rgb(52, 100, 140),
            pupil: Rgb(12, 14, 20),
            mouth: Rgb(145, 82, 72),
            mouth_interior: Rgb(42, 18, 22),
            brow: Rgb(92, 64, 48),
            highlight: Rgb(220, 200, 170),

            face_width: 0.40,
            face_height: 0.55,
            eye_spacing: 0.12,
            eye_y: 0.40,
            eye_rx: 0.045,
            eye_ry: 0.028,
            pupil_radius: 0.016,
            mouth_y: 0.68,
            mouth_width: 0.08,
            brow_width: 0.055,
            brow_y_offset: -0.05,
        }
    }

    /// Parse a JSON style; keys not present keep their default values
    pub fn from_json(content: &str) -> Result<Self> {
        let style: FaceStyle = serde_json::from_str(content)
            .map_err(|e| Error::Style(format!("Invalid style JSON: {}", e)))?;
        style.validate()?;
        Ok(style)
    }

    /// Load a style file, merged over the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| Error::Style(format!("{}: {}", path.display(), e)))
    }

    /// Proportions must be finite and the sizing ones strictly positive
    pub fn validate(&self) -> Result<()> {
        let sized = [
            ("face_width", self.face_width),
            ("face_height", self.face_height),
            ("eye_rx", self.eye_rx),
            ("eye_ry", self.eye_ry),
            ("pupil_radius", self.pupil_radius),
            ("brow_width", self.brow_width),
        ];
        for (name, value) in sized {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Style(format!("{} must be a positive number, got {}", name, value)));
            }
        }

        let placed = [
            ("eye_spacing", self.eye_spacing),
            ("eye_y", self.eye_y),
            ("mouth_y", self.mouth_y),
            ("mouth_width", self.mouth_width),
            ("brow_y_offset", self.brow_y_offset),
        ];
        for (name, value) in placed {
            if !value.is_finite() {
                return Err(Error::Style(format!("{} must be finite", name)));
            }
        }

        Ok(())
    }
}

impl Default for FaceStyle {
    fn default() -> Self {
        Self::another_world()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FaceStyle::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let style = FaceStyle::from_json(r#"{"bg": [1, 2, 3], "face_width": 0.5}"#).unwrap();
        assert_eq!(style.bg, Rgb(1, 2, 3));
        assert_eq!(style.face_width, 0.5);
        assert_eq!(style.eye_rx, FaceStyle::default().eye_rx);
        assert_eq!(style.iris, FaceStyle::default().iris);
    }

    #[test]
    fn test_invalid_style_rejected() {
        assert!(FaceStyle::from_json(r#"{"eye_ry": 0.0}"#).is_err());
        assert!(FaceStyle::from_json(r#"{"pupil_radius": -1.0}"#).is_err());
        assert!(FaceStyle::from_json(r#"{"bg": [300, 0, 0]}"#).is_err());
        assert!(FaceStyle::from_json("[]").is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let err = FaceStyle::from_file("/nonexistent/visage-style.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
