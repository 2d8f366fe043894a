//! visage-core: shared face-pose types and the pose -> geometry mapping
//!
//! Everything that crosses between the local-generation pipeline, the relay
//! ingestion side and a renderer lives here: the 18-parameter `PoseVector`,
//! `MocapFrame`, `FaceStyle`, `Geometry`, and the `Renderer` boundary.

pub mod pose;
pub mod frame;
pub mod style;
pub mod geometry;
pub mod render;
pub mod config;
pub mod error;

pub use error::{Error, Result};
pub use pose::{PoseParam, PoseVector, Side, NEUTRAL_POSE};
pub use frame::MocapFrame;
pub use style::{FaceStyle, Rgb};
pub use geometry::{Geometry, Part, Point, Shape};
pub use render::{BackendFactory, BackendRegistry, Renderer};
pub use config::{AnimConfig, ConfigError, RelayConfig, RenderConfig, VisageConfig};
