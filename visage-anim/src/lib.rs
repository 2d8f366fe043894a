//! visage-anim: local generation of face poses
//!
//! Text and explicit commands go in, one `PoseVector` per tick comes out:
//! - Lexicon-weighted sentiment estimation with time decay
//! - Affect (emote vector) to pose mapping
//! - Named, weighted, decaying expression layers with exponential smoothing
//! - Procedural idle motion (breathing, blinking, eye drift, talking)

pub mod error;
pub mod lexicon;
pub mod sentiment;
pub mod affect;
pub mod expressions;
pub mod blender;
pub mod idle;
pub mod command;
pub mod pipeline;

pub use error::AnimError;
pub use sentiment::{AffectState, SentimentEstimator};
pub use affect::{emote_to_pose, EmoteVector};
pub use expressions::Expression;
pub use blender::{AnimationBlender, AnimationLayer};
pub use idle::IdleOverlay;
pub use command::ExpressionCommand;
pub use pipeline::LocalPipeline;
