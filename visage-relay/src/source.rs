//! Frame source trait - anything that feeds frames into a `FrameSlot`

use crate::receiver::FrameSlot;
use crate::shutdown::Shutdown;
use async_trait::async_trait;

/// A background producer of mocap frames.
///
/// `run` owns the source for the lifetime of the task and must return
/// within one polling interval of `shutdown` being signalled.
#[async_trait]
pub trait FrameSource: Send {
    fn name(&self) -> &str;

    async fn run(self: Box<Self>, slot: FrameSlot, shutdown: Shutdown);
}
