// Tick loop and the pose drivers feeding it

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};
use visage_anim::{ExpressionCommand, LocalPipeline};
use visage_core::{geometry, FaceStyle, PoseVector, RenderConfig, Renderer, Result};
use visage_relay::{FrameReceiver, Shutdown};

use crate::watcher::TextChunk;

/// Monotonic seconds since startup, shared by the loop and input tasks
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces the pose to draw on each tick
pub trait PoseDriver: Send {
    fn next_pose(&mut self, dt: f64, now: f64) -> PoseVector;
}

/// Local generation: commands and text in, blended pose out
pub struct LocalDriver {
    pipeline: LocalPipeline,
    commands: Option<UnboundedReceiver<ExpressionCommand>>,
    text: Option<UnboundedReceiver<TextChunk>>,
}

impl LocalDriver {
    pub fn new(
        pipeline: LocalPipeline,
        commands: Option<UnboundedReceiver<ExpressionCommand>>,
        text: Option<UnboundedReceiver<TextChunk>>,
    ) -> Self {
        Self {
            pipeline,
            commands,
            text,
        }
    }

    pub fn pipeline(&self) -> &LocalPipeline {
        &self.pipeline
    }
}

impl PoseDriver for LocalDriver {
    fn next_pose(&mut self, dt: f64, now: f64) -> PoseVector {
        if let Some(ref mut commands) = self.commands {
            while let Ok(command) = commands.try_recv() {
                self.pipeline.apply_command(&command, now);
            }
        }
        if let Some(ref mut text) = self.text {
            while let Ok(chunk) = text.try_recv() {
                self.pipeline.feed_text(&chunk.text, chunk.timestamp);
            }
        }
        self.pipeline.step(dt, now)
    }
}

/// Relay consumption: whatever frame arrived last
pub struct RelayDriver {
    receiver: Arc<FrameReceiver>,
}

impl RelayDriver {
    pub fn new(receiver: Arc<FrameReceiver>) -> Self {
        Self { receiver }
    }
}

impl PoseDriver for RelayDriver {
    fn next_pose(&mut self, _dt: f64, _now: f64) -> PoseVector {
        self.receiver.latest().pose
    }
}

/// Fixed-rate render loop. Blocks the calling thread until the renderer asks
/// to quit or `shutdown` fires; returns the number of frames presented.
pub fn run_tick_loop(
    renderer: &mut dyn Renderer,
    driver: &mut dyn PoseDriver,
    style: &FaceStyle,
    config: &RenderConfig,
    clock: Clock,
    shutdown: &Shutdown,
) -> Result<u64> {
    renderer.init(config.width, config.height, style)?;
    info!(
        "Rendering with '{}' at {}x{}, {} fps",
        renderer.backend_name(),
        config.width,
        config.height,
        config.fps
    );

    let result = tick(renderer, driver, style, config, clock, shutdown);
    renderer.cleanup();
    result
}

/// Seconds since the previous tick, clamped to `[0, max_dt]` so a stall
/// never turns into one huge animation step
pub fn frame_delta(now: f64, last: f64, max_dt: f64) -> f64 {
    let dt = now - last;
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, max_dt)
}

fn tick(
    renderer: &mut dyn Renderer,
    driver: &mut dyn PoseDriver,
    style: &FaceStyle,
    config: &RenderConfig,
    clock: Clock,
    shutdown: &Shutdown,
) -> Result<u64> {
    let interval = config.frame_interval();
    let mut frames: u64 = 0;
    let mut last = clock.now();

    while !shutdown.is_stopped() {
        let started = Instant::now();
        if !renderer.handle_events() {
            debug!("Renderer requested shutdown");
            break;
        }

        let now = clock.now();
        let dt = frame_delta(now, last, config.max_dt);
        last = now;

        let pose = driver.next_pose(dt, now);
        let geometry = geometry::compute(&pose, renderer.get_size(), style);
        renderer.render(&geometry, style)?;
        renderer.present()?;
        frames += 1;

        let elapsed = started.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    Ok(frames)
}
