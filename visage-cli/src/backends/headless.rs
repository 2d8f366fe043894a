// Headless backend: draws nothing, counts frames

use tracing::{debug, info};
use visage_core::{FaceStyle, Geometry, Renderer, Result};

pub struct HeadlessRenderer {
    size: (u32, u32),
    frames: u64,
    limit: Option<u64>,
    initialized: bool,
}

impl HeadlessRenderer {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            size: (0, 0),
            frames: 0,
            limit,
            initialized: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for HeadlessRenderer {
    fn init(&mut self, width: u32, height: u32, _style: &FaceStyle) -> Result<()> {
        self.size = (width, height);
        self.initialized = true;
        debug!("Headless renderer at {}x{}", width, height);
        Ok(())
    }

    fn render(&mut self, _geometry: &Geometry, _style: &FaceStyle) -> Result<()> {
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.frames += 1;
        Ok(())
    }

    fn handle_events(&mut self) -> bool {
        self.limit.map_or(true, |limit| self.frames < limit)
    }

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn cleanup(&mut self) {
        if self.initialized {
            info!("Headless renderer finished after {} frames", self.frames);
            self.initialized = false;
        }
    }

    fn backend_name(&self) -> &str {
        "headless"
    }
}
