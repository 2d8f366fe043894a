//! Renderer boundary and backend registry
//!
//! The core never draws. It hands a `Geometry` to whichever `Renderer` was
//! selected by name from a `BackendRegistry` populated at startup.

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::style::FaceStyle;
use std::collections::BTreeMap;
use tracing::debug;

/// A rendering backend
pub trait Renderer: Send {
    /// Create the render target
    fn init(&mut self, width: u32, height: u32, style: &FaceStyle) -> Result<()>;

    /// Draw one frame
    fn render(&mut self, geometry: &Geometry, style: &FaceStyle) -> Result<()>;

    /// Flip/flush the drawn frame
    fn present(&mut self) -> Result<()>;

    /// Pump input events; `false` requests shutdown
    fn handle_events(&mut self) -> bool;

    /// Current (width, height) of the render target
    fn get_size(&self) -> (u32, u32);

    /// Release resources. Must tolerate being called more than once.
    fn cleanup(&mut self);

    fn backend_name(&self) -> &str;
}

/// Factory producing a fresh renderer instance
pub type BackendFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

/// Explicit name -> backend table
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend; a later registration under the same name wins
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + Send + Sync + 'static,
    {
        debug!("Registering renderer backend '{}'", name);
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered backend names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the named backend
    pub fn create(&self, name: &str) -> Result<Box<dyn Renderer>> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(Error::Backend(format!(
                "Unknown backend '{}'. Available: {:?}",
                name,
                self.names()
            ))),
        }
    }
}
