// Built-in renderer backends

pub mod headless;
pub mod jsonl;

pub use headless::HeadlessRenderer;
pub use jsonl::JsonlRenderer;

use visage_core::BackendRegistry;

/// Registry holding every backend this binary ships
pub fn builtin_registry(frame_limit: Option<u64>) -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register("headless", move || Box::new(HeadlessRenderer::new(frame_limit)));
    registry.register("jsonl", move || Box::new(JsonlRenderer::stdout(frame_limit)));
    registry
}
