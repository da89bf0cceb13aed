pub mod compositor;
pub mod context;
pub mod geometry;
pub mod pipelines;
pub mod scene;

pub use compositor::{Compositor, FrameTarget};
pub use context::RenderContext;
pub use scene::{Scene, SceneBuilder, Shape};

/// GPU setup and per-frame surface failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
