mod dispatch;
mod framebuffer;
mod front;
mod kernel;
mod options;
mod renderer;

pub use dispatch::BLOCK_SIZE;
pub use framebuffer::{DepthBuffer, FrameBuffer};
pub use front::RendererFront;
pub use kernel::ERT_THRESHOLD;
pub use options::{
    ClipPlane, ClipSphere, DepthPrecision, MipMode, RenderOptions, RenderOptionsBuilder,
    RenderParam, Roi,
};
pub use renderer::Renderer;
