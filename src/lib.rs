pub mod camera;
pub mod color;
pub mod common;
pub mod device;
mod error;
pub mod jitter;
pub mod premade;
pub mod render;
pub mod tf;
pub mod volumetric;

pub use camera::{CameraMatrices, PerspectiveCamera};
pub use color::RGBA;
pub use error::RenderError;
pub use render::Renderer;
