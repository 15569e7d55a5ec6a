use thiserror::Error;

use crate::device::DeviceError;

/// Host-boundary failures. Nothing in the kernel path raises;
/// every failure point sits on the orchestrator side of the launch.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Device bring-up failed. Rendering is refused.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(&'static str),

    /// A volume, transfer-function or framebuffer allocation failed.
    /// Sticky until the owning resource is rebuilt; partial allocations
    /// are rolled back before this is reported.
    #[error("out of device memory: requested {requested} B, free {free} B")]
    OutOfDeviceMemory { requested: usize, free: usize },

    /// Bytes per channel outside {1, 2}.
    #[error("unsupported voxel format: {bpc} bytes per channel")]
    UnsupportedFormat { bpc: usize },

    /// Per-call failure; logged and skipped, the next frame retries.
    #[error("transient device error: {0}")]
    TransientDeviceError(&'static str),

    /// Malformed input on the host API (wrong LUT length, empty volume, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

impl From<DeviceError> for RenderError {
    fn from(e: DeviceError) -> RenderError {
        match e {
            DeviceError::Unavailable(what) => RenderError::DeviceUnavailable(what),
            DeviceError::OutOfMemory { requested, free } => {
                RenderError::OutOfDeviceMemory { requested, free }
            }
        }
    }
}
