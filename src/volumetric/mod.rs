mod skip_grid;
mod store;

use nalgebra::{Point3, Vector3};

pub use skip_grid::SkipGrid;
pub use store::{VolumeStore, VolumeTextureView};

use crate::{common::BoundBox, RenderError};

/// Bytes per voxel channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelFormat {
    U8,
    U16,
}

impl VoxelFormat {
    pub fn from_bpc(bpc: usize) -> Result<VoxelFormat, RenderError> {
        match bpc {
            1 => Ok(VoxelFormat::U8),
            2 => Ok(VoxelFormat::U16),
            _ => Err(RenderError::UnsupportedFormat { bpc }),
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            VoxelFormat::U8 => 1,
            VoxelFormat::U16 => 2,
        }
    }

    /// Transfer-function table length for this format.
    pub fn tf_len(&self) -> usize {
        match self {
            VoxelFormat::U8 => 256,
            VoxelFormat::U16 => 4096,
        }
    }
}

/// Host-side description of a scalar field: geometry plus one raw byte
/// buffer per time frame, x-fastest z-slowest.
///
/// Immutable during rendering except for the frame index advance.
#[derive(Debug, Clone)]
pub struct VolumeDesc {
    /// Voxel counts per axis.
    pub size: Vector3<usize>,
    pub format: VoxelFormat,
    /// Physical size in object-space units.
    pub extent: Vector3<f32>,
    /// Object-space center of the volume box.
    pub position: Point3<f32>,
    pub frames: Vec<Vec<u8>>,
}

impl VolumeDesc {
    /// Build a descriptor from untyped loader output, where bytes per
    /// channel arrive as a plain number.
    pub fn from_raw(
        size: Vector3<usize>,
        bpc: usize,
        extent: Vector3<f32>,
        position: Point3<f32>,
        frames: Vec<Vec<u8>>,
    ) -> Result<VolumeDesc, RenderError> {
        let desc = VolumeDesc {
            size,
            format: VoxelFormat::from_bpc(bpc)?,
            extent,
            position,
            frames,
        };
        desc.validate()?;
        Ok(desc)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.size.iter().any(|&n| n == 0) {
            return Err(RenderError::InvalidParameter("volume with zero extent"));
        }
        if self.frames.is_empty() {
            return Err(RenderError::InvalidParameter("volume with no frames"));
        }
        let expected = self.voxel_count() * self.format.bytes();
        if self.frames.iter().any(|f| f.len() != expected) {
            return Err(RenderError::InvalidParameter(
                "frame byte length does not match volume dimensions",
            ));
        }
        Ok(())
    }

    pub fn voxel_count(&self) -> usize {
        self.size.x * self.size.y * self.size.z
    }

    pub fn bound_box(&self) -> BoundBox {
        BoundBox::from_center_half(self.position, self.extent * 0.5)
    }

    /// Length of the voxel-grid diagonal, in voxels. Drives the sample count.
    pub fn diagonal_voxels(&self) -> f32 {
        self.size.map(|n| n as f32).norm()
    }
}
