//! Prebuilt file parsers and transfer-function tables.
//!
//! Serves as an example to make your own, for example to add support
//! for another raw container format.

pub mod parse;
pub mod transfer_functions;

use nalgebra::{point, vector, Vector2, Vector3};

use crate::{
    device::Device,
    render::{RenderOptions, Renderer},
    volumetric::{VolumeDesc, VoxelFormat},
    PerspectiveCamera, RenderError,
};

/// Synthetic test volume: a soft sphere of the given voxel resolution,
/// brightest at the center.
pub fn sphere_volume(side: usize) -> VolumeDesc {
    let center = (side as f32 - 1.0) * 0.5;
    let mut data = Vec::with_capacity(side * side * side);
    for z in 0..side {
        for y in 0..side {
            for x in 0..side {
                let d = vector![
                    x as f32 - center,
                    y as f32 - center,
                    z as f32 - center
                ]
                .norm()
                    / center;
                data.push((255.0 * (1.0 - d).max(0.0)) as u8);
            }
        }
    }
    VolumeDesc {
        size: Vector3::repeat(side),
        format: VoxelFormat::U8,
        extent: vector![2.0, 2.0, 2.0],
        position: point![0.0, 0.0, 0.0],
        frames: vec![data],
    }
}

/// Example of a usecase: render a single frame of the synthetic sphere.
pub fn render_frame(resolution: Vector2<u16>) -> Result<Vec<u8>, RenderError> {
    let device = Device::new()?;
    let desc = sphere_volume(64);

    let options = RenderOptions::builder()
        .resolution(resolution)
        .early_ray_termination(true)
        .build_unchecked();

    let mut renderer = Renderer::new(device, &desc, options)?;
    renderer.set_transfer_function(&transfer_functions::grayscale(256))?;

    // Camera setup
    let camera = PerspectiveCamera::new(point![0.0, 0.0, 4.0], vector![0.0, 0.0, -1.0]);
    let aspect = resolution.x as f32 / resolution.y as f32;
    let mv = camera.view_matrix();
    let proj = camera.projection_matrix(aspect);

    renderer.render(
        mv.as_slice().try_into().expect("4x4 matrix is 16 floats"),
        proj.as_slice().try_into().expect("4x4 matrix is 16 floats"),
    )?;

    let mut out = Vec::new();
    renderer.framebuffer().copy_visible_into(&mut out);
    Ok(out)
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use super::*;

    #[test]
    fn sphere_volume_peaks_at_center() {
        let desc = sphere_volume(16);
        let mid = crate::common::index_3d(8, 8, 8, desc.size);
        let corner = crate::common::index_3d(0, 0, 0, desc.size);

        assert!(desc.frames[0][mid] > 200);
        assert_eq!(desc.frames[0][corner], 0);
    }

    #[test]
    fn render_frame_produces_pixels() {
        let image = render_frame(vector![32, 32]).unwrap();
        assert_eq!(image.len(), 32 * 32 * 4);

        // the sphere fills the image center
        let center = (16 * 32 + 16) * 4;
        assert!(image[center + 3] > 0);
    }
}
