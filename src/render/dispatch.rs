//! Kernel dispatch: grid sizing and the data-parallel launch.
//!
//! The output is partitioned into 16x16 blocks, `ceil(w/16) x ceil(h/16)` of
//! them; on this backend a grid row of blocks maps to one band of the color
//! buffer and the bands run in parallel. Writes are partitioned by pixel
//! coordinate, so the launch needs no locks.

use rayon::prelude::*;

use super::{
    framebuffer::{DepthBuffer, FrameBuffer},
    kernel::{cast_ray, KernelParams},
};

pub const BLOCK_SIZE: usize = 16;

pub(crate) trait DepthTexel: Copy + Send {
    fn quantize(z: f32) -> Self;
}

impl DepthTexel for u8 {
    fn quantize(z: f32) -> u8 {
        (z * u8::MAX as f32).round() as u8
    }
}

impl DepthTexel for u16 {
    fn quantize(z: f32) -> u16 {
        (z * u16::MAX as f32).round() as u16
    }
}

impl DepthTexel for u32 {
    fn quantize(z: f32) -> u32 {
        (z as f64 * u32::MAX as f64).round() as u32
    }
}

/// Run one launch over the framebuffer.
pub fn launch(params: &KernelParams, fb: &mut FrameBuffer) {
    let (width, height, tex_width) = (fb.width(), fb.height(), fb.tex_width());
    if width == 0 || height == 0 {
        return;
    }

    log::trace!(
        "launch: grid {}x{} of {BLOCK_SIZE}x{BLOCK_SIZE} blocks",
        width.div_ceil(BLOCK_SIZE),
        height.div_ceil(BLOCK_SIZE),
    );

    let (color, depth) = fb.split_mut();
    match depth {
        None => run::<u8>(params, color, None, width, tex_width),
        Some(DepthBuffer::U8(buf)) => run(params, color, Some(buf), width, tex_width),
        Some(DepthBuffer::U16(buf)) => run(params, color, Some(buf), width, tex_width),
        Some(DepthBuffer::U32(buf)) => run(params, color, Some(buf), width, tex_width),
    }
}

fn run<T: DepthTexel>(
    params: &KernelParams,
    color: &mut [u8],
    depth: Option<&mut Vec<T>>,
    width: usize,
    tex_width: usize,
) {
    let band_bytes = tex_width * 4 * BLOCK_SIZE;

    match depth {
        Some(depth) => {
            color
                .par_chunks_mut(band_bytes)
                .zip(depth.par_chunks_mut(width * BLOCK_SIZE))
                .enumerate()
                .for_each(|(band, (rows, depth_rows))| {
                    render_band(params, rows, Some(depth_rows), band, width, tex_width);
                });
        }
        None => {
            color
                .par_chunks_mut(band_bytes)
                .enumerate()
                .for_each(|(band, rows)| {
                    render_band::<T>(params, rows, None, band, width, tex_width);
                });
        }
    }
}

fn render_band<T: DepthTexel>(
    params: &KernelParams,
    rows: &mut [u8],
    mut depth_rows: Option<&mut [T]>,
    band: usize,
    width: usize,
    tex_width: usize,
) {
    let row_count = rows.len() / (tex_width * 4);
    for row in 0..row_count {
        let y = band * BLOCK_SIZE + row;
        for x in 0..width {
            let (rgba, z) = cast_ray(params, x, y);
            let i = (row * tex_width + x) * 4;
            rows[i..i + 4].copy_from_slice(&rgba);
            if let Some(d) = depth_rows.as_deref_mut() {
                d[row * width + x] = T::quantize(z);
            }
        }
    }
}
