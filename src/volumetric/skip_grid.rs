use std::ops::Range;

use nalgebra::Vector3;

use crate::{
    color::RGBA,
    common::{cell_range, index_3d},
    device::{Device, DeviceError, Tex3D},
};

use super::{VolumeDesc, VoxelFormat};

pub const DEFAULT_CELLS: usize = 16;

// One voxel of slack so the trilinear support of samples mapping to a cell
// is covered by the cell's scalar range.
fn with_margin(r: Range<usize>, len: usize) -> Range<usize> {
    r.start.saturating_sub(1)..(r.end + 1).min(len)
}

/// Empty-space-skipping grid: per-cell scalar min/max over the voxels the
/// cell covers, collapsed after every transfer-function update into a
/// boolean 3-D texture of "cell is fully transparent" flags.
///
/// The min/max arrays are built once per volume; only the flag texture is
/// rebuilt on transfer-function changes.
pub struct SkipGrid {
    cells: Vector3<usize>,
    cell_min: Vec<u8>,
    cell_max: Vec<u8>,
    tex: Option<Tex3D<u8>>,
}

impl SkipGrid {
    /// Scan the volume into per-cell scalar ranges. 8-bit volumes only;
    /// 16-bit silently disables the feature.
    pub fn build(desc: &VolumeDesc) -> Option<SkipGrid> {
        if desc.format != VoxelFormat::U8 {
            log::debug!("space skipping disabled: not an 8-bit volume");
            return None;
        }

        let cells = desc.size.map(|n| n.min(DEFAULT_CELLS));
        let cell_count: usize = cells.iter().product();
        let mut cell_min = Vec::with_capacity(cell_count);
        let mut cell_max = Vec::with_capacity(cell_count);

        for cz in 0..cells.z {
            for cy in 0..cells.y {
                for cx in 0..cells.x {
                    let xr = with_margin(cell_range(desc.size.x, cells.x, cx), desc.size.x);
                    let yr = with_margin(cell_range(desc.size.y, cells.y, cy), desc.size.y);
                    let zr = with_margin(cell_range(desc.size.z, cells.z, cz), desc.size.z);

                    let mut lo = u8::MAX;
                    let mut hi = u8::MIN;
                    // ranges aggregated over all frames so animated volumes
                    // never skip a cell that is visible in a later frame
                    for frame in &desc.frames {
                        for z in zr.clone() {
                            for y in yr.clone() {
                                for x in xr.clone() {
                                    let v = frame[index_3d(x, y, z, desc.size)];
                                    lo = lo.min(v);
                                    hi = hi.max(v);
                                }
                            }
                        }
                    }
                    cell_min.push(lo);
                    cell_max.push(hi);
                }
            }
        }

        log::info!(
            "skip grid built: {}x{}x{} cells",
            cells.x,
            cells.y,
            cells.z
        );

        Some(SkipGrid {
            cells,
            cell_min,
            cell_max,
            tex: None,
        })
    }

    /// Collapse the scalar ranges against a transfer function: a cell is
    /// skippable iff the LUT alpha is zero for every scalar in its range.
    pub fn refresh(&mut self, device: &Device, lut: &[RGBA]) -> Result<(), DeviceError> {
        debug_assert!(lut.len() > u8::MAX as usize);

        // a stale flag texture must never outlive its transfer function
        self.tex = None;

        let flags: Vec<u8> = self
            .cell_min
            .iter()
            .zip(&self.cell_max)
            .map(|(&lo, &hi)| {
                let transparent = lut[lo as usize..=hi as usize].iter().all(|c| c.w == 0.0);
                transparent as u8
            })
            .collect();

        self.tex = Some(Tex3D::new(device, self.cells, flags)?);
        Ok(())
    }

    /// The flag texture, once a transfer function has been applied.
    pub fn texture(&self) -> Option<&Tex3D<u8>> {
        self.tex.as_ref()
    }
}

#[cfg(test)]
mod test {

    use nalgebra::{point, vector};

    use crate::color;

    use super::*;

    fn lut_visible_above(threshold: usize) -> Vec<RGBA> {
        (0..256)
            .map(|s| {
                if s > threshold {
                    color::new(1.0, 1.0, 1.0, 1.0)
                } else {
                    color::zero()
                }
            })
            .collect()
    }

    fn corner_desc() -> VolumeDesc {
        // 4^3 zeros except one bright voxel at the origin corner
        let mut data = vec![0u8; 64];
        data[0] = 200;
        VolumeDesc {
            size: vector![4, 4, 4],
            format: VoxelFormat::U8,
            extent: vector![2.0, 2.0, 2.0],
            position: point![0.0, 0.0, 0.0],
            frames: vec![data],
        }
    }

    #[test]
    fn sixteen_bit_disables() {
        let desc = VolumeDesc {
            size: vector![2, 2, 2],
            format: VoxelFormat::U16,
            extent: vector![2.0, 2.0, 2.0],
            position: point![0.0, 0.0, 0.0],
            frames: vec![vec![0; 16]],
        };
        assert!(SkipGrid::build(&desc).is_none());
    }

    #[test]
    fn opaque_corner_is_not_skippable() {
        let device = Device::new().unwrap();
        let mut grid = SkipGrid::build(&corner_desc()).unwrap();
        grid.refresh(&device, &lut_visible_above(100)).unwrap();

        let tex = grid.texture().unwrap();
        // corner cell sees the bright voxel
        assert_eq!(tex.fetch(0.0, 0.0, 0.0), 0);
        // opposite corner is all zeros, fully transparent
        assert_eq!(tex.fetch(1.0, 1.0, 1.0), 1);
    }

    #[test]
    fn fully_transparent_lut_skips_everything() {
        let device = Device::new().unwrap();
        let mut grid = SkipGrid::build(&corner_desc()).unwrap();
        grid.refresh(&device, &vec![color::zero(); 256]).unwrap();

        let tex = grid.texture().unwrap();
        assert_eq!(tex.fetch(0.0, 0.0, 0.0), 1);
        assert_eq!(tex.fetch(1.0, 1.0, 1.0), 1);
    }

    #[test]
    fn refresh_replaces_flags() {
        let device = Device::new().unwrap();
        let mut grid = SkipGrid::build(&corner_desc()).unwrap();

        grid.refresh(&device, &lut_visible_above(100)).unwrap();
        assert_eq!(grid.texture().unwrap().fetch(0.0, 0.0, 0.0), 0);

        // raising the threshold above the bright voxel frees the corner
        grid.refresh(&device, &lut_visible_above(250)).unwrap();
        assert_eq!(grid.texture().unwrap().fetch(0.0, 0.0, 0.0), 1);
    }
}
