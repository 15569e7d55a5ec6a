use crate::{
    common::BoundBox,
    device::{Device, DeviceError, SamplerDesc, Tex3D},
    RenderError,
};

use super::{VolumeDesc, VoxelFormat};

enum FrameTexture {
    U8(Tex3D<u8>),
    U16(Tex3D<u16>),
}

/// Device-side mirror of a [`VolumeDesc`]: one 3-D texture per time frame.
///
/// The store exclusively owns the device arrays; [`VolumeStore::bind`] hands
/// out a non-owning view carrying the sampler state.
pub struct VolumeStore {
    format: VoxelFormat,
    bound_box: BoundBox,
    frames: Vec<FrameTexture>,
    sampler: SamplerDesc,
}

impl VolumeStore {
    /// Upload every frame of the descriptor. If the device refuses frame `k`,
    /// frames `0..k` are released before the error is reported.
    pub fn build(device: &Device, desc: &VolumeDesc) -> Result<VolumeStore, RenderError> {
        desc.validate()?;

        let mut frames = Vec::with_capacity(desc.frames.len());
        for (k, raw) in desc.frames.iter().enumerate() {
            match upload_frame(device, desc, raw) {
                Ok(tex) => frames.push(tex),
                Err(e) => {
                    // roll back frames 0..k
                    frames.clear();
                    log::error!("uploading volume frame {k} failed: {e}");
                    return Err(e.into());
                }
            }
        }

        log::info!(
            "volume store up: {}x{}x{} voxels, {} frame(s), {:?}",
            desc.size.x,
            desc.size.y,
            desc.size.z,
            frames.len(),
            desc.format,
        );

        Ok(VolumeStore {
            format: desc.format,
            bound_box: desc.bound_box(),
            frames,
            sampler: SamplerDesc::linear(),
        })
    }

    pub fn format(&self) -> VoxelFormat {
        self.format
    }

    pub fn bound_box(&self) -> BoundBox {
        self.bound_box
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn set_interpolation(&mut self, on: bool) {
        self.sampler = if on {
            SamplerDesc::linear()
        } else {
            SamplerDesc::nearest()
        };
    }

    pub fn bind(&self, frame: usize) -> VolumeTextureView<'_> {
        VolumeTextureView {
            frame: &self.frames[frame % self.frames.len()],
            sampler: self.sampler,
        }
    }
}

fn upload_frame(
    device: &Device,
    desc: &VolumeDesc,
    raw: &[u8],
) -> Result<FrameTexture, DeviceError> {
    let tex = match desc.format {
        VoxelFormat::U8 => FrameTexture::U8(Tex3D::new(device, desc.size, raw.to_vec())?),
        VoxelFormat::U16 => FrameTexture::U16(Tex3D::new(device, desc.size, rebit_16(raw))?),
    };
    Ok(tex)
}

// 12-bit sensor data in a 16-bit big-endian container: shift each value
// right by 4, copy the low source byte through, replace the high byte with
// the shifted result. Kept bit-exact for compatibility with existing
// data sets.
fn rebit_16(raw: &[u8]) -> Vec<u16> {
    raw.chunks_exact(2)
        .map(|pair| {
            let shifted = (u16::from_be_bytes([pair[0], pair[1]]) >> 4) as u8;
            u16::from_le_bytes([shifted, pair[1]])
        })
        .collect()
}

/// Non-owning bind of one volume frame plus its sampler state.
#[derive(Clone, Copy)]
pub struct VolumeTextureView<'a> {
    frame: &'a FrameTexture,
    sampler: SamplerDesc,
}

impl VolumeTextureView<'_> {
    /// Normalized scalar at normalized texture coordinates.
    pub fn sample(&self, u: f32, v: f32, w: f32) -> f32 {
        match self.frame {
            FrameTexture::U8(tex) => tex.sample(u, v, w, self.sampler),
            FrameTexture::U16(tex) => tex.sample(u, v, w, self.sampler),
        }
    }
}

#[cfg(test)]
mod test {

    use nalgebra::{point, vector};

    use super::*;

    fn desc_u8(frames: Vec<Vec<u8>>) -> VolumeDesc {
        VolumeDesc {
            size: vector![2, 2, 2],
            format: VoxelFormat::U8,
            extent: vector![2.0, 2.0, 2.0],
            position: point![0.0, 0.0, 0.0],
            frames,
        }
    }

    #[test]
    fn rebit_matches_reference_layout() {
        // big-endian 0x1234, shifted right by 4 -> 0x123; the high byte
        // takes its low bits, the 0x34 low byte is copied through
        let out = rebit_16(&[0x12, 0x34]);
        assert_eq!(out, vec![u16::from_le_bytes([0x23, 0x34])]);

        // all-ones survives as 0xFF in the replaced byte
        let out = rebit_16(&[0xFF, 0xFF]);
        assert_eq!(out, vec![u16::from_le_bytes([0xFF, 0xFF])]);
    }

    #[test]
    fn failed_frame_rolls_back_earlier_frames() {
        // room for one 8-voxel frame, not two
        let device = Device::with_memory_limit(12).unwrap();
        let desc = desc_u8(vec![vec![1; 8], vec![2; 8]]);

        let err = VolumeStore::build(&device, &desc);
        assert!(matches!(err, Err(RenderError::OutOfDeviceMemory { .. })));
        assert_eq!(device.used_bytes(), 0);
    }

    #[test]
    fn frame_index_wraps() {
        let device = Device::new().unwrap();
        let desc = desc_u8(vec![vec![0; 8], vec![255; 8]]);
        let store = VolumeStore::build(&device, &desc).unwrap();

        let first = store.bind(0).sample(0.5, 0.5, 0.5);
        let wrapped = store.bind(2).sample(0.5, 0.5, 0.5);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn interpolation_switches_sampler() {
        let device = Device::new().unwrap();
        let mut data = vec![0u8; 8];
        data[0] = 200;
        let mut desc = desc_u8(vec![data]);
        desc.size = vector![2, 2, 2];

        let mut store = VolumeStore::build(&device, &desc).unwrap();

        // off-center position: nearest snaps to the 200 texel,
        // linear mixes it with the zero neighbours
        store.set_interpolation(false);
        let nearest = store.bind(0).sample(0.4, 0.4, 0.4);
        store.set_interpolation(true);
        let linear = store.bind(0).sample(0.4, 0.4, 0.4);

        assert!((nearest - 200.0 / 255.0).abs() < 1e-6);
        assert!(linear < nearest);
    }
}
