use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    color,
    device::{Device, DeviceError, Tex1D},
};

pub const NUM_RAND_VECS: usize = 8192;

// dither amplitude, in steps
const SCALE: f32 = 2.0;

/// Fixed table of random offsets used to dither ray start positions.
/// Generated once at construction so the noise pattern is coherent across
/// frames. The alpha channel is padding; the kernel reads RGB only.
pub struct JitterTable {
    tex: Tex1D,
}

impl JitterTable {
    pub fn new(device: &Device) -> Result<JitterTable, DeviceError> {
        Self::with_rng(device, &mut StdRng::from_entropy())
    }

    /// Seedable variant so tests can fix the noise pattern.
    pub fn with_rng(device: &Device, rng: &mut impl Rng) -> Result<JitterTable, DeviceError> {
        let entries = (0..NUM_RAND_VECS)
            .map(|_| {
                color::new(
                    rng.gen::<f32>() * SCALE,
                    rng.gen::<f32>() * SCALE,
                    rng.gen::<f32>() * SCALE,
                    0.0,
                )
            })
            .collect();
        Ok(JitterTable {
            tex: Tex1D::new(device, entries)?,
        })
    }

    pub fn fetch(&self, i: usize) -> Vector3<f32> {
        self.tex.fetch(i % NUM_RAND_VECS).xyz()
    }
}
