use nalgebra::Vector3;

use crate::color::RGBA;

use super::{Allocation, Device, DeviceError};

/// Element type a device texture can hold. Samples normalize to `<0;1>`.
pub trait Texel: Copy + Send + Sync + 'static {
    const BYTES: usize;

    fn to_norm(self) -> f32;
}

impl Texel for u8 {
    const BYTES: usize = 1;

    fn to_norm(self) -> f32 {
        self as f32 / u8::MAX as f32
    }
}

impl Texel for u16 {
    const BYTES: usize = 2;

    fn to_norm(self) -> f32 {
        self as f32 / u16::MAX as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// Sampler state attached to a texture bind.
///
/// Addressing is clamped on all axes and coordinates are normalized to
/// `<0;1>`; only the filter varies.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub filter: Filter,
}

impl SamplerDesc {
    pub fn nearest() -> SamplerDesc {
        SamplerDesc {
            filter: Filter::Nearest,
        }
    }

    pub fn linear() -> SamplerDesc {
        SamplerDesc {
            filter: Filter::Linear,
        }
    }
}

fn nearest_index(u: f32, n: usize) -> usize {
    (u * n as f32).floor().clamp(0.0, (n - 1) as f32) as usize
}

// (low index, high index, interpolation weight)
fn linear_index(u: f32, n: usize) -> (usize, usize, f32) {
    let x = u * n as f32 - 0.5;
    let floor = x.floor();
    let t = x - floor;
    let hi = (n - 1) as f32;
    let i0 = floor.clamp(0.0, hi) as usize;
    let i1 = (floor + 1.0).clamp(0.0, hi) as usize;
    (i0, i1, if t.is_finite() { t } else { 0.0 })
}

/// A 3-D device texture. Owns its storage; binds hand out non-owning views.
#[derive(Debug)]
pub struct Tex3D<T> {
    size: Vector3<usize>,
    data: Vec<T>,
    _alloc: Allocation,
}

impl<T: Texel> Tex3D<T> {
    pub fn new(device: &Device, size: Vector3<usize>, data: Vec<T>) -> Result<Tex3D<T>, DeviceError> {
        assert_eq!(data.len(), size.x * size.y * size.z);
        let alloc = device.allocate(data.len() * T::BYTES)?;
        Ok(Tex3D {
            size,
            data,
            _alloc: alloc,
        })
    }

    pub fn size(&self) -> Vector3<usize> {
        self.size
    }

    fn texel(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[crate::common::index_3d(x, y, z, self.size)].to_norm()
    }

    /// Raw texel at normalized coordinates, nearest filtering, clamped.
    pub fn fetch(&self, u: f32, v: f32, w: f32) -> T {
        let x = nearest_index(u, self.size.x);
        let y = nearest_index(v, self.size.y);
        let z = nearest_index(w, self.size.z);
        self.data[crate::common::index_3d(x, y, z, self.size)]
    }

    /// Normalized sample at normalized coordinates `<0;1>^3`.
    pub fn sample(&self, u: f32, v: f32, w: f32, sampler: SamplerDesc) -> f32 {
        match sampler.filter {
            Filter::Nearest => self.fetch(u, v, w).to_norm(),
            Filter::Linear => {
                let (x0, x1, tx) = linear_index(u, self.size.x);
                let (y0, y1, ty) = linear_index(v, self.size.y);
                let (z0, z1, tz) = linear_index(w, self.size.z);

                let c000 = self.texel(x0, y0, z0);
                let c100 = self.texel(x1, y0, z0);
                let c010 = self.texel(x0, y1, z0);
                let c110 = self.texel(x1, y1, z0);
                let c001 = self.texel(x0, y0, z1);
                let c101 = self.texel(x1, y0, z1);
                let c011 = self.texel(x0, y1, z1);
                let c111 = self.texel(x1, y1, z1);

                let c00 = c000 * (1.0 - tx) + c100 * tx;
                let c10 = c010 * (1.0 - tx) + c110 * tx;
                let c01 = c001 * (1.0 - tx) + c101 * tx;
                let c11 = c011 * (1.0 - tx) + c111 * tx;

                let c0 = c00 * (1.0 - ty) + c10 * ty;
                let c1 = c01 * (1.0 - ty) + c11 * ty;

                c0 * (1.0 - tz) + c1 * tz
            }
        }
    }
}

/// A 1-D RGBA float texture: transfer-function tables and the jitter table.
/// Linear filtering, clamp addressing.
#[derive(Debug)]
pub struct Tex1D {
    data: Vec<RGBA>,
    _alloc: Allocation,
}

impl Tex1D {
    pub fn new(device: &Device, data: Vec<RGBA>) -> Result<Tex1D, DeviceError> {
        assert!(!data.is_empty());
        let alloc = device.allocate(data.len() * std::mem::size_of::<RGBA>())?;
        Ok(Tex1D {
            data,
            _alloc: alloc,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn entries(&self) -> &[RGBA] {
        &self.data
    }

    pub fn fetch(&self, i: usize) -> RGBA {
        self.data[i.min(self.data.len() - 1)]
    }

    /// Linearly filtered lookup at normalized coordinate `<0;1>`.
    pub fn sample(&self, u: f32) -> RGBA {
        let (i0, i1, t) = linear_index(u, self.data.len());
        self.data[i0] * (1.0 - t) + self.data[i1] * t
    }
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use crate::color;

    use super::*;

    fn ramp_tex(device: &Device) -> Tex3D<u8> {
        // 2x2x2, values 0..=7 scaled to bytes
        let data: Vec<u8> = (0..8).map(|v| v * 32).collect();
        Tex3D::new(device, vector![2, 2, 2], data).unwrap()
    }

    #[test]
    fn nearest_picks_texel_centers() {
        let device = Device::new().unwrap();
        let tex = ramp_tex(&device);

        assert_eq!(
            tex.sample(0.0, 0.0, 0.0, SamplerDesc::nearest()),
            0.0
        );
        // (1,1,1) texel holds 7 * 32 = 224
        let far = tex.sample(1.0, 1.0, 1.0, SamplerDesc::nearest());
        assert!((far - 224.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn linear_midpoint_averages() {
        let device = Device::new().unwrap();
        let data = vec![0u8, 255];
        let tex = Tex3D::new(&device, vector![2, 1, 1], data).unwrap();

        let mid = tex.sample(0.5, 0.5, 0.5, SamplerDesc::linear());
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn addressing_clamps() {
        let device = Device::new().unwrap();
        let tex = ramp_tex(&device);

        let inside = tex.sample(0.0, 0.0, 0.0, SamplerDesc::linear());
        let outside = tex.sample(-3.0, -3.0, -3.0, SamplerDesc::linear());
        assert_eq!(inside, outside);
    }

    #[test]
    fn tex1d_lerps_between_entries() {
        let device = Device::new().unwrap();
        let lut = vec![color::zero(), color::new(1.0, 1.0, 1.0, 1.0)];
        let tex = Tex1D::new(&device, lut).unwrap();

        let mid = tex.sample(0.5);
        assert!((mid.w - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tex1d_fetch_clamps() {
        let device = Device::new().unwrap();
        let lut = vec![color::zero(), color::new(1.0, 0.0, 0.0, 1.0)];
        let tex = Tex1D::new(&device, lut).unwrap();

        assert_eq!(tex.fetch(10).x, 1.0);
    }
}
