use crate::device::{Allocation, Device, DeviceError};

use super::options::DepthPrecision;

/// Output surfaces for one launch: an RGBA8 color image whose row stride is
/// rounded up to a power-of-two texture width, and the optional depth image.
///
/// The kernel only ever writes the visible `width x height` pixels; the
/// padding columns stay zeroed.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    tex_width: usize,
    color: Vec<u8>,
    depth: Option<DepthBuffer>,
    _alloc: Allocation,
}

pub enum DepthBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl DepthBuffer {
    fn new(precision: DepthPrecision, len: usize) -> DepthBuffer {
        match precision {
            DepthPrecision::U8 => DepthBuffer::U8(vec![0; len]),
            DepthPrecision::U16 => DepthBuffer::U16(vec![0; len]),
            DepthPrecision::U32 => DepthBuffer::U32(vec![0; len]),
        }
    }

    pub fn precision(&self) -> DepthPrecision {
        match self {
            DepthBuffer::U8(_) => DepthPrecision::U8,
            DepthBuffer::U16(_) => DepthPrecision::U16,
            DepthBuffer::U32(_) => DepthPrecision::U32,
        }
    }

    fn bytes(precision: DepthPrecision, len: usize) -> usize {
        match precision {
            DepthPrecision::U8 => len,
            DepthPrecision::U16 => len * 2,
            DepthPrecision::U32 => len * 4,
        }
    }

    fn clear(&mut self) {
        match self {
            DepthBuffer::U8(v) => v.fill(0),
            DepthBuffer::U16(v) => v.fill(0),
            DepthBuffer::U32(v) => v.fill(0),
        }
    }
}

impl FrameBuffer {
    pub fn new(
        device: &Device,
        width: usize,
        height: usize,
        depth: Option<DepthPrecision>,
    ) -> Result<FrameBuffer, DeviceError> {
        let tex_width = width.next_power_of_two();
        let color_bytes = tex_width * height * 4;
        let depth_bytes = depth.map_or(0, |p| DepthBuffer::bytes(p, width * height));

        let alloc = device.allocate(color_bytes + depth_bytes)?;

        log::debug!("framebuffer {width}x{height}, stride {tex_width}, depth {depth:?}");

        Ok(FrameBuffer {
            width,
            height,
            tex_width,
            color: vec![0; color_bytes],
            depth: depth.map(|p| DepthBuffer::new(p, width * height)),
            _alloc: alloc,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row stride of the color surface, in pixels.
    pub fn tex_width(&self) -> usize {
        self.tex_width
    }

    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn depth(&self) -> Option<&DepthBuffer> {
        self.depth.as_ref()
    }

    pub fn clear(&mut self) {
        self.color.fill(0);
        if let Some(d) = self.depth.as_mut() {
            d.clear();
        }
    }

    pub(crate) fn split_mut(&mut self) -> (&mut [u8], Option<&mut DepthBuffer>) {
        (&mut self.color, self.depth.as_mut())
    }

    /// Copy the visible pixels into `out`, dropping the stride padding.
    pub fn copy_visible_into(&self, out: &mut Vec<u8>) {
        out.resize(self.width * self.height * 4, 0);
        for y in 0..self.height {
            let src = y * self.tex_width * 4;
            let dst = y * self.width * 4;
            out[dst..dst + self.width * 4]
                .copy_from_slice(&self.color[src..src + self.width * 4]);
        }
    }

    /// RGBA bytes of the visible pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.tex_width + x) * 4;
        [
            self.color[i],
            self.color[i + 1],
            self.color[i + 2],
            self.color[i + 3],
        ]
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn stride_rounds_to_power_of_two() {
        let device = Device::new().unwrap();
        let fb = FrameBuffer::new(&device, 700, 700, None).unwrap();

        assert_eq!(fb.tex_width(), 1024);
        assert_eq!(fb.color().len(), 1024 * 700 * 4);
    }

    #[test]
    fn allocation_failure_reports_oom() {
        let device = Device::with_memory_limit(16).unwrap();
        let err = FrameBuffer::new(&device, 64, 64, None);

        assert!(matches!(err, Err(DeviceError::OutOfMemory { .. })));
        assert_eq!(device.used_bytes(), 0);
    }

    #[test]
    fn visible_copy_drops_padding() {
        let device = Device::new().unwrap();
        let mut fb = FrameBuffer::new(&device, 3, 2, None).unwrap();
        assert_eq!(fb.tex_width(), 4);

        // stamp the visible pixels through split_mut
        let (color, _) = fb.split_mut();
        for y in 0..2 {
            for x in 0..3 {
                color[(y * 4 + x) * 4] = (10 * y + x) as u8;
            }
        }

        let mut out = Vec::new();
        fb.copy_visible_into(&mut out);
        assert_eq!(out.len(), 3 * 2 * 4);
        assert_eq!(out[0], 0);
        assert_eq!(out[(1 * 3 + 2) * 4], 12);
    }

    #[test]
    fn resize_swaps_depth_precision() {
        let device = Device::new().unwrap();
        let fb = FrameBuffer::new(&device, 8, 8, Some(DepthPrecision::U16)).unwrap();
        assert_eq!(fb.depth().unwrap().precision(), DepthPrecision::U16);
    }
}
