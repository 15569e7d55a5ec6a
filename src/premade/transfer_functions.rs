use crate::color::{self, RGBA};

// R G B A -- all components <0;1>, alpha is opacity at the reference step

/// Grayscale ramp; alpha follows the scalar.
pub fn grayscale(len: usize) -> Vec<RGBA> {
    (0..len)
        .map(|i| {
            let s = i as f32 / (len - 1) as f32;
            color::new(s, s, s, s)
        })
        .collect()
}

/// Opaque bone tint above a threshold, transparent below. Works well on
/// 8-bit skull-style scans.
pub fn bone(len: usize) -> Vec<RGBA> {
    (0..len)
        .map(|i| {
            let s = i as f32 / (len - 1) as f32;
            if s > 0.23 {
                color::new(0.89, 0.85, 0.79, 1.0)
            } else {
                color::zero()
            }
        })
        .collect()
}

/// Translucent colored shells for scanner data; denser material shifts
/// from blue through green to red.
pub fn shells(len: usize) -> Vec<RGBA> {
    (0..len)
        .map(|i| {
            let s = i as f32 / (len - 1) as f32;
            if s > 0.73 {
                color::new(1.0, 0.0, 0.0, 0.1)
            } else if s > 0.49 {
                color::new(0.0, 1.0, 0.0, 0.1)
            } else if s > 0.37 {
                color::new(0.0, 0.0, 1.0, 0.1)
            } else if s > 0.2 {
                color::new(0.04, 0.04, 0.04, 0.1)
            } else {
                color::zero()
            }
        })
        .collect()
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn grayscale_spans_full_range() {
        let lut = grayscale(256);
        assert_eq!(lut.len(), 256);
        assert_eq!(lut[0].w, 0.0);
        assert_eq!(lut[255].w, 1.0);
    }

    #[test]
    fn bone_is_binary() {
        let lut = bone(256);
        assert_eq!(lut[0].w, 0.0);
        assert_eq!(lut[255].w, 1.0);
        assert!(lut.iter().all(|c| c.w == 0.0 || c.w == 1.0));
    }

    #[test]
    fn shells_alpha_is_sparse() {
        let lut = shells(4096);
        assert_eq!(lut[0].w, 0.0);
        assert!(lut[4095].w > 0.0);
    }
}
