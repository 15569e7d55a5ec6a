use crate::{
    color::{self, RGBA},
    device::{Device, Tex1D},
    volumetric::VoxelFormat,
    RenderError,
};

/// Pre-classified transfer function: a 1-D RGBA texture with linear
/// filtering and clamp addressing, 256 entries for 8-bit volumes and
/// 4096 for 16-bit ones. Alpha is opacity at the reference step.
pub struct TransferFunction {
    tex: Tex1D,
}

impl TransferFunction {
    /// Neutral grayscale ramp used until the host supplies a real table.
    pub fn identity(device: &Device, format: VoxelFormat) -> Result<TransferFunction, RenderError> {
        let len = format.tf_len();
        let lut = (0..len)
            .map(|i| {
                let s = i as f32 / (len - 1) as f32;
                color::new(s, s, s, s)
            })
            .collect();
        Ok(TransferFunction {
            tex: Tex1D::new(device, lut)?,
        })
    }

    /// Re-upload the table from `L` RGBA entries in `<0;1>`.
    ///
    /// The swap happens between launches, so a kernel only ever sees a fully
    /// bound table.
    pub fn recompute(&mut self, device: &Device, lut: &[RGBA]) -> Result<(), RenderError> {
        if lut.len() != self.tex.len() {
            return Err(RenderError::InvalidParameter(
                "transfer function length does not match the volume format",
            ));
        }
        self.tex = Tex1D::new(device, lut.to_vec())?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tex.len()
    }

    /// Host-side copy of the table, for the space-skipping collapse.
    pub fn entries(&self) -> &[RGBA] {
        self.tex.entries()
    }

    /// Classify a normalized scalar.
    pub fn classify(&self, s: f32) -> RGBA {
        self.tex.sample(s)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn identity_table_is_a_ramp() {
        let device = Device::new().unwrap();
        let tf = TransferFunction::identity(&device, VoxelFormat::U8).unwrap();

        assert_eq!(tf.len(), 256);
        assert_eq!(tf.classify(0.0).w, 0.0);
        assert_eq!(tf.classify(1.0).w, 1.0);
    }

    #[test]
    fn recompute_rejects_wrong_length() {
        let device = Device::new().unwrap();
        let mut tf = TransferFunction::identity(&device, VoxelFormat::U16).unwrap();

        assert_eq!(tf.len(), 4096);
        let short = vec![color::zero(); 256];
        assert!(tf.recompute(&device, &short).is_err());
    }

    #[test]
    fn recompute_swaps_table() {
        let device = Device::new().unwrap();
        let mut tf = TransferFunction::identity(&device, VoxelFormat::U8).unwrap();

        let red = vec![color::new(1.0, 0.0, 0.0, 1.0); 256];
        tf.recompute(&device, &red).unwrap();

        let c = tf.classify(0.5);
        assert_eq!(c.x, 1.0);
        assert_eq!(c.y, 0.0);
        assert_eq!(c.w, 1.0);
    }
}
