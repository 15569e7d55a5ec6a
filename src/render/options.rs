use nalgebra::{point, vector, Point3, Vector2, Vector3};

use crate::{
    color::{self, RGBA},
    RenderError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipMode {
    #[default]
    None,
    Max,
    Min,
}

impl MipMode {
    pub fn from_index(i: u8) -> Result<MipMode, RenderError> {
        match i {
            0 => Ok(MipMode::None),
            1 => Ok(MipMode::Max),
            2 => Ok(MipMode::Min),
            _ => Err(RenderError::InvalidParameter("MIP mode outside {0, 1, 2}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPrecision {
    U8,
    U16,
    U32,
}

/// Clip plane in Hesse normal form: a point `p` lies on the plane when
/// `normal . p == distance`.
#[derive(Debug, Clone, Copy)]
pub struct ClipPlane {
    pub normal: Vector3<f32>,
    pub distance: f32,
}

impl Default for ClipPlane {
    fn default() -> ClipPlane {
        ClipPlane {
            normal: vector![0.0, 0.0, 1.0],
            distance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClipSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl Default for ClipSphere {
    fn default() -> ClipSphere {
        ClipSphere {
            center: point![0.0, 0.0, 0.0],
            radius: 1.0,
        }
    }
}

/// Axis-aligned region of interest; `size` is the full edge length per axis.
#[derive(Debug, Clone, Copy)]
pub struct Roi {
    pub center: Point3<f32>,
    pub size: Vector3<f32>,
}

/// Renderer state the dispatcher specializes the kernel over.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub resolution: Vector2<u16>,
    pub early_ray_termination: bool,
    pub opacity_correction: bool,
    pub illumination: bool,
    pub interpolation: bool,
    pub jittering: bool,
    pub clip_plane_enabled: bool,
    pub clip_sphere_enabled: bool,
    pub roi_enabled: bool,
    /// The ROI is a sphere and acts as the probe.
    pub spherical_roi: bool,
    pub space_skipping: bool,
    pub mip_mode: MipMode,
    /// Scales the sample count along each ray. Must stay positive.
    pub quality: f32,
    pub depth_precision: Option<DepthPrecision>,
    pub roi: Roi,
    pub clip_plane: ClipPlane,
    pub clip_sphere: ClipSphere,
    /// Handed through to the presentation layer for probe outlines.
    pub probe_color: RGBA,
    pub clip_color: RGBA,
    pub background: RGBA,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            resolution: vector![512, 512],
            early_ray_termination: true,
            opacity_correction: false,
            illumination: false,
            interpolation: true,
            jittering: false,
            clip_plane_enabled: false,
            clip_sphere_enabled: false,
            roi_enabled: false,
            spherical_roi: false,
            space_skipping: false,
            mip_mode: MipMode::None,
            quality: 1.0,
            depth_precision: None,
            roi: Roi {
                center: point![0.0, 0.0, 0.0],
                size: vector![1.0, 1.0, 1.0],
            },
            clip_plane: ClipPlane::default(),
            clip_sphere: ClipSphere::default(),
            probe_color: color::new(1.0, 1.0, 1.0, 1.0),
            clip_color: color::new(1.0, 1.0, 1.0, 1.0),
            background: color::zero(),
        }
    }
}

impl RenderOptions {
    pub fn builder() -> RenderOptionsBuilder {
        RenderOptionsBuilder {
            options: RenderOptions::default(),
        }
    }
}

pub struct RenderOptionsBuilder {
    options: RenderOptions,
}

macro_rules! builder_field {
    ($name:ident: $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.options.$name = value;
            self
        }
    };
}

impl RenderOptionsBuilder {
    builder_field!(resolution: Vector2<u16>);
    builder_field!(early_ray_termination: bool);
    builder_field!(opacity_correction: bool);
    builder_field!(illumination: bool);
    builder_field!(interpolation: bool);
    builder_field!(jittering: bool);
    builder_field!(clip_plane_enabled: bool);
    builder_field!(clip_sphere_enabled: bool);
    builder_field!(roi_enabled: bool);
    builder_field!(spherical_roi: bool);
    builder_field!(space_skipping: bool);
    builder_field!(mip_mode: MipMode);
    builder_field!(quality: f32);
    builder_field!(depth_precision: Option<DepthPrecision>);
    builder_field!(roi: Roi);
    builder_field!(clip_plane: ClipPlane);
    builder_field!(clip_sphere: ClipSphere);
    builder_field!(background: RGBA);

    /// Validating build; rejects non-positive quality and degenerate clip
    /// normals.
    pub fn build(self) -> Result<RenderOptions, RenderError> {
        if !(self.options.quality > 0.0) {
            return Err(RenderError::InvalidParameter("quality must be positive"));
        }
        if self.options.clip_plane.normal.norm_squared() == 0.0 {
            return Err(RenderError::InvalidParameter("clip plane normal is zero"));
        }
        Ok(self.options)
    }

    pub fn build_unchecked(self) -> RenderOptions {
        self.options
    }
}

/// The key -> value parameter surface exposed to the UI shell.
#[derive(Debug, Clone, Copy)]
pub enum RenderParam {
    /// SLICEINT
    SliceInterpolation(bool),
    /// LIGHTING
    Lighting(bool),
    /// OPCORR
    OpacityCorrection(bool),
    /// TERMINATEEARLY
    EarlyRayTermination(bool),
    /// MIP_MODE
    MipMode(MipMode),
    /// IS_ROI_USED
    UseRoi(bool),
    /// SPHERICAL_ROI
    SphericalRoi(bool),
    /// CLIP_MODE
    ClipMode(bool),
    /// QUALITY
    Quality(f32),
    Jittering(bool),
    SpaceSkipping(bool),
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn builder_sets_fields() {
        let opts = RenderOptions::builder()
            .resolution(vector![64, 32])
            .early_ray_termination(false)
            .mip_mode(MipMode::Max)
            .quality(2.0)
            .build()
            .unwrap();

        assert_eq!(opts.resolution, vector![64, 32]);
        assert!(!opts.early_ray_termination);
        assert_eq!(opts.mip_mode, MipMode::Max);
    }

    #[test]
    fn build_rejects_bad_quality() {
        assert!(RenderOptions::builder().quality(0.0).build().is_err());
        assert!(RenderOptions::builder().quality(f32::NAN).build().is_err());
    }

    #[test]
    fn mip_mode_from_index() {
        assert_eq!(MipMode::from_index(0).unwrap(), MipMode::None);
        assert_eq!(MipMode::from_index(2).unwrap(), MipMode::Min);
        assert!(MipMode::from_index(3).is_err());
    }
}
