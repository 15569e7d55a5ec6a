use nalgebra::{vector, Vector3};

use crate::{
    camera::CameraMatrices,
    color::RGBA,
    common::BoundBox,
    device::Device,
    jitter::JitterTable,
    tf::TransferFunction,
    volumetric::{SkipGrid, VolumeDesc, VolumeStore},
    RenderError,
};

use super::{
    dispatch,
    framebuffer::FrameBuffer,
    kernel::{KernelConfig, KernelParams},
    options::{ClipPlane, ClipSphere, RenderOptions, RenderParam, Roi},
};

/// Host-side orchestrator. Owns every device resource and runs the
/// single-threaded cooperative frame sequence: refresh dirty textures,
/// upload matrices, pick the kernel variant, launch, expose the framebuffer.
pub struct Renderer {
    device: Device,
    volume: VolumeStore,
    skip: Option<SkipGrid>,
    tf: TransferFunction,
    jitter: JitterTable,
    framebuffer: FrameBuffer,
    options: RenderOptions,
    frame: usize,
    /// Scalar-grid diagonal, in voxels; drives the sample count.
    diagonal_voxels: f32,
    /// Sticky failure. While set, every frame is a no-op black frame that
    /// reports the stored error, until a reconfiguration succeeds.
    sticky_error: Option<RenderError>,
    skip_dirty: bool,
}

impl Renderer {
    pub fn new(
        device: Device,
        desc: &VolumeDesc,
        options: RenderOptions,
    ) -> Result<Renderer, RenderError> {
        desc.validate()?;

        let mut volume = VolumeStore::build(&device, desc)?;
        volume.set_interpolation(options.interpolation);

        let skip = SkipGrid::build(desc);
        let tf = TransferFunction::identity(&device, desc.format)?;
        let jitter = JitterTable::new(&device)?;
        let framebuffer = FrameBuffer::new(
            &device,
            options.resolution.x as usize,
            options.resolution.y as usize,
            options.depth_precision,
        )?;

        Ok(Renderer {
            device,
            volume,
            skip,
            tf,
            jitter,
            framebuffer,
            options,
            frame: 0,
            diagonal_voxels: desc.diagonal_voxels(),
            sticky_error: None,
            skip_dirty: true,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn is_viable(&self) -> bool {
        self.sticky_error.is_none()
    }

    /// Apply one key of the parameter surface.
    pub fn set_parameter(&mut self, param: RenderParam) -> Result<(), RenderError> {
        match param {
            RenderParam::SliceInterpolation(on) => {
                self.options.interpolation = on;
                // rebinds the volume sampler, the texture data is unchanged
                self.volume.set_interpolation(on);
            }
            RenderParam::Lighting(on) => self.options.illumination = on,
            RenderParam::OpacityCorrection(on) => self.options.opacity_correction = on,
            RenderParam::EarlyRayTermination(on) => self.options.early_ray_termination = on,
            RenderParam::MipMode(mode) => self.options.mip_mode = mode,
            RenderParam::UseRoi(on) => self.options.roi_enabled = on,
            RenderParam::SphericalRoi(on) => self.options.spherical_roi = on,
            RenderParam::ClipMode(on) => self.options.clip_plane_enabled = on,
            RenderParam::Quality(q) => {
                if !(q > 0.0) || !q.is_finite() {
                    return Err(RenderError::InvalidParameter("quality must be positive"));
                }
                self.options.quality = q;
            }
            RenderParam::Jittering(on) => self.options.jittering = on,
            RenderParam::SpaceSkipping(on) => self.options.space_skipping = on,
        }
        Ok(())
    }

    pub fn set_roi(&mut self, roi: Roi) {
        self.options.roi = roi;
    }

    pub fn set_clip_plane(&mut self, plane: ClipPlane) -> Result<(), RenderError> {
        let normal = plane
            .normal
            .try_normalize(0.0)
            .ok_or(RenderError::InvalidParameter("clip plane normal is zero"))?;
        self.options.clip_plane = ClipPlane {
            normal,
            distance: plane.distance,
        };
        Ok(())
    }

    pub fn set_clip_sphere(&mut self, sphere: ClipSphere) {
        self.options.clip_sphere = sphere;
        self.options.clip_sphere_enabled = true;
    }

    pub fn set_background(&mut self, background: RGBA) {
        self.options.background = background;
    }

    /// Re-upload the transfer function from `L` RGBA entries.
    /// Marks the skip grid for collapse before the next launch.
    pub fn set_transfer_function(&mut self, lut: &[RGBA]) -> Result<(), RenderError> {
        self.tf.recompute(&self.device, lut)?;
        self.skip_dirty = true;
        Ok(())
    }

    /// Reallocate the output surfaces. A refused allocation leaves the
    /// renderer non-viable until a later resize succeeds.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), RenderError> {
        match FrameBuffer::new(&self.device, width, height, self.options.depth_precision) {
            Ok(fb) => {
                self.framebuffer = fb;
                self.options.resolution = vector![width as u16, height as u16];
                self.sticky_error = None;
                Ok(())
            }
            Err(e) => {
                log::error!("framebuffer resize to {width}x{height} failed: {e}");
                let e = RenderError::from(e);
                self.sticky_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn set_depth_precision(
        &mut self,
        precision: Option<super::options::DepthPrecision>,
    ) -> Result<(), RenderError> {
        self.options.depth_precision = precision;
        let (w, h) = (self.framebuffer.width(), self.framebuffer.height());
        self.resize(w, h)
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn set_frame(&mut self, frame: usize) {
        self.frame = frame % self.volume.frame_count();
    }

    /// Step the volume animation, wrapping at the frame count.
    pub fn advance_frame(&mut self) {
        self.frame = (self.frame + 1) % self.volume.frame_count();
    }

    /// Render one frame from column-major model-view and projection matrices.
    ///
    /// Failures on this path never panic and never poison the kernel: the
    /// frame degrades to a black image plus one log line, and the error is
    /// handed back. A [`RenderError::TransientDeviceError`] clears itself
    /// on the next frame; sticky errors repeat until reconfiguration.
    pub fn render(
        &mut self,
        model_view: &[f32; 16],
        projection: &[f32; 16],
    ) -> Result<(), RenderError> {
        if let Some(sticky) = &self.sticky_error {
            self.framebuffer.clear();
            log::warn!("renderer not viable, skipping frame: {sticky}");
            return Err(sticky.clone());
        }

        let Some(constants) = CameraMatrices::from_columns(model_view, projection) else {
            self.framebuffer.clear();
            let err = RenderError::TransientDeviceError("singular model-view-projection");
            log::warn!("{err}, skipping frame");
            return Err(err);
        };

        if self.options.space_skipping && self.skip_dirty {
            if let Some(grid) = self.skip.as_mut() {
                match grid.refresh(&self.device, self.tf.entries()) {
                    Ok(()) => self.skip_dirty = false,
                    // transient: render without skipping, retry next frame
                    Err(e) => log::warn!("skip grid collapse failed: {e}"),
                }
            }
        }

        let vol_box = self.volume.bound_box();
        let probe = if self.options.roi_enabled && !self.options.spherical_roi {
            BoundBox::from_center_half(self.options.roi.center, self.options.roi.size * 0.5)
        } else {
            vol_box
        };

        let sphere = if self.options.roi_enabled && self.options.spherical_roi {
            ClipSphere {
                center: self.options.roi.center,
                radius: self.options.roi.size.x * 0.5,
            }
        } else {
            self.options.clip_sphere
        };

        let num_slices = (self.options.quality * self.diagonal_voxels).max(1.0) as usize;
        let step = vol_box.half_size().norm() * 2.0 / num_slices as f32;

        // headlight: light at the eye, so the half vector collapses onto it
        let light = -constants.view_direction().unwrap_or_else(Vector3::z);

        let config = KernelConfig::resolve(
            &self.options,
            self.skip
                .as_ref()
                .and_then(|g| g.texture())
                .is_some(),
        );

        let params = KernelParams {
            config,
            width: self.framebuffer.width(),
            height: self.framebuffer.height(),
            background: self.options.background,
            step,
            vol_pos: vol_box.center(),
            vol_half: vol_box.half_size(),
            probe,
            light,
            half_vec: light,
            sphere_center: sphere.center,
            sphere_radius_sq: sphere.radius * sphere.radius,
            plane_normal: self.options.clip_plane.normal,
            plane_dist: self.options.clip_plane.distance,
            constants,
            volume: self.volume.bind(self.frame),
            tf: &self.tf,
            jitter: &self.jitter,
            skip: if config.space_skipping {
                self.skip.as_ref().and_then(|g| g.texture())
            } else {
                None
            },
        };

        dispatch::launch(&params, &mut self.framebuffer);

        Ok(())
    }
}
