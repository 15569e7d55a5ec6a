//! The per-pixel ray-casting kernel.
//!
//! One algorithm, specialized at dispatch time over the flag set in
//! [`KernelConfig`]. On this backend the specialization is runtime branching;
//! the branches are uniform across a launch and predict perfectly.
//!
//! The kernel is pure and allocation-free. Rays that miss the probe box, and
//! rays degenerated by non-finite matrices, produce `(0,0,0,0)` and depth 0.

use nalgebra::{vector, Point3, Vector3};

use crate::{
    camera::CameraMatrices,
    color::{self, RGBA},
    common::BoundBox,
    device::Tex3D,
    jitter::JitterTable,
    tf::TransferFunction,
    volumetric::VolumeTextureView,
};

use super::options::{MipMode, RenderOptions};

/// Early-ray-termination threshold on accumulated opacity.
pub const ERT_THRESHOLD: f32 = 0.95;

// lighting only kicks in once a sample contributes visibly
const LIGHTING_ALPHA_MIN: f32 = 0.1;
// central-difference offset, in normalized texture coordinates
const GRADIENT_DELTA: f32 = 0.01;
const K_DIFFUSE: f32 = 0.8;
const K_SPECULAR: f32 = 0.8;
const SHININESS: f32 = 1000.0;

/// Flag set one kernel variant is dispatched for.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    pub early_ray_termination: bool,
    pub opacity_correction: bool,
    pub illumination: bool,
    pub jittering: bool,
    pub clip_plane: bool,
    pub clip_sphere: bool,
    pub sphere_as_probe: bool,
    pub space_skipping: bool,
    pub mip: MipMode,
    pub track_depth: bool,
}

impl KernelConfig {
    /// Resolve the renderer state into dispatch flags.
    ///
    /// Early termination is force-disabled in MIP modes, where a later sample
    /// can always still win. Space skipping requires a collapsed flag texture.
    pub fn resolve(opts: &RenderOptions, has_skip_tex: bool) -> KernelConfig {
        let sphere_as_probe = opts.roi_enabled && opts.spherical_roi;
        KernelConfig {
            early_ray_termination: opts.early_ray_termination && opts.mip_mode == MipMode::None,
            opacity_correction: opts.opacity_correction,
            illumination: opts.illumination,
            jittering: opts.jittering,
            clip_plane: opts.clip_plane_enabled,
            clip_sphere: opts.clip_sphere_enabled || sphere_as_probe,
            sphere_as_probe,
            space_skipping: opts.space_skipping && has_skip_tex,
            mip: opts.mip_mode,
            track_depth: opts.depth_precision.is_some(),
        }
    }
}

/// Argument list of one launch: flags, geometry, device constants and the
/// texture binds. Everything the kernel reads, nothing it writes.
pub struct KernelParams<'a> {
    pub config: KernelConfig,
    pub width: usize,
    pub height: usize,
    pub background: RGBA,
    /// Step distance along the ray, in object-space units.
    pub step: f32,
    pub vol_pos: Point3<f32>,
    pub vol_half: Vector3<f32>,
    /// Probe box; equals the volume box when no ROI is active.
    pub probe: BoundBox,
    pub light: Vector3<f32>,
    pub half_vec: Vector3<f32>,
    pub sphere_center: Point3<f32>,
    pub sphere_radius_sq: f32,
    pub plane_normal: Vector3<f32>,
    pub plane_dist: f32,
    pub constants: CameraMatrices,
    pub volume: VolumeTextureView<'a>,
    pub tf: &'a TransferFunction,
    pub jitter: &'a JitterTable,
    pub skip: Option<&'a Tex3D<u8>>,
}

impl KernelParams<'_> {
    fn texture_coord(&self, pos: &Point3<f32>) -> Vector3<f32> {
        (pos - self.vol_pos + self.vol_half).component_div(&(self.vol_half * 2.0))
    }

    // clipped side is the half space the plane normal points into:
    // normal . p >= distance. Rays cross the plane at tpnear; a ray running
    // against the normal (n.d < 0) is clipped before the crossing, a ray
    // running with it (n.d >= 0) after.
    fn plane_clips(&self, pos: &Point3<f32>) -> bool {
        self.plane_normal.dot(&pos.coords) >= self.plane_dist
    }

    fn sphere_clips(&self, pos: &Point3<f32>) -> Option<Vector3<f32>> {
        let to_pos = pos - self.sphere_center;
        let inside = to_pos.norm_squared() < self.sphere_radius_sq;
        let clipped = if self.config.sphere_as_probe {
            !inside
        } else {
            inside
        };
        if !clipped {
            return None;
        }
        let n = to_pos.try_normalize(0.0).unwrap_or_else(Vector3::z);
        // the probe surface faces inward
        Some(if self.config.sphere_as_probe { -n } else { n })
    }
}

fn intersect_sphere(
    origin: &Point3<f32>,
    direction: &Vector3<f32>,
    center: Point3<f32>,
    radius_sq: f32,
) -> Option<(f32, f32)> {
    // |o + t*d - c|^2 = r^2, with |d| = 1
    let oc = origin - center;
    let b = direction.dot(&oc);
    let c = oc.norm_squared() - radius_sq;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some((-b - sq, -b + sq))
}

fn blinn_phong(p: &KernelParams, src: &mut RGBA, tc: &Vector3<f32>, clip_normal: Option<Vector3<f32>>) {
    let d = GRADIENT_DELTA;
    // negative central difference: the normal points out of dense material
    let grad = vector![
        p.volume.sample(tc.x - d, tc.y, tc.z) - p.volume.sample(tc.x + d, tc.y, tc.z),
        p.volume.sample(tc.x, tc.y - d, tc.z) - p.volume.sample(tc.x, tc.y + d, tc.z),
        p.volume.sample(tc.x, tc.y, tc.z - d) - p.volume.sample(tc.x, tc.y, tc.z + d)
    ];

    let Some(mut n) = grad.try_normalize(0.0) else {
        return; // homogeneous neighbourhood, keep the classified color
    };

    // a sample right behind a clip surface lights like the surface itself
    if let Some(cn) = clip_normal {
        if let Some(blended) = (n * (1.0 - src.w) + cn * src.w).try_normalize(0.0) {
            n = blended;
        }
    }

    // Ka = 0
    let ldot = n.dot(&p.light).max(0.0);
    let mut rgb = src.xyz() * (K_DIFFUSE * ldot);

    let hdot = n.dot(&p.half_vec);
    if hdot > 0.0 {
        rgb += Vector3::repeat(K_SPECULAR * hdot.powf(SHININESS));
    }

    src.x = rgb.x;
    src.y = rgb.y;
    src.z = rgb.z;
}

/// Cast the ray for pixel `(x, y)`. Returns the RGBA bytes and the window
/// depth of the maximum alpha increment (0.0 when nothing was hit).
pub fn cast_ray(p: &KernelParams, x: usize, y: usize) -> ([u8; 4], f32) {
    let miss = ([0u8; 4], 0.0);

    let Some(ray) = p.constants.pixel_ray(x, y, p.width, p.height) else {
        return miss;
    };
    let Some((tnear, tfar)) = p.probe.intersect(&ray) else {
        return miss;
    };

    // align sampling depths across neighbouring rays
    let mut tnear = (tnear / p.step).floor() * p.step;
    if tnear < 0.0 {
        tnear = 0.0;
    }

    if p.config.clip_sphere
        && p.config.sphere_as_probe
        && intersect_sphere(&ray.origin, &ray.direction, p.sphere_center, p.sphere_radius_sq)
            .is_none()
    {
        return miss;
    }

    let mut dst = match p.config.mip {
        MipMode::None => color::zero(),
        MipMode::Max | MipMode::Min => p.background,
    };

    let mut pos = ray.point_from_t(tnear);
    if p.config.jittering {
        pos += p.jitter.fetch(y * p.width + x) * p.step;
    }

    let dir_step = ray.direction * p.step;
    let mut t = tnear;
    let mut prev_clip_normal: Option<Vector3<f32>> = None;
    let mut last_alpha = 0.0f32;
    let mut max_diff = 0.0f32;
    let mut max_diff_pos: Option<Point3<f32>> = None;

    loop {
        let this_clip = if p.config.clip_plane && p.plane_clips(&pos) {
            Some(p.plane_normal)
        } else if p.config.clip_sphere {
            p.sphere_clips(&pos)
        } else {
            None
        };

        if this_clip.is_none() {
            let tc = p.texture_coord(&pos);

            let skip = match (p.config.space_skipping, p.skip) {
                (true, Some(tex)) => tex.fetch(tc.x, tc.y, tc.z) != 0,
                _ => false,
            };

            if !skip {
                let s = p.volume.sample(tc.x, tc.y, tc.z);
                let mut src = p.tf.classify(s);

                match p.config.mip {
                    MipMode::Max => {
                        dst = dst.sup(&src);
                        dst.w = 1.0;
                    }
                    MipMode::Min => {
                        dst = dst.inf(&src);
                        dst.w = 1.0;
                    }
                    MipMode::None => {
                        if p.config.illumination && src.w > LIGHTING_ALPHA_MIN {
                            blinn_phong(p, &mut src, &tc, prev_clip_normal);
                        }
                        if p.config.opacity_correction {
                            src.w = 1.0 - (1.0 - src.w).powf(p.step);
                        }
                        // premultiply, then front-to-back
                        src.x *= src.w;
                        src.y *= src.w;
                        src.z *= src.w;
                        dst += src * (1.0 - dst.w);
                    }
                }

                if p.config.track_depth {
                    let diff = dst.w - last_alpha;
                    if diff > max_diff {
                        max_diff = diff;
                        max_diff_pos = Some(pos);
                    }
                    last_alpha = dst.w;
                }

                if p.config.early_ray_termination && dst.w > ERT_THRESHOLD {
                    break;
                }
            }
        }

        prev_clip_normal = this_clip;

        t += p.step;
        if t > tfar {
            break;
        }
        pos += dir_step;
    }

    let depth = match max_diff_pos {
        Some(hit) => p.constants.window_depth(&hit),
        None => 0.0,
    };

    (color::to_bytes(&dst), depth)
}
