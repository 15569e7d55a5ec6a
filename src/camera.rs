use nalgebra::{point, Matrix4, Perspective3, Point3, Vector3, Vector4};

use crate::common::Ray;

/// Per-launch device constants: the model-view-projection matrix and its inverse.
///
/// The inverse un-projects pixel rays, the forward matrix projects object-space
/// positions back to window depth.
#[derive(Debug, Clone, Copy)]
pub struct CameraMatrices {
    pub mvp: Matrix4<f32>,
    pub inv_mvp: Matrix4<f32>,
}

impl CameraMatrices {
    /// Build from column-major model-view and projection matrices,
    /// the layout the GL side hands over.
    ///
    /// Returns `None` when the combined matrix is singular.
    pub fn from_columns(model_view: &[f32; 16], projection: &[f32; 16]) -> Option<CameraMatrices> {
        let mv = Matrix4::from_column_slice(model_view);
        let proj = Matrix4::from_column_slice(projection);
        Self::from_matrices(&mv, &proj)
    }

    pub fn from_matrices(
        model_view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Option<CameraMatrices> {
        let mvp = projection * model_view;
        let inv_mvp = mvp.try_inverse()?;
        Some(CameraMatrices { mvp, inv_mvp })
    }

    fn unproject(&self, u: f32, v: f32, z: f32) -> Option<Point3<f32>> {
        let clip = self.inv_mvp * Vector4::new(u, v, z, 1.0);
        if clip.w == 0.0 || !clip.w.is_finite() {
            return None;
        }
        Some(point![clip.x / clip.w, clip.y / clip.w, clip.z / clip.w])
    }

    pub fn ndc_ray(&self, u: f32, v: f32) -> Option<Ray> {
        let near = self.unproject(u, v, -1.0)?;
        let far = self.unproject(u, v, 1.0)?;
        let ray = Ray::new(near, (far - near).normalize());
        ray.is_finite().then_some(ray)
    }

    /// Ray through pixel `(x, y)` of a `width x height` viewport.
    pub fn pixel_ray(&self, x: usize, y: usize, width: usize, height: usize) -> Option<Ray> {
        let u = 2.0 * x as f32 / width as f32 - 1.0;
        let v = 2.0 * y as f32 / height as f32 - 1.0;
        self.ndc_ray(u, v)
    }

    /// View direction at the image center; the headlight vectors derive from it.
    pub fn view_direction(&self) -> Option<Vector3<f32>> {
        self.ndc_ray(0.0, 0.0).map(|r| r.direction)
    }

    /// Window-space depth of an object-space position, mapped to `<0;1>`.
    pub fn window_depth(&self, pos: &Point3<f32>) -> f32 {
        let clip = self.mvp * pos.to_homogeneous();
        if clip.w == 0.0 || !clip.w.is_finite() {
            return 0.0;
        }
        let ndc_z = clip.z / clip.w;
        if !ndc_z.is_finite() {
            return 0.0;
        }
        (ndc_z * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

// up vector = 0,1,0
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub direction: Vector3<f32>,
    pub fov_y: f32, // vertical field of view, in degrees
    pub znear: f32,
    pub zfar: f32,
}

impl PerspectiveCamera {
    pub fn new(position: Point3<f32>, direction: Vector3<f32>) -> PerspectiveCamera {
        PerspectiveCamera {
            position,
            direction: direction.normalize(),
            fov_y: 60.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.direction;
        Matrix4::look_at_rh(&self.position, &target, &Vector3::y())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        Perspective3::new(aspect, self.fov_y.to_radians(), self.znear, self.zfar).to_homogeneous()
    }

    pub fn matrices(&self, aspect: f32) -> Option<CameraMatrices> {
        CameraMatrices::from_matrices(&self.view_matrix(), &self.projection_matrix(aspect))
    }
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use super::*;

    fn looking_down_z() -> CameraMatrices {
        let camera = PerspectiveCamera::new(point![0.0, 0.0, 5.0], vector![0.0, 0.0, -1.0]);
        camera.matrices(1.0).unwrap()
    }

    #[test]
    fn center_ray_matches_view_direction() {
        let matrices = looking_down_z();
        let ray = matrices.ndc_ray(0.0, 0.0).unwrap();

        assert!((ray.direction - vector![0.0, 0.0, -1.0]).norm() < 1e-4);
    }

    #[test]
    fn corner_rays_diverge() {
        let matrices = looking_down_z();
        let left = matrices.ndc_ray(-1.0, 0.0).unwrap();
        let right = matrices.ndc_ray(1.0, 0.0).unwrap();

        assert!(left.direction.x < 0.0);
        assert!(right.direction.x > 0.0);
    }

    #[test]
    fn window_depth_orders_points() {
        let matrices = looking_down_z();
        let near = matrices.window_depth(&point![0.0, 0.0, 2.0]);
        let far = matrices.window_depth(&point![0.0, 0.0, -2.0]);

        assert!(near < far);
        assert!((0.0..=1.0).contains(&near));
        assert!((0.0..=1.0).contains(&far));
    }

    #[test]
    fn singular_matrices_are_rejected() {
        let zeros = [0.0f32; 16];
        assert!(CameraMatrices::from_columns(&zeros, &zeros).is_none());
    }
}
