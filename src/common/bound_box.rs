use nalgebra::{Point3, Vector3};

use super::Ray;

#[derive(Debug, Clone, Copy)]
pub struct BoundBox {
    pub lower: Point3<f32>,
    pub upper: Point3<f32>,
}

impl BoundBox {
    pub fn new(lower: Point3<f32>, upper: Point3<f32>) -> BoundBox {
        BoundBox { lower, upper }
    }

    pub fn from_center_half(center: Point3<f32>, half: Vector3<f32>) -> BoundBox {
        BoundBox {
            lower: center - half,
            upper: center + half,
        }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.lower, &self.upper)
    }

    pub fn half_size(&self) -> Vector3<f32> {
        (self.upper - self.lower) * 0.5
    }

    /// Slab test. Returns entry and exit parameters along the ray,
    /// or `None` if the ray misses or the box lies entirely behind the origin.
    pub fn intersect(&self, ray: &Ray) -> Option<(f32, f32)> {
        let t0x = (self.lower.x - ray.origin.x) / ray.direction.x;
        let t1x = (self.upper.x - ray.origin.x) / ray.direction.x;
        let t0y = (self.lower.y - ray.origin.y) / ray.direction.y;
        let t1y = (self.upper.y - ray.origin.y) / ray.direction.y;
        let t0z = (self.lower.z - ray.origin.z) / ray.direction.z;
        let t1z = (self.upper.z - ray.origin.z) / ray.direction.z;

        let tmin = f32::max(
            f32::max(f32::min(t0x, t1x), f32::min(t0y, t1y)),
            f32::min(t0z, t1z),
        );
        let tmax = f32::min(
            f32::min(f32::max(t0x, t1x), f32::max(t0y, t1y)),
            f32::max(t0z, t1z),
        );

        // box entirely behind the ray origin
        if tmax.is_sign_negative() {
            return None;
        }

        if tmin > tmax {
            return None;
        }

        Some((tmin, tmax))
    }
}
