use nalgebra::{vector, Vector4};

pub type RGBA = Vector4<f32>;

pub fn new(r: f32, g: f32, b: f32, a: f32) -> RGBA {
    vector![r, g, b, a]
}

pub fn zero() -> RGBA {
    vector![0.0, 0.0, 0.0, 0.0]
}

pub fn mono(v: f32, opacity: f32) -> RGBA {
    vector![v, v, v, opacity]
}

/// Clamp components to `<0;1>` and quantize to bytes, rounding to nearest.
pub fn to_bytes(color: &RGBA) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(color.x), q(color.y), q(color.z), q(color.w)]
}
