use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{point, vector, Matrix4};

use volcast::{
    device::Device,
    premade::{sphere_volume, transfer_functions},
    render::{MipMode, RenderOptions},
    PerspectiveCamera, Renderer,
};

const RESOLUTION: u16 = 256;

fn to_cols(m: Matrix4<f32>) -> [f32; 16] {
    m.as_slice().try_into().unwrap()
}

fn bench_renderer(options: RenderOptions) -> (Renderer, [f32; 16], [f32; 16]) {
    let device = Device::new().unwrap();
    let desc = sphere_volume(128);
    let mut renderer = Renderer::new(device, &desc, options).unwrap();
    renderer
        .set_transfer_function(&transfer_functions::grayscale(256))
        .unwrap();

    let camera = PerspectiveCamera::new(point![0.0, 0.0, 4.0], vector![0.0, 0.0, -1.0]);
    (
        renderer,
        to_cols(camera.view_matrix()),
        to_cols(camera.projection_matrix(1.0)),
    )
}

fn composite_frame(c: &mut Criterion) {
    let options = RenderOptions::builder()
        .resolution(vector![RESOLUTION, RESOLUTION])
        .early_ray_termination(true)
        .build_unchecked();
    let (mut renderer, mv, proj) = bench_renderer(options);

    c.bench_function("composite 256x256 sphere", |b| {
        b.iter(|| renderer.render(&mv, &proj));
    });
}

fn mip_frame(c: &mut Criterion) {
    let options = RenderOptions::builder()
        .resolution(vector![RESOLUTION, RESOLUTION])
        .mip_mode(MipMode::Max)
        .build_unchecked();
    let (mut renderer, mv, proj) = bench_renderer(options);

    c.bench_function("mip 256x256 sphere", |b| {
        b.iter(|| renderer.render(&mv, &proj));
    });
}

fn skipping_frame(c: &mut Criterion) {
    let options = RenderOptions::builder()
        .resolution(vector![RESOLUTION, RESOLUTION])
        .space_skipping(true)
        .build_unchecked();
    let (mut renderer, mv, proj) = bench_renderer(options);

    c.bench_function("space skipping 256x256 sphere", |b| {
        b.iter(|| renderer.render(&mv, &proj));
    });
}

criterion_group!(benches, composite_frame, mip_frame, skipping_frame);
criterion_main!(benches);
