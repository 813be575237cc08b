use criterion::{criterion_group, criterion_main, Criterion};

use mockstudio::{rendering, AssetKind, MemoryRegistry, PlacedLayer};

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn registry() -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    registry
        .register_bytes("base", AssetKind::Product, gradient_png(640, 480))
        .expect("base");
    registry
        .register_bytes("logo", AssetKind::Logo, gradient_png(96, 96))
        .expect("logo");
    registry
}

fn layers(count: u64, rotation: f32) -> Vec<PlacedLayer> {
    (0..count)
        .map(|i| PlacedLayer {
            id: i,
            asset_id: "logo".to_string(),
            x: 20.0 + (i as f32) * 15.0,
            y: 35.0 + (i as f32) * 8.0,
            scale: 1.0 + (i as f32) * 0.1,
            rotation,
        })
        .collect()
}

fn bench_axis_aligned_composite(c: &mut Criterion) {
    let registry = registry();
    let layers = layers(4, 0.0);
    c.bench_function("compose_512_axis_aligned", |b| {
        b.iter(|| rendering::render_with_registry(&registry, "base", &layers, 512, 512, false).unwrap())
    });
}

fn bench_rotated_composite(c: &mut Criterion) {
    let registry = registry();
    let layers = layers(4, 37.0);
    c.bench_function("compose_512_rotated", |b| {
        b.iter(|| rendering::render_with_registry(&registry, "base", &layers, 512, 512, false).unwrap())
    });
}

fn bench_high_resolution_composite(c: &mut Criterion) {
    let registry = registry();
    let layers = layers(2, 0.0);
    c.bench_function("compose_2048", |b| {
        b.iter(|| {
            rendering::render_with_registry(&registry, "base", &layers, 2048, 2048, false).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_axis_aligned_composite,
    bench_rotated_composite,
    bench_high_resolution_composite
);
criterion_main!(benches);
