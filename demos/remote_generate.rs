//! Push a composite through a real generation endpoint (feature: `remote`).
//!
//! Run with:
//!   MOCKSTUDIO_ENDPOINT=https://example.invalid/generate \
//!   cargo run --example remote_generate --features remote

use mockstudio::{rendering, AssetKind, MemoryRegistry, PlacementStore};
use mockstudio::{GenerationRequest, GenerationSink, StudioConfig};

fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Ok(endpoint) = std::env::var("MOCKSTUDIO_ENDPOINT") else {
        eprintln!("set MOCKSTUDIO_ENDPOINT to a generation endpoint URL to run this example");
        return Ok(());
    };

    let config = StudioConfig {
        endpoint: Some(endpoint),
        ..Default::default()
    };
    let preset = config.presets[0].clone();

    let registry = MemoryRegistry::new();
    registry.register_bytes("cap", AssetKind::Product, solid_png(500, 400, [60, 80, 140, 255]))?;
    registry.register_bytes("logo", AssetKind::Logo, solid_png(100, 100, [255, 255, 255, 255]))?;

    let mut store = PlacementStore::new();
    let id = store.add_layer("logo");
    store.begin_drag(id, 250.0, 250.0);
    store.update_drag(250.0, 190.0, 500.0, 500.0);
    store.end_drag();

    let composite = rendering::render_with_registry(
        &registry,
        "cap",
        store.layers(),
        preset.width,
        preset.height,
        false,
    )?;

    let sink = mockstudio::new_sink(&config)?;
    let generated = sink.generate(&GenerationRequest {
        png_data: composite.png_data,
        instruction: "embroidered logo, studio lighting".into(),
        aspect: preset.aspect.clone(),
        tier: preset.tier.clone(),
    })?;

    std::fs::write("generated.png", &generated.png_data)?;
    println!("wrote generated.png ({} bytes)", generated.png_data.len());
    Ok(())
}
