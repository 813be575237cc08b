//! Minimal offline example: build assets in memory, place two logos, and
//! write the flattened composite to disk.

use mockstudio::{rendering, AssetKind, MemoryRegistry, PlacementStore};

fn checkerboard(width: u32, height: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        if (x / 16 + y / 16) % 2 == 0 {
            image::Rgba(a)
        } else {
            image::Rgba(b)
        }
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Mockstudio - Offline Compositing Example\n");

    let registry = MemoryRegistry::new();
    registry.register_bytes(
        "shirt",
        AssetKind::Product,
        checkerboard(800, 600, [235, 235, 235, 255], [210, 210, 210, 255]),
    )?;
    registry.register_bytes(
        "logo",
        AssetKind::Logo,
        checkerboard(128, 64, [20, 20, 200, 255], [250, 200, 20, 255]),
    )?;

    let mut store = PlacementStore::new();

    // Chest placement: drag up and slightly left from the center
    let chest = store.add_layer("logo");
    store.begin_drag(chest, 500.0, 500.0);
    store.update_drag(420.0, 320.0, 1000.0, 1000.0);
    store.end_drag();

    // Sleeve tag: same artwork again, dragged aside and scaled down
    let sleeve = store.add_layer("logo");
    store.begin_drag(sleeve, 500.0, 500.0);
    store.update_drag(780.0, 520.0, 1000.0, 1000.0);
    store.end_drag();
    store.adjust_scale(sleeve, -1.0);
    store.adjust_scale(sleeve, -1.0);

    let composite =
        rendering::render_with_registry(&registry, "shirt", store.layers(), 1024, 1024, false)?;
    for warning in &composite.warnings {
        eprintln!("warning: {:?}", warning);
    }

    std::fs::write("composite.png", &composite.png_data)?;
    println!(
        "wrote composite.png ({}x{}, {} bytes)",
        composite.width,
        composite.height,
        composite.png_data.len()
    );
    Ok(())
}
