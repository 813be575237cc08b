//! Integration tests for the compositing engine

use mockstudio::canvas::geometry;
use mockstudio::{
    rendering, AssetKind, Error, MemoryRegistry, PlacementStore, RenderWarning, StudioConfig,
};

fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn studio_registry() -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    registry
        .register_bytes("tshirt", AssetKind::Product, solid_png(800, 400, [200, 30, 30, 255]))
        .unwrap();
    registry
        .register_bytes("logo", AssetKind::Logo, solid_png(200, 100, [20, 20, 220, 255]))
        .unwrap();
    registry
}

#[test]
fn drag_then_render_reproduces_the_preview_layout() {
    let registry = studio_registry();
    let mut store = PlacementStore::new();
    let id = store.add_layer("logo");

    // Preview container is 1000x1000; drag the layer 100px right
    store.begin_drag(id, 500.0, 500.0);
    store.update_drag(600.0, 500.0, 1000.0, 1000.0);
    store.end_drag();

    // Render at a different resolution; the layer center must land at the
    // same relative position (60%, 50%)
    let composite =
        rendering::render_with_registry(&registry, "tshirt", store.layers(), 2048, 2048, false)
            .unwrap();
    assert!(composite.warnings.is_empty());

    let img = image::load_from_memory(&composite.png_data).unwrap().to_rgba8();
    let (cx, cy) = geometry::to_pixels(60.0, 50.0, 2048.0, 2048.0);
    assert_eq!(img.get_pixel(cx as u32, cy as u32).0, [20, 20, 220, 255]);
    // The old center is base-colored again
    assert_eq!(img.get_pixel(1024, 1024).0, [200, 30, 30, 255]);
}

#[test]
fn removing_an_asset_leaves_a_skippable_dangling_layer() {
    let registry = studio_registry();
    let mut store = PlacementStore::new();
    store.add_layer("logo");
    store.add_layer("logo");

    registry.remove("logo");

    let composite =
        rendering::render_with_registry(&registry, "tshirt", store.layers(), 512, 512, false)
            .unwrap();
    // One warning per dangling layer; the composite itself succeeds
    assert_eq!(composite.warnings.len(), 2);
    assert!(composite
        .warnings
        .iter()
        .all(|w| matches!(w, RenderWarning::DanglingReference { asset_id, .. } if asset_id == "logo")));
}

#[test]
fn render_fails_cleanly_without_a_base() {
    let registry = MemoryRegistry::new();
    let store = PlacementStore::new();
    let err = rendering::render_with_registry(&registry, "tshirt", store.layers(), 512, 512, false)
        .unwrap_err();
    assert!(matches!(err, Error::ImageLoad(_)));
}

#[test]
fn render_rejects_zero_targets_before_loading_anything() {
    let registry = MemoryRegistry::new(); // would fail lookup if it got that far
    let store = PlacementStore::new();
    let err = rendering::render_with_registry(&registry, "tshirt", store.layers(), 0, 512, false)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidContainer { width: 0, .. }));
}

#[test]
fn every_default_preset_renders_at_its_exact_resolution() {
    let registry = studio_registry();
    let mut store = PlacementStore::new();
    store.add_layer("logo");

    for preset in StudioConfig::default().presets {
        let composite = rendering::render_with_registry(
            &registry,
            "tshirt",
            store.layers(),
            preset.width,
            preset.height,
            false,
        )
        .unwrap();
        assert_eq!((composite.width, composite.height), (preset.width, preset.height));
        let img = image::load_from_memory(&composite.png_data).unwrap();
        assert_eq!((img.width(), img.height()), (preset.width, preset.height));
    }
}

#[test]
fn scaled_layer_footprint_matches_the_sizing_rule() {
    // 2048 target, 200x100 overlay, scale 2.0 -> 614.4 x 307.2 footprint
    let registry = studio_registry();
    let mut store = PlacementStore::new();
    let id = store.add_layer("logo");
    for _ in 0..10 {
        store.adjust_scale(id, 1.0);
    }
    assert!((store.layer(id).unwrap().scale - 2.0).abs() < 1e-5);

    let composite =
        rendering::render_with_registry(&registry, "tshirt", store.layers(), 2048, 2048, false)
            .unwrap();
    let img = image::load_from_memory(&composite.png_data).unwrap().to_rgba8();

    // Horizontal extent: center 1024, half width 307.2
    assert_eq!(img.get_pixel(1024 - 300, 1024).0, [20, 20, 220, 255]);
    assert_eq!(img.get_pixel(1024 + 300, 1024).0, [20, 20, 220, 255]);
    assert_ne!(img.get_pixel(1024 - 312, 1024).0, [20, 20, 220, 255]);
    // Vertical extent: half height 153.6
    assert_eq!(img.get_pixel(1024, 1024 - 150).0, [20, 20, 220, 255]);
    assert_ne!(img.get_pixel(1024, 1024 + 160).0, [20, 20, 220, 255]);
}
