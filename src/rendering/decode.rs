//! Concurrent asset decoding for the rasterizer
//!
//! Every asset one render needs is decoded before any drawing happens:
//! footprint and position math require natural dimensions, so the composite
//! stage must never wait on a decode. Loads are independent of each other
//! and fan out over a small worker pool; the pool is joined before this
//! module returns.

use std::collections::{BTreeSet, HashMap};
use std::sync::mpsc;

use image::RgbaImage;

use crate::assets::AssetRegistry;
use crate::canvas::placement::PlacedLayer;
use crate::error::{Error, Result};
use crate::rendering::RenderWarning;

/// A decoded raster: RGBA8 pixels plus the natural dimensions the
/// placement math uses.
#[derive(Debug, Clone)]
pub struct DecodedAsset {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

/// Decode encoded raster bytes (PNG/JPEG/WebP) into RGBA8.
pub fn decode_image(data: &[u8]) -> Result<DecodedAsset> {
    let img = image::load_from_memory(data).map_err(|e| Error::ImageLoad(e.to_string()))?;
    let pixels = img.to_rgba8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::ImageLoad("image has zero dimensions".into()));
    }
    Ok(DecodedAsset {
        width,
        height,
        pixels,
    })
}

/// Everything the compose stage needs for one render.
#[derive(Debug)]
pub struct RenderInputs {
    pub base: DecodedAsset,
    /// Successfully decoded overlays by asset id. A layer whose id is
    /// absent here is painted as nothing.
    pub overlays: HashMap<String, DecodedAsset>,
    pub warnings: Vec<RenderWarning>,
}

/// Resolve and decode the base asset and every overlay the layer list
/// references.
///
/// The base must resolve, decode, and have nonzero natural dimensions, or
/// the whole render fails. Overlays are best-effort: an id the registry no
/// longer knows is simply left out (the paint loop reports the dangling
/// layers), and a decode failure becomes an [`RenderWarning::OverlayDecode`]
/// unless `strict` is set.
pub fn load_render_inputs(
    registry: &dyn AssetRegistry,
    base_id: &str,
    layers: &[PlacedLayer],
    strict: bool,
) -> Result<RenderInputs> {
    let base_asset = registry
        .get(base_id)
        .ok_or_else(|| Error::ImageLoad(format!("base asset '{}' not found", base_id)))?;
    if base_asset.natural_width == 0 || base_asset.natural_height == 0 {
        return Err(Error::ImageLoad(format!(
            "base asset '{}' has zero natural dimensions",
            base_id
        )));
    }

    // Unique overlay ids, in a stable order. Ids the registry does not know
    // stay unresolved; the paint loop reports them per layer.
    let referenced: BTreeSet<&str> = layers.iter().map(|l| l.asset_id.as_str()).collect();
    let layers_reference_base = referenced.contains(base_id);
    let mut jobs: Vec<(String, Vec<u8>)> = Vec::new();
    for id in referenced {
        if id == base_id {
            continue; // decoded once below, shared with the overlay map
        }
        if let Some(asset) = registry.get(id) {
            jobs.push((id.to_string(), asset.data));
        }
    }
    jobs.push((base_id.to_string(), base_asset.data));

    let decoded = decode_all(jobs);

    let mut overlays = HashMap::new();
    let mut warnings = Vec::new();
    let mut base = None;
    for (id, result) in decoded {
        match result {
            Ok(asset) if id == base_id => base = Some(asset),
            Ok(asset) => {
                overlays.insert(id, asset);
            }
            Err(e) if id == base_id => {
                return Err(Error::ImageLoad(format!("base asset '{}': {}", id, e)));
            }
            Err(e) => {
                if strict {
                    return Err(Error::ImageLoad(format!("overlay asset '{}': {}", id, e)));
                }
                warnings.push(RenderWarning::OverlayDecode {
                    asset_id: id,
                    reason: e.to_string(),
                });
            }
        }
    }

    let base = base.ok_or_else(|| Error::ImageLoad(format!("base asset '{}' not decoded", base_id)))?;
    if layers_reference_base {
        overlays.insert(base_id.to_string(), base.clone());
    }
    Ok(RenderInputs {
        base,
        overlays,
        warnings,
    })
}

/// Decode a batch of assets on a small worker pool and join all results.
fn decode_all(jobs: Vec<(String, Vec<u8>)>) -> Vec<(String, Result<DecodedAsset>)> {
    if jobs.is_empty() {
        return Vec::new();
    }
    let workers = num_cpus::get().min(jobs.len()).max(1);
    let expected = jobs.len();

    let (job_tx, job_rx) = mpsc::channel::<(String, Vec<u8>)>();
    let (res_tx, res_rx) = mpsc::channel::<(String, Result<DecodedAsset>)>();
    for job in jobs {
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let job_rx = std::sync::Mutex::new(job_rx);
    std::thread::scope(|scope| {
        for _ in 0..workers {
            let res_tx = res_tx.clone();
            let job_rx = &job_rx;
            scope.spawn(move || loop {
                let job = {
                    let g = job_rx.lock().unwrap();
                    g.recv()
                };
                match job {
                    Ok((id, data)) => {
                        let decoded = decode_image(&data);
                        let _ = res_tx.send((id, decoded));
                    }
                    Err(_) => break,
                }
            });
        }
        drop(res_tx);
    });

    res_rx.iter().take(expected).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetKind, MemoryRegistry};
    use crate::canvas::placement::PlacementStore;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn junk_asset(id: &str, kind: AssetKind) -> Asset {
        Asset {
            id: id.to_string(),
            kind,
            data: vec![0xde, 0xad, 0xbe, 0xef],
            natural_width: 10,
            natural_height: 10,
        }
    }

    #[test]
    fn missing_base_fails() {
        let reg = MemoryRegistry::new();
        let err = load_render_inputs(&reg, "nope", &[], false).unwrap_err();
        assert!(matches!(err, Error::ImageLoad(_)));
    }

    #[test]
    fn zero_dimension_base_fails_before_decoding() {
        let reg = MemoryRegistry::new();
        reg.register(Asset {
            id: "flat".into(),
            kind: AssetKind::Product,
            data: png(4, 4),
            natural_width: 0,
            natural_height: 4,
        });
        let err = load_render_inputs(&reg, "flat", &[], false).unwrap_err();
        assert!(matches!(err, Error::ImageLoad(_)));
    }

    #[test]
    fn undecodable_base_fails() {
        let reg = MemoryRegistry::new();
        reg.register(junk_asset("base", AssetKind::Product));
        let err = load_render_inputs(&reg, "base", &[], false).unwrap_err();
        assert!(matches!(err, Error::ImageLoad(_)));
    }

    #[test]
    fn undecodable_overlay_is_a_warning() {
        let reg = MemoryRegistry::new();
        reg.register_bytes("base", AssetKind::Product, png(8, 8)).unwrap();
        reg.register(junk_asset("bad-logo", AssetKind::Logo));

        let mut store = PlacementStore::new();
        store.add_layer("bad-logo");

        let inputs = load_render_inputs(&reg, "base", store.layers(), false).unwrap();
        assert!(inputs.overlays.is_empty());
        assert_eq!(inputs.warnings.len(), 1);
        assert!(matches!(
            &inputs.warnings[0],
            RenderWarning::OverlayDecode { asset_id, .. } if asset_id == "bad-logo"
        ));
    }

    #[test]
    fn undecodable_overlay_is_fatal_in_strict_mode() {
        let reg = MemoryRegistry::new();
        reg.register_bytes("base", AssetKind::Product, png(8, 8)).unwrap();
        reg.register(junk_asset("bad-logo", AssetKind::Logo));

        let mut store = PlacementStore::new();
        store.add_layer("bad-logo");

        let err = load_render_inputs(&reg, "base", store.layers(), true).unwrap_err();
        assert!(matches!(err, Error::ImageLoad(_)));
    }

    #[test]
    fn duplicate_layer_references_decode_once() {
        let reg = MemoryRegistry::new();
        reg.register_bytes("base", AssetKind::Product, png(8, 8)).unwrap();
        reg.register_bytes("logo", AssetKind::Logo, png(2, 2)).unwrap();

        let mut store = PlacementStore::new();
        store.add_layer("logo");
        store.add_layer("logo");
        store.add_layer("logo");

        let inputs = load_render_inputs(&reg, "base", store.layers(), false).unwrap();
        assert_eq!(inputs.overlays.len(), 1);
        assert_eq!(inputs.overlays["logo"].width, 2);
        assert!(inputs.warnings.is_empty());
    }
}
