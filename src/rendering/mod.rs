//! Raster pipeline: asset decoding and composite flattening
//!
//! The pipeline is two stages. `decode` resolves and decodes every asset a
//! render needs (concurrently, all joined before drawing starts), `compose`
//! is a pure function from decoded inputs to one flattened PNG. Keeping the
//! stages separate is what makes cancellation trivial: a superseded render
//! holds no shared state, so discarding its result is all there is to it.

pub mod compose;
pub mod decode;

use crate::assets::AssetRegistry;
use crate::canvas::placement::{LayerId, PlacedLayer};
use crate::error::{Error, Result};

/// The finished flattened image: lossless PNG bytes, the exact resolution
/// they were rendered at, and every warning the render accumulated.
#[derive(Debug, Clone)]
pub struct Composite {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
    pub warnings: Vec<RenderWarning>,
}

/// Non-fatal events observed during a render. Warnings never abort a
/// best-effort composite; they exist so callers and tests can see exactly
/// which layers were skipped and why.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderWarning {
    /// A layer's asset id no longer resolves; the layer was omitted.
    DanglingReference { layer: LayerId, asset_id: String },
    /// An overlay asset failed to decode; the referencing layers were
    /// omitted (fatal instead when strict mode is on).
    OverlayDecode { asset_id: String, reason: String },
}

/// Resolve, decode, and flatten in one call.
///
/// This is the whole §"generate" path up to the sink: look the base and
/// every referenced overlay up in `registry`, decode them concurrently,
/// then paint. Base failures abort with [`Error::ImageLoad`]; overlay
/// failures are warnings unless `strict` is set.
pub fn render_with_registry(
    registry: &dyn AssetRegistry,
    base_id: &str,
    layers: &[PlacedLayer],
    target_w: u32,
    target_h: u32,
    strict: bool,
) -> Result<Composite> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::InvalidContainer {
            width: target_w,
            height: target_h,
        });
    }
    let inputs = decode::load_render_inputs(registry, base_id, layers, strict)?;
    let mut composite = compose::render(&inputs.base, layers, &inputs.overlays, target_w, target_h)?;
    // Decode-stage warnings come first; paint-stage warnings follow
    let mut warnings = inputs.warnings;
    warnings.append(&mut composite.warnings);
    composite.warnings = warnings;
    Ok(composite)
}
