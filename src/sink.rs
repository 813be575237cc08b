//! Generation sink: the external image-synthesis collaborator
//!
//! The engine's job ends at a flattened PNG; turning that composite into a
//! photorealistic mockup is someone else's. This module defines the seam:
//! a request/response pair and the [`GenerationSink`] trait, plus an
//! offline [`EchoSink`] that simply hands the composite back, which keeps
//! the whole pipeline runnable in tests and air-gapped environments.

use crate::assets::AssetKind;
use crate::error::{Error, Result};

/// A finished composite plus the instructions the collaborator needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The flattened composite, PNG encoded.
    pub png_data: Vec<u8>,
    /// Free-form user instruction (surface treatment, lighting, ...).
    pub instruction: String,
    /// Aspect-ratio label of the requested output, e.g. "1:1".
    pub aspect: String,
    /// Resolution-tier label, e.g. "1K" or "2K".
    pub tier: String,
}

/// The collaborator's answer: one synthesized raster image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub png_data: Vec<u8>,
}

/// External generation collaborator. Calls are opaque and synchronous from
/// the caller's point of view; retry/backoff policy belongs to the
/// implementation behind the seam, never to the engine.
pub trait GenerationSink: Send + Sync {
    /// Turn a rough composite into a finished mockup. Failures are
    /// propagated as [`Error::Generation`] without retrying.
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Synthesize a brand-new asset from a text prompt.
    fn generate_asset(&self, prompt: &str, kind: AssetKind) -> Result<GeneratedImage>;
}

/// Offline sink: returns the composite unchanged and synthesizes flat
/// placeholder assets. Used when no endpoint is configured and throughout
/// the test suites.
#[derive(Debug, Default)]
pub struct EchoSink;

impl EchoSink {
    pub fn new() -> Self {
        EchoSink
    }
}

impl GenerationSink for EchoSink {
    fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        if request.png_data.is_empty() {
            return Err(Error::Generation("empty composite".into()));
        }
        Ok(GeneratedImage {
            png_data: request.png_data.clone(),
        })
    }

    fn generate_asset(&self, _prompt: &str, kind: AssetKind) -> Result<GeneratedImage> {
        // A neutral placeholder: white square for products, mid-grey for logos
        let shade = match kind {
            AssetKind::Product => 255u8,
            AssetKind::Logo => 128u8,
        };
        let img = image::RgbaImage::from_pixel(64, 64, image::Rgba([shade, shade, shade, 255]));
        let mut png_data = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(GeneratedImage { png_data })
    }
}
