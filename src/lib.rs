//! Mockstudio Compositing Engine
//!
//! A headless mockup-compositing engine API for Rust that provides a
//! high-level interface for placing graphic overlays on a product image,
//! flattening the arrangement into a deterministic PNG composite, and
//! handing the result to an external image-generation collaborator.
//!
//! # Features
//!
//! - **Percent-based placement**: layer positions are resolution independent,
//!   so a small interactive preview and a large final composite always agree
//! - **Remote Sink** (default): pushes finished composites to an HTTP
//!   generation endpoint; an offline echo sink is always available
//! - **Safe Defaults**: best-effort compositing with observable warnings,
//!   strict mode as an explicit opt-in
//!
//! # Example
//!
//! ```no_run
//! use mockstudio::{MemoryRegistry, PlacementStore, StudioConfig};
//! use mockstudio::rendering;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StudioConfig::default();
//! let registry = MemoryRegistry::new();
//! registry.register_bytes("tshirt", mockstudio::AssetKind::Product, std::fs::read("tshirt.png")?)?;
//! registry.register_bytes("logo", mockstudio::AssetKind::Logo, std::fs::read("logo.png")?)?;
//!
//! let mut store = PlacementStore::new();
//! let id = store.add_layer("logo");
//! store.adjust_scale(id, 1.0);
//!
//! let preset = &config.presets[0];
//! let composite = rendering::render_with_registry(
//!     &registry, "tshirt", store.layers(), preset.width, preset.height, false,
//! )?;
//! std::fs::write("composite.png", &composite.png_data)?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub use assets::{Asset, AssetKind, AssetRegistry, MemoryRegistry};

pub mod canvas;
pub use canvas::interaction::{InputEvent, InteractionController};
pub use canvas::placement::{LayerId, PlacedLayer, PlacementStore};

pub mod rendering;
pub use rendering::{Composite, RenderWarning};

pub mod sink;
pub use sink::{EchoSink, GeneratedImage, GenerationRequest, GenerationSink};

// HTTP-backed generation sink (feature-gated)
#[cfg(feature = "remote")]
pub mod remote;

// Async-friendly studio API (worker-backed abstraction)
pub mod async_api;
pub use async_api::{GeneratedMockup, Studio};

/// Configuration for the compositing engine
///
/// The defaults are chosen to be conservative: best-effort compositing
/// (overlay decode failures are reported as warnings, not errors) and the
/// four output presets the interactive studio historically shipped with.
/// The preset list is plain data; callers may inject any enumeration.
///
/// # Examples
///
/// ```
/// let cfg = mockstudio::StudioConfig::default();
/// assert_eq!(cfg.presets.len(), 4);
/// assert!(!cfg.strict_overlays);
/// ```
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Endpoint of the external generation service; `None` selects the
    /// offline echo sink
    pub endpoint: Option<String>,
    /// User agent string sent with generation requests
    pub user_agent: String,
    /// Timeout for generation requests in milliseconds
    pub timeout_ms: u64,
    /// Fail the whole render when an overlay fails to decode, instead of
    /// skipping the layer with a warning
    pub strict_overlays: bool,
    /// Output resolution presets, selectable by index
    pub presets: Vec<OutputPreset>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            user_agent: "Mockstudio/0.1".to_string(),
            timeout_ms: 30000,
            strict_overlays: false,
            presets: OutputPreset::default_set(),
        }
    }
}

/// One output resolution preset: an aspect-ratio label, explicit pixel
/// dimensions, and a resolution-tier label understood by the generation
/// collaborator (e.g. "1K", "2K").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPreset {
    pub aspect: String,
    pub width: u32,
    pub height: u32,
    pub tier: String,
}

impl OutputPreset {
    pub fn new(aspect: &str, width: u32, height: u32, tier: &str) -> Self {
        Self {
            aspect: aspect.to_string(),
            width,
            height,
            tier: tier.to_string(),
        }
    }

    /// The four presets the interactive studio shipped with. Callers are not
    /// limited to these; `StudioConfig::presets` accepts any list.
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::new("1:1", 1024, 1024, "1K"),
            Self::new("1:1", 2048, 2048, "2K"),
            Self::new("16:9", 2048, 1152, "2K"),
            Self::new("9:16", 1152, 2048, "2K"),
        ]
    }
}

/// Create a generation sink for the given configuration
///
/// Prefers the HTTP sink when the `remote` feature is enabled and an
/// endpoint is configured. Falls back to the offline `EchoSink`, which
/// returns the composite unchanged.
#[cfg(feature = "remote")]
pub fn new_sink(config: &StudioConfig) -> Result<Box<dyn GenerationSink>> {
    match config.endpoint {
        Some(_) => Ok(Box::new(remote::HttpSink::new(config)?)),
        None => Ok(Box::new(EchoSink::new())),
    }
}

#[cfg(not(feature = "remote"))]
pub fn new_sink(config: &StudioConfig) -> Result<Box<dyn GenerationSink>> {
    if config.endpoint.is_some() {
        return Err(Error::Config(
            "endpoint configured but the 'remote' feature is disabled".into(),
        ));
    }
    Ok(Box::new(EchoSink::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StudioConfig::default();
        assert!(config.endpoint.is_none());
        assert_eq!(config.presets.len(), 4);
        assert_eq!(config.presets[0].width, 1024);
        assert!(!config.strict_overlays);
    }

    #[test]
    fn test_preset_labels() {
        let presets = OutputPreset::default_set();
        assert_eq!(presets[1].tier, "2K");
        assert_eq!(presets[2].aspect, "16:9");
        assert_eq!(presets[3].height, 2048);
    }

    #[test]
    fn test_default_sink_is_offline() {
        let config = StudioConfig::default();
        let sink = new_sink(&config).expect("sink");
        let req = GenerationRequest {
            png_data: vec![1, 2, 3],
            instruction: String::new(),
            aspect: "1:1".into(),
            tier: "1K".into(),
        };
        let out = sink.generate(&req).expect("echo generate");
        assert_eq!(out.png_data, vec![1, 2, 3]);
    }
}
