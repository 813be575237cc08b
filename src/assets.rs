//! Asset model and the registry seam to the external asset store
//!
//! The engine never owns assets: it reads them by id through the
//! [`AssetRegistry`] trait and treats a missing id as "render nothing for
//! this layer". [`MemoryRegistry`] is the in-process reference
//! implementation used by the facade, the CLI, and the test suites;
//! registering and removing assets happens on the concrete type, not the
//! trait, mirroring the fact that asset management is external to the core.

use std::collections::HashMap;
use std::sync::Mutex;

use base64::Engine as Base64Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category of an asset: the background it all composites onto, or an
/// overlay graphic placed on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Product,
    Logo,
}

/// One immutable image asset: raw encoded raster bytes plus the natural
/// pixel dimensions declared at registration time.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub data: Vec<u8>,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// Read-only lookup of assets by id. The core never mutates the registry.
pub trait AssetRegistry: Send + Sync {
    fn get(&self, id: &str) -> Option<Asset>;
}

/// In-memory registry guarded by a mutex, suitable for a single editing
/// session and for tests.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: Mutex<HashMap<String, Asset>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset with caller-declared dimensions. No validation is
    /// performed; an undecodable or zero-sized asset surfaces later as an
    /// image-load failure when it is actually needed.
    pub fn register(&self, asset: Asset) {
        let mut g = self.inner.lock().unwrap();
        g.insert(asset.id.clone(), asset);
    }

    /// Insert encoded raster bytes, probing the natural dimensions from the
    /// image header.
    pub fn register_bytes(&self, id: &str, kind: AssetKind, data: Vec<u8>) -> Result<()> {
        let (natural_width, natural_height) = probe_dimensions(&data)
            .map_err(|e| Error::ImageLoad(format!("asset '{}': {}", id, e)))?;
        self.register(Asset {
            id: id.to_string(),
            kind,
            data,
            natural_width,
            natural_height,
        });
        Ok(())
    }

    /// Insert an asset supplied as a `data:<mime>;base64,...` URL, the way
    /// the interactive studio uploads them.
    pub fn register_data_url(&self, id: &str, kind: AssetKind, data_url: &str) -> Result<()> {
        let data = decode_data_url(data_url)?;
        self.register_bytes(id, kind, data)
    }

    /// Remove an asset by id; layers referencing it become dangling and are
    /// skipped at paint time.
    pub fn remove(&self, id: &str) {
        let mut g = self.inner.lock().unwrap();
        g.remove(id);
    }

    /// Ids of all registered assets of the given kind.
    pub fn ids_of(&self, kind: AssetKind) -> Vec<String> {
        let g = self.inner.lock().unwrap();
        let mut ids: Vec<String> = g
            .values()
            .filter(|a| a.kind == kind)
            .map(|a| a.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl AssetRegistry for MemoryRegistry {
    fn get(&self, id: &str) -> Option<Asset> {
        let g = self.inner.lock().unwrap();
        g.get(id).cloned()
    }
}

// Header-only probe; never decodes pixel data
fn probe_dimensions(data: &[u8]) -> std::result::Result<(u32, u32), image::ImageError> {
    image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
}

/// Strip the `data:<mime>;base64,` prefix and decode the payload.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url
        .split_once(',')
        .map(|(_, p)| p)
        .ok_or_else(|| Error::Other("malformed data URL: missing ',' separator".into()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::Other(format!("malformed data URL payload: {}", e)))
}

/// Encode raw bytes as a base64 data URL with the given mime type.
pub fn encode_data_url(mime: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}
