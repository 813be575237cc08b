//! Async-friendly studio session backed by a dedicated worker thread
//!
//! The worker thread owns all mutable session state: the placement store,
//! the in-memory asset registry, and the gallery of generated mockups.
//! Async callers send commands over a channel and await oneshot replies, so
//! every store mutation is serialized on one thread and drag
//! begin/update/end can never race.
//!
//! Rendering and generation never run on that thread: each request
//! snapshots the layer list and fans out to its own thread, keeping input
//! dispatch constant-time while decodes are in flight. Cancellation falls
//! out of the shape: when a caller drops the receiver of an in-flight
//! render (e.g. because a newer render superseded it), the render thread's
//! final `send` fails silently and the stale result is discarded without
//! ever touching shared state.

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use tokio::sync::oneshot;

use crate::assets::{AssetKind, MemoryRegistry};
use crate::canvas::placement::{LayerId, PlacedLayer, PlacementStore};
use crate::error::{Error, Result};
use crate::rendering::{self, Composite};
use crate::sink::{GenerationRequest, GenerationSink};
use crate::{OutputPreset, StudioConfig};

/// One generated mockup kept in the session gallery, together with the
/// layout snapshot that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedMockup {
    pub id: u64,
    pub png_data: Vec<u8>,
    pub instruction: String,
    pub product_id: String,
    pub layers: Vec<PlacedLayer>,
}

enum Command {
    RegisterAsset(String, AssetKind, Vec<u8>, oneshot::Sender<Result<()>>),
    RemoveAsset(String, oneshot::Sender<()>),
    SelectProduct(Option<String>, oneshot::Sender<()>),

    AddLayer(String, oneshot::Sender<LayerId>),
    RemoveLayer(LayerId, oneshot::Sender<()>),
    BeginDrag(LayerId, f32, f32, oneshot::Sender<()>),
    UpdateDrag(f32, f32, f32, f32, oneshot::Sender<()>),
    EndDrag(oneshot::Sender<()>),
    AdjustScale(LayerId, f32, oneshot::Sender<()>),
    ClearLayers(oneshot::Sender<()>),
    Layers(oneshot::Sender<Vec<PlacedLayer>>),

    Render(usize, oneshot::Sender<Result<Composite>>),
    Generate(usize, String, oneshot::Sender<Result<GeneratedMockup>>),
    GenerateAsset(String, String, AssetKind, oneshot::Sender<Result<()>>),
    Gallery(oneshot::Sender<Vec<GeneratedMockup>>),

    Close(oneshot::Sender<Result<()>>),
}

struct Session {
    config: StudioConfig,
    registry: Arc<MemoryRegistry>,
    store: PlacementStore,
    product: Option<String>,
    sink: Arc<dyn GenerationSink>,
    // Shared with generate threads, which append on success
    gallery: Arc<std::sync::Mutex<Vec<GeneratedMockup>>>,
    next_mockup_id: u64,
}

impl Session {
    /// Everything a render thread needs, validated up front on the worker.
    fn render_setup(&self, preset_index: usize) -> Result<(String, OutputPreset)> {
        let preset = self
            .config
            .presets
            .get(preset_index)
            .cloned()
            .ok_or_else(|| Error::Config(format!("no output preset at index {}", preset_index)))?;
        let product = self
            .product
            .clone()
            .ok_or_else(|| Error::Other("no product selected".into()))?;
        Ok((product, preset))
    }

    fn spawn_render(&self, preset_index: usize, resp: oneshot::Sender<Result<Composite>>) {
        let (product, preset) = match self.render_setup(preset_index) {
            Ok(setup) => setup,
            Err(e) => {
                let _ = resp.send(Err(e));
                return;
            }
        };
        let registry = Arc::clone(&self.registry);
        let layers = self.store.layers().to_vec();
        let strict = self.config.strict_overlays;
        thread::spawn(move || {
            let result = rendering::render_with_registry(
                &*registry,
                &product,
                &layers,
                preset.width,
                preset.height,
                strict,
            );
            let _ = resp.send(result);
        });
    }

    fn spawn_generate(
        &mut self,
        preset_index: usize,
        instruction: String,
        resp: oneshot::Sender<Result<GeneratedMockup>>,
    ) {
        let (product, preset) = match self.render_setup(preset_index) {
            Ok(setup) => setup,
            Err(e) => {
                let _ = resp.send(Err(e));
                return;
            }
        };
        let id = self.next_mockup_id;
        self.next_mockup_id += 1;

        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let gallery = Arc::clone(&self.gallery);
        let layers = self.store.layers().to_vec();
        let strict = self.config.strict_overlays;
        thread::spawn(move || {
            let result = rendering::render_with_registry(
                &*registry,
                &product,
                &layers,
                preset.width,
                preset.height,
                strict,
            )
            .and_then(|composite| {
                sink.generate(&GenerationRequest {
                    png_data: composite.png_data,
                    instruction: instruction.clone(),
                    aspect: preset.aspect.clone(),
                    tier: preset.tier.clone(),
                })
            })
            .map(|generated| GeneratedMockup {
                id,
                png_data: generated.png_data,
                instruction,
                product_id: product,
                layers,
            });

            if let Ok(mockup) = &result {
                gallery.lock().unwrap().push(mockup.clone());
            }
            let _ = resp.send(result);
        });
    }
}

/// An async handle onto one studio session.
///
/// Cloneable; all clones talk to the same worker thread and therefore the
/// same session state, mirroring how the interactive studio has one canvas
/// regardless of how many views observe it.
#[derive(Clone)]
pub struct Studio {
    cmd_tx: Sender<Command>,
}

impl Studio {
    /// Create a new session (spawns the worker thread that owns the state).
    pub async fn new(config: Option<StudioConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Build the sink on the worker thread; report the outcome
            let sink: Arc<dyn GenerationSink> = match crate::new_sink(&config) {
                Ok(s) => Arc::from(s),
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            let mut session = Session {
                config,
                registry: Arc::new(MemoryRegistry::new()),
                store: PlacementStore::new(),
                product: None,
                sink,
                gallery: Arc::new(std::sync::Mutex::new(Vec::new())),
                next_mockup_id: 0,
            };

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::RegisterAsset(id, kind, data, resp) => {
                        let _ = resp.send(session.registry.register_bytes(&id, kind, data));
                    }
                    Command::RemoveAsset(id, resp) => {
                        session.registry.remove(&id);
                        let _ = resp.send(());
                    }
                    Command::SelectProduct(id, resp) => {
                        session.product = id;
                        let _ = resp.send(());
                    }
                    Command::AddLayer(asset_id, resp) => {
                        let _ = resp.send(session.store.add_layer(asset_id));
                    }
                    Command::RemoveLayer(id, resp) => {
                        session.store.remove_layer(id);
                        let _ = resp.send(());
                    }
                    Command::BeginDrag(id, x, y, resp) => {
                        session.store.begin_drag(id, x, y);
                        let _ = resp.send(());
                    }
                    Command::UpdateDrag(x, y, w, h, resp) => {
                        session.store.update_drag(x, y, w, h);
                        let _ = resp.send(());
                    }
                    Command::EndDrag(resp) => {
                        session.store.end_drag();
                        let _ = resp.send(());
                    }
                    Command::AdjustScale(id, sign, resp) => {
                        session.store.adjust_scale(id, sign);
                        let _ = resp.send(());
                    }
                    Command::ClearLayers(resp) => {
                        session.store.clear();
                        let _ = resp.send(());
                    }
                    Command::Layers(resp) => {
                        let _ = resp.send(session.store.layers().to_vec());
                    }
                    Command::Render(preset, resp) => {
                        session.spawn_render(preset, resp);
                    }
                    Command::Generate(preset, instruction, resp) => {
                        session.spawn_generate(preset, instruction, resp);
                    }
                    Command::GenerateAsset(id, prompt, kind, resp) => {
                        let sink = Arc::clone(&session.sink);
                        let registry = Arc::clone(&session.registry);
                        thread::spawn(move || {
                            let res = sink
                                .generate_asset(&prompt, kind)
                                .and_then(|img| registry.register_bytes(&id, kind, img.png_data));
                            let _ = resp.send(res);
                        });
                    }
                    Command::Gallery(resp) => {
                        let _ = resp.send(session.gallery.lock().unwrap().clone());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    async fn call<T>(&self, rx: oneshot::Receiver<T>, what: &str) -> Result<T> {
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))
    }

    /// Register an asset from encoded raster bytes.
    pub async fn register_asset(&self, id: &str, kind: AssetKind, data: Vec<u8>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::RegisterAsset(id.to_string(), kind, data, tx));
        self.call(rx, "RegisterAsset").await?
    }

    /// Register several assets concurrently; fails if any registration fails.
    pub async fn register_assets(&self, assets: Vec<(String, AssetKind, Vec<u8>)>) -> Result<()> {
        let pending: Vec<_> = assets
            .into_iter()
            .map(|(id, kind, data)| {
                let (tx, rx) = oneshot::channel();
                let _ = self.cmd_tx.send(Command::RegisterAsset(id, kind, data, tx));
                rx
            })
            .collect();
        for res in futures::future::join_all(pending).await {
            res.map_err(|e| Error::Other(format!("RegisterAsset canceled: {}", e)))??;
        }
        Ok(())
    }

    /// Remove an asset; layers referencing it become dangling.
    pub async fn remove_asset(&self, id: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::RemoveAsset(id.to_string(), tx));
        self.call(rx, "RemoveAsset").await
    }

    /// Select (or clear) the product the composite renders onto.
    pub async fn select_product(&self, id: Option<&str>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::SelectProduct(id.map(|s| s.to_string()), tx));
        self.call(rx, "SelectProduct").await
    }

    /// Place a new overlay layer at the canvas center.
    pub async fn add_layer(&self, asset_id: &str) -> Result<LayerId> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::AddLayer(asset_id.to_string(), tx));
        self.call(rx, "AddLayer").await
    }

    pub async fn remove_layer(&self, id: LayerId) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::RemoveLayer(id, tx));
        self.call(rx, "RemoveLayer").await
    }

    pub async fn begin_drag(&self, id: LayerId, x: f32, y: f32) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::BeginDrag(id, x, y, tx));
        self.call(rx, "BeginDrag").await
    }

    pub async fn update_drag(&self, x: f32, y: f32, container_w: f32, container_h: f32) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::UpdateDrag(x, y, container_w, container_h, tx));
        self.call(rx, "UpdateDrag").await
    }

    pub async fn end_drag(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::EndDrag(tx));
        self.call(rx, "EndDrag").await
    }

    pub async fn adjust_scale(&self, id: LayerId, delta_sign: f32) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::AdjustScale(id, delta_sign, tx));
        self.call(rx, "AdjustScale").await
    }

    /// Clear the layer list (starting a new design).
    pub async fn clear_layers(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::ClearLayers(tx));
        self.call(rx, "ClearLayers").await
    }

    /// Snapshot of the current layers in paint order.
    pub async fn layers(&self) -> Result<Vec<PlacedLayer>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Layers(tx));
        self.call(rx, "Layers").await
    }

    /// Flatten the current arrangement at the given preset. The render runs
    /// on its own thread against a snapshot of the layer list; dropping the
    /// returned future simply discards the stale result.
    pub async fn render(&self, preset_index: usize) -> Result<Composite> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Render(preset_index, tx));
        self.call(rx, "Render").await?
    }

    /// Render and push the composite through the generation sink; the
    /// result is appended to the session gallery.
    pub async fn generate(&self, preset_index: usize, instruction: &str) -> Result<GeneratedMockup> {
        let (tx, rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Command::Generate(preset_index, instruction.to_string(), tx));
        self.call(rx, "Generate").await?
    }

    /// Ask the sink for a brand-new asset and register it under `id`.
    pub async fn generate_asset(&self, id: &str, prompt: &str, kind: AssetKind) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::GenerateAsset(
            id.to_string(),
            prompt.to_string(),
            kind,
            tx,
        ));
        self.call(rx, "GenerateAsset").await?
    }

    /// Mockups generated so far in this session, oldest first.
    pub async fn gallery(&self) -> Result<Vec<GeneratedMockup>> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Gallery(tx));
        self.call(rx, "Gallery").await
    }

    /// Shut down the worker thread and end the session.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        self.call(rx, "Close").await?
    }
}
