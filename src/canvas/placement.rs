//! The placement store: ordered overlay layers and their live drag session
//!
//! All mutation rules live here. Positions are percentages of the container
//! and are clamped on every write, scale moves in fixed 0.1 steps inside a
//! fixed range, and at most one drag session exists at a time. While a drag
//! is live the session is the source of truth: each `update_drag` derives
//! the layer's position from the session anchor, so repeated updates with
//! the same pointer position are idempotent.

use serde::{Deserialize, Serialize};

use super::geometry;

/// Identifier of a placed layer, unique within one editing session.
pub type LayerId = u64;

/// Lower bound of the layer scale multiplier.
pub const SCALE_MIN: f32 = 0.2;
/// Upper bound of the layer scale multiplier.
pub const SCALE_MAX: f32 = 3.0;
/// Quantization unit of a single scale adjustment.
pub const SCALE_STEP: f32 = 0.1;

/// One overlay placed on the canvas.
///
/// `asset_id` is a weak reference: the asset may be removed from the
/// registry while the layer still exists, in which case the layer is
/// skipped at paint time rather than treated as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedLayer {
    pub id: LayerId,
    pub asset_id: String,
    /// Center x as a percentage of the container width, in [0, 100].
    pub x: f32,
    /// Center y as a percentage of the container height, in [0, 100].
    pub y: f32,
    /// Size multiplier, in [0.2, 3.0].
    pub scale: f32,
    /// Rotation in degrees about the layer center; any value is legal.
    pub rotation: f32,
}

/// The live drag session. At most one exists at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Layer being moved.
    pub layer: LayerId,
    /// Pointer position (screen pixels) when the drag started.
    pub pointer_start: (f32, f32),
    /// Layer center (percent) when the drag started.
    pub layer_start: (f32, f32),
}

/// Ordered collection of placed layers plus the drag session.
///
/// Insertion order is paint order (later layers draw on top). The store is
/// independent of any UI framework; it is mutated synchronously from input
/// dispatch and read by the rasterizer.
#[derive(Debug, Default)]
pub struct PlacementStore {
    layers: Vec<PlacedLayer>,
    drag: Option<DragSession>,
    next_id: LayerId,
    invalid_container_events: u64,
}

impl PlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new layer for `asset_id` at the canvas center.
    ///
    /// The asset is not validated here; a dangling reference is discovered
    /// (and skipped) at paint time.
    pub fn add_layer(&mut self, asset_id: impl Into<String>) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;
        self.layers.push(PlacedLayer {
            id,
            asset_id: asset_id.into(),
            x: 50.0,
            y: 50.0,
            scale: 1.0,
            rotation: 0.0,
        });
        id
    }

    /// Delete a layer by id; no-op if absent. Also clears the drag session
    /// when it referenced the removed layer, so a stale session can never
    /// mutate a deleted entity.
    pub fn remove_layer(&mut self, id: LayerId) {
        self.layers.retain(|l| l.id != id);
        if self.drag.map(|d| d.layer) == Some(id) {
            self.drag = None;
        }
    }

    /// Start (or re-anchor) a drag session for `id` at the given pointer
    /// position. No-op when a session for a *different* layer is live, or
    /// when the layer does not exist.
    pub fn begin_drag(&mut self, id: LayerId, pointer_x: f32, pointer_y: f32) {
        if let Some(active) = self.drag {
            if active.layer != id {
                return;
            }
        }
        let Some(layer) = self.layers.iter().find(|l| l.id == id) else {
            return;
        };
        self.drag = Some(DragSession {
            layer: id,
            pointer_start: (pointer_x, pointer_y),
            layer_start: (layer.x, layer.y),
        });
    }

    /// Recompute the dragged layer's position from the current pointer
    /// position. No-op without a live session. A zero or negative container
    /// dimension is a precondition violation: the update is skipped and
    /// counted instead of producing garbage coordinates.
    pub fn update_drag(&mut self, pointer_x: f32, pointer_y: f32, container_w: f32, container_h: f32) {
        let Some(session) = self.drag else {
            return;
        };
        if container_w <= 0.0 || container_h <= 0.0 {
            log::warn!(
                "drag update skipped: invalid container {}x{}",
                container_w,
                container_h
            );
            self.invalid_container_events += 1;
            return;
        }
        let (dx, dy) = geometry::pixel_delta_to_percent(
            pointer_x - session.pointer_start.0,
            pointer_y - session.pointer_start.1,
            container_w,
            container_h,
        );
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == session.layer) {
            layer.x = (session.layer_start.0 + dx).clamp(0.0, 100.0);
            layer.y = (session.layer_start.1 + dy).clamp(0.0, 100.0);
        }
    }

    /// End the drag session; the last computed position stays committed.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Adjust a layer's scale by one step in the direction of `delta_sign`.
    /// Stateless and independent of any drag session.
    pub fn adjust_scale(&mut self, id: LayerId, delta_sign: f32) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.id == id) {
            layer.scale = (layer.scale + SCALE_STEP * delta_sign.signum()).clamp(SCALE_MIN, SCALE_MAX);
        }
    }

    /// Remove every layer and any live drag session.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.drag = None;
    }

    /// Layers in paint order.
    pub fn layers(&self) -> &[PlacedLayer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&PlacedLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Id of the layer currently being dragged, if any.
    pub fn dragging(&self) -> Option<LayerId> {
        self.drag.map(|d| d.layer)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// How many geometry operations were skipped because the container had
    /// a zero or negative dimension. Exposed for tests and diagnostics.
    pub fn invalid_container_count(&self) -> u64 {
        self.invalid_container_events
    }
}
