//! Binds raw pointer/touch event streams to placement-store mutations
//!
//! The controller is a pure state machine over an explicit [`InputEvent`]
//! enum, so the whole interaction contract is testable without a real input
//! device. Exactly one pointer owns the drag session at a time; a second
//! concurrent pointer-down is ignored for drag purposes until the first
//! ends. Wheel input is orthogonal to dragging and may target any layer,
//! including the one mid-drag.
//!
//! The host is expected to feed `PointerUp`/`TouchEnd` from the top-level
//! input scope (document, window), not just the canvas element: a drag that
//! leaves the container must still be released, and moves outside the
//! container keep updating the session (the store clamp bounds the result).

use super::placement::{LayerId, PlacementStore};

/// Host-assigned identifier of a pointer or touch contact.
pub type PointerId = u64;

/// A raw input event, already hit-tested by the host where a layer target
/// is required (`PointerDown`/`TouchStart`/`Wheel` fire on a layer element).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pointer: PointerId, layer: LayerId, x: f32, y: f32 },
    PointerMove { pointer: PointerId, x: f32, y: f32 },
    PointerUp { pointer: PointerId },
    TouchStart { pointer: PointerId, layer: LayerId, x: f32, y: f32 },
    TouchMove { pointer: PointerId, x: f32, y: f32 },
    TouchEnd { pointer: PointerId },
    /// Scroll over a layer; positive `delta_y` scales down, negative up.
    Wheel { layer: LayerId, delta_y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactKind {
    Mouse,
    Touch,
}

/// Single-active-drag input controller.
///
/// Owns no layers; every event is applied to the store passed in, which
/// keeps the controller reusable across stores and trivially testable.
#[derive(Debug, Default)]
pub struct InteractionController {
    active: Option<(PointerId, ContactKind)>,
    container: (f32, f32),
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the container's current pixel size; used to convert pointer
    /// deltas during drag updates.
    pub fn set_container_size(&mut self, width: f32, height: f32) {
        self.container = (width, height);
    }

    /// Apply one input event to the store. Returns `true` when the host
    /// must suppress the platform's default behavior (scrolling) for this
    /// event, which is the case exactly for touch moves while a touch-drag
    /// session is live.
    pub fn handle(&mut self, store: &mut PlacementStore, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { pointer, layer, x, y } => {
                self.press(store, pointer, ContactKind::Mouse, layer, x, y);
                false
            }
            InputEvent::TouchStart { pointer, layer, x, y } => {
                self.press(store, pointer, ContactKind::Touch, layer, x, y);
                false
            }
            InputEvent::PointerMove { pointer, x, y } => {
                self.moved(store, pointer, ContactKind::Mouse, x, y);
                false
            }
            InputEvent::TouchMove { pointer, x, y } => {
                let dragging = self.moved(store, pointer, ContactKind::Touch, x, y);
                // preventDefault only while this touch owns a drag, so the
                // page does not scroll underneath the manipulation
                dragging
            }
            InputEvent::PointerUp { pointer } | InputEvent::TouchEnd { pointer } => {
                self.release(store, pointer);
                false
            }
            InputEvent::Wheel { layer, delta_y } => {
                store.adjust_scale(layer, if delta_y > 0.0 { -1.0 } else { 1.0 });
                false
            }
        }
    }

    /// Whether a drag session owned by this controller is currently live.
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    fn press(
        &mut self,
        store: &mut PlacementStore,
        pointer: PointerId,
        kind: ContactKind,
        layer: LayerId,
        x: f32,
        y: f32,
    ) {
        if self.active.is_some() {
            // A second simultaneous contact never steals the session
            return;
        }
        store.begin_drag(layer, x, y);
        if store.dragging() == Some(layer) {
            self.active = Some((pointer, kind));
        }
    }

    fn moved(
        &mut self,
        store: &mut PlacementStore,
        pointer: PointerId,
        kind: ContactKind,
        x: f32,
        y: f32,
    ) -> bool {
        match self.active {
            Some((active, active_kind)) if active == pointer && active_kind == kind => {
                let (w, h) = self.container;
                store.update_drag(x, y, w, h);
                // The session may have died underneath us (layer removed
                // mid-drag); stop suppressing scroll once it has
                store.dragging().is_some()
            }
            _ => false,
        }
    }

    fn release(&mut self, store: &mut PlacementStore, pointer: PointerId) {
        if let Some((active, _)) = self.active {
            if active == pointer {
                store.end_drag();
                self.active = None;
            }
        }
    }
}
