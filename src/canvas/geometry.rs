//! Pure transforms between percent placement space and pixel space
//!
//! Layer positions are stored as percentages of their container so the same
//! arrangement can be painted into containers of any size. Every mapping in
//! this module assumes a container with strictly positive dimensions; the
//! callers (placement store, rasterizer) guard that precondition and skip
//! the operation instead of passing zero through.

/// Fraction of the container width an unscaled overlay occupies. Both the
/// interactive preview and the final rasterizer size overlays with this
/// constant, which is what makes a low-resolution preview reproduce exactly
/// at any output resolution.
pub const OVERLAY_BASE_FRACTION: f32 = 0.15;

/// Map a percent-space center position into pixel coordinates.
pub fn to_pixels(x_pct: f32, y_pct: f32, width: f32, height: f32) -> (f32, f32) {
    (x_pct / 100.0 * width, y_pct / 100.0 * height)
}

/// Map a pixel delta (e.g. a pointer movement) into a percent delta for a
/// container of the given size.
pub fn pixel_delta_to_percent(dx: f32, dy: f32, width: f32, height: f32) -> (f32, f32) {
    (dx / width * 100.0, dy / height * 100.0)
}

/// Placement of an image fitted entirely inside a target box while
/// preserving aspect ratio ("contain"), centered with letterboxing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub scale: f32,
    pub draw_width: u32,
    pub draw_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Compute the contain fit of a `natural_w`x`natural_h` image inside a
/// `target_w`x`target_h` box.
pub fn contain_fit(natural_w: u32, natural_h: u32, target_w: u32, target_h: u32) -> ContainFit {
    let scale = (target_w as f32 / natural_w as f32).min(target_h as f32 / natural_h as f32);
    let draw_width = (natural_w as f32 * scale).round() as u32;
    let draw_height = (natural_h as f32 * scale).round() as u32;
    ContainFit {
        scale,
        draw_width,
        draw_height,
        offset_x: (target_w as i64 - draw_width as i64) / 2,
        offset_y: (target_h as i64 - draw_height as i64) / 2,
    }
}

/// Pixel footprint of an overlay in a container of width `target_w`: width
/// is the fixed base fraction of the container times the layer scale, height
/// follows the overlay's natural aspect ratio.
pub fn overlay_footprint(target_w: u32, natural_w: u32, natural_h: u32, scale: f32) -> (f32, f32) {
    let width = target_w as f32 * OVERLAY_BASE_FRACTION * scale;
    let height = width * (natural_h as f32 / natural_w as f32);
    (width, height)
}
