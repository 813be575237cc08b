//! The composite rasterizer: flatten base + placed overlays into one PNG
//!
//! Pure function over decoded inputs. The output reproduces, at any target
//! resolution, the same relative layout the interactive preview showed,
//! because both sides share the percent position model and the fixed
//! base-fraction sizing rule from [`crate::canvas::geometry`].

use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::canvas::geometry::{contain_fit, overlay_footprint, to_pixels};
use crate::canvas::placement::PlacedLayer;
use crate::error::{Error, Result};
use crate::rendering::decode::DecodedAsset;
use crate::rendering::{Composite, RenderWarning};

/// Background fill; guarantees no transparent or undefined regions outside
/// the drawn content.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Flatten `layers` over `base` into a `target_w`x`target_h` PNG.
///
/// Layers are painted in list order (later on top). A layer whose asset id
/// is missing from `resolved` is omitted with a
/// [`RenderWarning::DanglingReference`]; nothing else about the composite
/// changes. Zero target dimensions fail before anything is allocated.
pub fn render(
    base: &DecodedAsset,
    layers: &[PlacedLayer],
    resolved: &HashMap<String, DecodedAsset>,
    target_w: u32,
    target_h: u32,
) -> Result<Composite> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::InvalidContainer {
            width: target_w,
            height: target_h,
        });
    }
    if base.width == 0 || base.height == 0 {
        return Err(Error::ImageLoad("base image has zero dimensions".into()));
    }

    let mut canvas = RgbaImage::from_pixel(target_w, target_h, BACKGROUND);

    // Base: contain fit, centered, letterboxed on the background
    let fit = contain_fit(base.width, base.height, target_w, target_h);
    if fit.draw_width > 0 && fit.draw_height > 0 {
        let resized = imageops::resize(&base.pixels, fit.draw_width, fit.draw_height, FilterType::Triangle);
        imageops::overlay(&mut canvas, &resized, fit.offset_x, fit.offset_y);
    }

    let mut warnings = Vec::new();
    for layer in layers {
        let Some(overlay) = resolved.get(&layer.asset_id) else {
            log::warn!(
                "layer {} references missing asset '{}'; skipping",
                layer.id,
                layer.asset_id
            );
            warnings.push(RenderWarning::DanglingReference {
                layer: layer.id,
                asset_id: layer.asset_id.clone(),
            });
            continue;
        };
        let footprint = overlay_footprint(target_w, overlay.width, overlay.height, layer.scale);
        let center = to_pixels(layer.x, layer.y, target_w as f32, target_h as f32);
        draw_overlay(&mut canvas, overlay, center, footprint, layer.rotation);
    }

    let mut png_data = Vec::new();
    canvas
        .write_to(&mut std::io::Cursor::new(&mut png_data), image::ImageFormat::Png)
        .map_err(|e| Error::Encode(e.to_string()))?;

    Ok(Composite {
        width: target_w,
        height: target_h,
        png_data,
        warnings,
    })
}

/// Draw one overlay centered at `center` with the given pixel footprint,
/// rotated about its center.
fn draw_overlay(
    canvas: &mut RgbaImage,
    overlay: &DecodedAsset,
    center: (f32, f32),
    footprint: (f32, f32),
    rotation: f32,
) {
    let (fw, fh) = footprint;
    if fw < 1.0 || fh < 1.0 {
        return;
    }
    if rotation.rem_euclid(360.0) == 0.0 {
        // Axis-aligned fast path: resample once and alpha-blit
        let w = fw.round().max(1.0) as u32;
        let h = fh.round().max(1.0) as u32;
        let resized = imageops::resize(&overlay.pixels, w, h, FilterType::Triangle);
        let x = (center.0 - fw / 2.0).round() as i64;
        let y = (center.1 - fh / 2.0).round() as i64;
        imageops::overlay(canvas, &resized, x, y);
        return;
    }
    draw_rotated(canvas, overlay, center, footprint, rotation);
}

/// Inverse-mapped rotated draw: walk every destination pixel in the rotated
/// bounding box, rotate it back into overlay space, and bilinearly sample.
fn draw_rotated(
    canvas: &mut RgbaImage,
    overlay: &DecodedAsset,
    center: (f32, f32),
    footprint: (f32, f32),
    rotation: f32,
) {
    let (fw, fh) = footprint;
    let (half_w, half_h) = (fw / 2.0, fh / 2.0);
    let radians = rotation.to_radians();
    let (sin_theta, cos_theta) = radians.sin_cos();

    // Axis-aligned bounding box of the rotated rectangle, clipped to canvas
    let extent_x = half_w * cos_theta.abs() + half_h * sin_theta.abs();
    let extent_y = half_w * sin_theta.abs() + half_h * cos_theta.abs();
    let x0 = (center.0 - extent_x).floor().max(0.0) as u32;
    let y0 = (center.1 - extent_y).floor().max(0.0) as u32;
    let x1 = ((center.0 + extent_x).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((center.1 + extent_y).ceil().max(0.0) as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - center.0;
            let dy = py as f32 + 0.5 - center.1;
            // Rotate back by -theta into the overlay's unrotated frame
            let u = dx * cos_theta + dy * sin_theta;
            let v = -dx * sin_theta + dy * cos_theta;
            if u < -half_w || u >= half_w || v < -half_h || v >= half_h {
                continue;
            }
            let sx = (u + half_w) / fw * overlay.width as f32 - 0.5;
            let sy = (v + half_h) / fh * overlay.height as f32 - 0.5;
            let src = sample_bilinear(&overlay.pixels, sx, sy);
            blend_over(canvas.get_pixel_mut(px, py), src);
        }
    }
}

/// Bilinear sample with edge clamping.
fn sample_bilinear(img: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let max_x = (img.width() - 1) as f32;
    let max_y = (img.height() - 1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - tx) + p10[c] as f32 * tx;
        let bottom = p01[c] as f32 * (1.0 - tx) + p11[c] as f32 * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round() as u8;
    }
    Rgba(out)
}

/// Source-over blend of a straight-alpha pixel onto the canvas.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src.0[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return;
    }
    for c in 0..3 {
        let blended = src.0[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha);
        dst.0[c] = blended.round() as u8;
    }
    let dst_alpha = dst.0[3] as f32 / 255.0;
    dst.0[3] = ((alpha + dst_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedAsset {
        DecodedAsset {
            width,
            height,
            pixels: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    fn decode_png(composite: &Composite) -> RgbaImage {
        image::load_from_memory(&composite.png_data).unwrap().to_rgba8()
    }

    fn layer(id: u64, asset_id: &str, x: f32, y: f32, scale: f32, rotation: f32) -> PlacedLayer {
        PlacedLayer {
            id,
            asset_id: asset_id.to_string(),
            x,
            y,
            scale,
            rotation,
        }
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    #[test]
    fn zero_target_dimension_fails_without_a_buffer() {
        let base = solid(8, 8, RED);
        let err = render(&base, &[], &HashMap::new(), 0, 256).unwrap_err();
        assert!(matches!(err, Error::InvalidContainer { width: 0, height: 256 }));
        let err = render(&base, &[], &HashMap::new(), 256, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidContainer { .. }));
    }

    #[test]
    fn wide_base_is_letterboxed_with_white_margins() {
        // 800x400 into 1000x1000: drawn 1000x500, 250px margins top/bottom
        let base = solid(800, 400, RED);
        let composite = render(&base, &[], &HashMap::new(), 1000, 1000).unwrap();
        assert_eq!((composite.width, composite.height), (1000, 1000));
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(500, 100).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(500, 900).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(500, 249).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(500, 250).0, RED);
        assert_eq!(img.get_pixel(500, 500).0, RED);
        assert_eq!(img.get_pixel(0, 500).0, RED);
        assert_eq!(img.get_pixel(999, 500).0, RED);
    }

    #[test]
    fn overlay_paints_its_footprint_at_the_center() {
        // 200px target: unscaled footprint is 30px wide; 2:1 logo -> 15 tall
        let base = solid(200, 200, RED);
        let mut resolved = HashMap::new();
        resolved.insert("logo".to_string(), solid(2, 1, BLUE));

        let layers = vec![layer(0, "logo", 50.0, 50.0, 1.0, 0.0)];
        let composite = render(&base, &layers, &resolved, 200, 200).unwrap();
        assert!(composite.warnings.is_empty());
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(100, 100).0, BLUE);
        assert_eq!(img.get_pixel(86, 100).0, BLUE);
        assert_eq!(img.get_pixel(113, 100).0, BLUE);
        assert_eq!(img.get_pixel(83, 100).0, RED);
        assert_eq!(img.get_pixel(100, 110).0, RED); // past the 15px height
    }

    #[test]
    fn rotation_by_quarter_turn_swaps_the_footprint_axes() {
        let base = solid(200, 200, RED);
        let mut resolved = HashMap::new();
        resolved.insert("logo".to_string(), solid(2, 1, BLUE));

        // Wide 30x15 logo rotated 90 degrees becomes tall 15x30
        let layers = vec![layer(0, "logo", 50.0, 50.0, 1.0, 90.0)];
        let composite = render(&base, &layers, &resolved, 200, 200).unwrap();
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(100, 100).0, BLUE);
        assert_eq!(img.get_pixel(100, 88).0, BLUE);
        assert_eq!(img.get_pixel(100, 112).0, BLUE);
        assert_eq!(img.get_pixel(88, 100).0, RED);
        assert_eq!(img.get_pixel(112, 100).0, RED);
    }

    #[test]
    fn later_layers_paint_over_earlier_ones() {
        let base = solid(100, 100, RED);
        let mut resolved = HashMap::new();
        resolved.insert("first".to_string(), solid(1, 1, BLUE));
        resolved.insert("second".to_string(), solid(1, 1, GREEN));

        let layers = vec![
            layer(0, "first", 50.0, 50.0, 1.0, 0.0),
            layer(1, "second", 50.0, 50.0, 1.0, 0.0),
        ];
        let composite = render(&base, &layers, &resolved, 100, 100).unwrap();
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(50, 50).0, GREEN);
    }

    #[test]
    fn dangling_layer_is_omitted_with_one_warning() {
        let base = solid(100, 100, RED);
        let mut resolved = HashMap::new();
        resolved.insert("present".to_string(), solid(1, 1, BLUE));

        let layers = vec![
            layer(0, "present", 25.0, 50.0, 1.0, 0.0),
            layer(1, "deleted", 75.0, 50.0, 1.0, 0.0),
        ];
        let composite = render(&base, &layers, &resolved, 100, 100).unwrap();
        assert_eq!(composite.warnings.len(), 1);
        assert_eq!(
            composite.warnings[0],
            RenderWarning::DanglingReference {
                layer: 1,
                asset_id: "deleted".to_string()
            }
        );
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(25, 50).0, BLUE);
        assert_eq!(img.get_pixel(75, 50).0, RED); // nothing painted there
    }

    #[test]
    fn transparent_overlay_pixels_leave_the_base_visible() {
        let base = solid(100, 100, RED);
        let mut resolved = HashMap::new();
        resolved.insert("ghost".to_string(), solid(2, 2, [0, 0, 255, 0]));

        let layers = vec![layer(0, "ghost", 50.0, 50.0, 1.0, 45.0)];
        let composite = render(&base, &layers, &resolved, 100, 100).unwrap();
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(50, 50).0, RED);
    }

    #[test]
    fn layer_at_clamped_corner_still_renders() {
        let base = solid(100, 100, RED);
        let mut resolved = HashMap::new();
        resolved.insert("logo".to_string(), solid(1, 1, BLUE));

        // Center at (0,0): three quarters of the footprint hang off-canvas
        let layers = vec![layer(0, "logo", 0.0, 0.0, 1.0, 30.0)];
        let composite = render(&base, &layers, &resolved, 100, 100).unwrap();
        let img = decode_png(&composite);
        assert_eq!(img.get_pixel(2, 2).0, BLUE);
    }

    #[test]
    fn full_rotations_take_the_fast_path_result() {
        let base = solid(200, 200, RED);
        let mut resolved = HashMap::new();
        resolved.insert("logo".to_string(), solid(2, 1, BLUE));

        let plain = render(
            &base,
            &[layer(0, "logo", 50.0, 50.0, 1.0, 0.0)],
            &resolved,
            200,
            200,
        )
        .unwrap();
        let wrapped = render(
            &base,
            &[layer(0, "logo", 50.0, 50.0, 1.0, 720.0)],
            &resolved,
            200,
            200,
        )
        .unwrap();
        assert_eq!(plain.png_data, wrapped.png_data);
    }
}
