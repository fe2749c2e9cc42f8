//! Mean-brightness labels stamped onto cropped cells.
//!
//! Brightness is the arithmetic mean of the BT.601 luma of every pixel,
//! formatted with two decimals. The label is drawn with a small built-in
//! bitmap font so it fits on tiny crops and only ever touches the pixels
//! inside [`label_bounds`].

pub mod glyphs;

use image::{Rgb, RgbImage};

use crate::geometry::CellRect;

/// Placement and appearance of a brightness label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    /// Font scale; `0.3..=0.5` suits small crops.
    pub scale: f32,
    /// Bottom-left corner of the text (its baseline start), relative to the crop.
    pub origin: (u32, u32),
    /// Text colour.
    pub color: Rgb<u8>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            scale: 0.5,
            origin: (5, 20),
            color: Rgb([255, 0, 0]),
        }
    }
}

impl LabelStyle {
    /// Side of one font cell in pixels.
    pub fn cell_px(&self) -> u32 {
        (self.scale * 4.0).round().max(1.0) as u32
    }
}

/// BT.601 luma of one pixel, rounded to 8 bits.
fn luma(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)).round() as u8
}

/// Mean luma over all pixels; `0.0` for an empty image.
pub fn mean_brightness(image: &RgbImage) -> f64 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image.pixels().map(|p| u64::from(luma(p))).sum();
    sum as f64 / count as f64
}

/// Two-decimal label text for a brightness value.
pub fn format_label(mean: f64) -> String {
    format!("{mean:.2}")
}

/// Pixel rectangle the label may paint, before clipping to the crop.
pub fn label_bounds(text: &str, style: &LabelStyle) -> CellRect {
    let px = style.cell_px();
    let chars = text.chars().count() as u32;
    let (x, baseline) = style.origin;
    let width = if chars == 0 {
        0
    } else {
        chars
            .saturating_mul(glyphs::ADVANCE)
            .saturating_sub(1)
            .saturating_mul(px)
    };
    CellRect::new(
        x,
        baseline.saturating_sub(glyphs::GLYPH_HEIGHT.saturating_mul(px)),
        x.saturating_add(width),
        baseline,
    )
}

/// Draw `text` onto `image`, clipped to the image.
///
/// Characters without a glyph are skipped but still advance the pen.
pub fn draw_label(image: &mut RgbImage, text: &str, style: &LabelStyle) {
    let px = style.cell_px();
    let bounds = label_bounds(text, style);
    let (width, height) = image.dimensions();

    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = glyphs::glyph(ch) else {
            continue;
        };
        let advance = (index as u32).saturating_mul(glyphs::ADVANCE.saturating_mul(px));
        let pen_x = bounds.left.saturating_add(advance);
        if pen_x >= width {
            break;
        }
        for (col, row) in glyphs::set_cells(rows) {
            let x0 = pen_x.saturating_add(col.saturating_mul(px));
            let y0 = bounds.top.saturating_add(row.saturating_mul(px));
            for y in y0..y0.saturating_add(px).min(height) {
                for x in x0..x0.saturating_add(px).min(width) {
                    image.put_pixel(x, y, style.color);
                }
            }
        }
    }
}

/// Compute the crop's brightness, stamp it, and return the label text.
pub fn annotate_cell(image: &mut RgbImage, style: &LabelStyle) -> String {
    let label = format_label(mean_brightness(image));
    draw_label(image, &label, style);
    label
}
