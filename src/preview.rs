//! Preview overlay rendering.
//!
//! The overlay is drawn on a clone of the source so the caller's image is
//! never touched; it exists only to be shown to the operator.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;

use crate::geometry::{CropMode, GridSpec};

/// Colours and stroke width of the preview overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Colour of the cut lines.
    pub line_color: Rgb<u8>,
    /// Colour of the per-cell circles.
    pub circle_color: Rgb<u8>,
    /// Stroke width in pixels for lines and circles.
    pub line_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Rgb([0, 0, 255]),
            circle_color: Rgb([255, 0, 0]),
            line_width: 2,
        }
    }
}

/// Render the cut lines (and circles in circular mode) over a copy of `image`.
pub fn render_overlay(
    image: &RgbImage,
    grid: &GridSpec,
    mode: CropMode,
    style: &OverlayStyle,
) -> RgbImage {
    let mut overlay = image.clone();
    let stroke = style.line_width.max(1);
    let half = (stroke / 2) as i32;

    for y in grid.row_boundaries() {
        let rect = Rect::at(0, y as i32 - half).of_size(grid.width(), stroke);
        draw_filled_rect_mut(&mut overlay, rect, style.line_color);
    }
    for x in grid.col_boundaries() {
        let rect = Rect::at(x as i32 - half, 0).of_size(stroke, grid.height());
        draw_filled_rect_mut(&mut overlay, rect, style.line_color);
    }

    if let Some(ratio) = mode.radius_ratio() {
        let radius = grid.radius(ratio) as i32;
        for (row, col) in grid.cells() {
            let (cx, cy) = grid.cell_center(row, col);
            draw_thick_circle(
                &mut overlay,
                (cx as i32, cy as i32),
                radius,
                stroke,
                style.circle_color,
            );
        }
    }

    tracing::debug!(
        rows = grid.rows(),
        cols = grid.cols(),
        circles = mode.radius_ratio().is_some(),
        "preview overlay rendered"
    );
    overlay
}

fn draw_thick_circle(
    canvas: &mut RgbImage,
    center: (i32, i32),
    radius: i32,
    stroke: u32,
    color: Rgb<u8>,
) {
    let inner = radius - (stroke / 2) as i32;
    for offset in 0..stroke as i32 {
        let r = inner + offset;
        if r > 0 {
            draw_hollow_circle_mut(canvas, center, r, color);
        }
    }
}
