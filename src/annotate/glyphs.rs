//! 5×7 bitmap glyphs for numeric labels.
//!
//! Each glyph is seven rows, top to bottom; the low five bits of each row are
//! the columns, most significant bit on the left.

/// Glyph width in font cells.
pub const GLYPH_WIDTH: u32 = 5;
/// Glyph height in font cells.
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character in font cells (glyph plus one gap).
pub const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Bitmap for `ch`, or `None` if the font has no such glyph.
pub fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}

/// Iterate the set cells of a glyph as `(column, row)` pairs.
pub fn set_cells(rows: [u8; 7]) -> impl Iterator<Item = (u32, u32)> {
    rows.into_iter().enumerate().flat_map(|(row, bits)| {
        (0..GLYPH_WIDTH).filter_map(move |col| {
            let mask = 1u8 << (GLYPH_WIDTH - 1 - col);
            (bits & mask != 0).then_some((col, row as u32))
        })
    })
}
