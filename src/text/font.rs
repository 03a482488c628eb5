//! Built-in 5x7 bitmap glyph surface.
//!
//! Covers digits, Latin letters (lowercase renders as uppercase) and common
//! punctuation, including the full-width forms `，。！？`. Anything else
//! advances the pen but leaves no ink, so an unsupported string rasterizes
//! to an empty point cloud instead of failing.
//!
//! Glyphs are monospaced: each cell is `font_size / 10` pixels, a glyph is
//! 5x7 cells, and the advance is 6 cells with the ink centered inside it.

use super::{GlyphSurface, TextAlign};
use crate::error::SurfaceError;
use image::{Rgba, RgbaImage};

const COLS: u32 = 5;
const ROWS: usize = 7;
const ADVANCE_CELLS: f32 = 6.0;
const CELLS_PER_EM: f32 = 10.0;

/// Rows top to bottom; bit 4 is the leftmost column.
fn glyph(c: char) -> Option<[u8; ROWS]> {
    let rows = match c.to_ascii_uppercase() {
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
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '!' | '！' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' | '？' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '.' | '。' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' | '，' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        _ => return None,
    };
    Some(rows)
}

/// Whether the built-in font has ink for `c`.
pub fn has_glyph(c: char) -> bool {
    glyph(c).is_some()
}

/// Monospaced bitmap font drawn as solid cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    /// Draw `text` in an arbitrary color. `y` is the vertical middle of the
    /// glyph box.
    pub fn draw(
        &self,
        raster: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        align: TextAlign,
        color: [u8; 4],
    ) -> Result<(), SurfaceError> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(SurfaceError::InvalidFontSize(font_size));
        }

        let cell = font_size / CELLS_PER_EM;
        let mut pen = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - self.measure(text, font_size) / 2.0,
        };
        let top = y - cell * ROWS as f32 / 2.0;

        for c in text.chars() {
            if let Some(rows) = glyph(c) {
                let left = pen + cell * 0.5;
                for (r, bits) in rows.iter().enumerate() {
                    for col in 0..COLS {
                        if bits & (0x10 >> col) != 0 {
                            fill_cell(
                                raster,
                                left + col as f32 * cell,
                                top + r as f32 * cell,
                                cell,
                                color,
                            );
                        }
                    }
                }
            }
            pen += cell * ADVANCE_CELLS;
        }
        Ok(())
    }
}

impl GlyphSurface for BitmapFont {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size / CELLS_PER_EM * ADVANCE_CELLS
    }

    fn fill_text(
        &self,
        raster: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        align: TextAlign,
    ) -> Result<(), SurfaceError> {
        self.draw(raster, text, x, y, font_size, align, [255, 255, 255, 255])
    }
}

/// Paint every pixel whose center lies inside the square cell.
fn fill_cell(raster: &mut RgbaImage, left: f32, top: f32, size: f32, color: [u8; 4]) {
    let (w, h) = raster.dimensions();
    let span = |lo: f32, len: u32| {
        let start = (lo - 0.5).ceil().max(0.0) as u32;
        let end = ((lo + size - 0.5).ceil().max(0.0) as u32).min(len);
        start..end
    };
    for py in span(top, h) {
        for px in span(left, w) {
            raster.put_pixel(px, py, Rgba(color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(raster: &RgbaImage) -> usize {
        raster.pixels().filter(|p| p.0[3] > 0).count()
    }

    #[test]
    fn test_measure_is_monospaced() {
        let font = BitmapFont;
        assert_eq!(font.measure("2026", 100.0), 240.0);
        assert_eq!(font.measure("ab", 100.0), font.measure("WW", 100.0));
    }

    #[test]
    fn test_unsupported_glyph_leaves_no_ink() {
        let mut raster = RgbaImage::new(256, 128);
        BitmapFont
            .fill_text(&mut raster, "祝福", 128.0, 64.0, 60.0, TextAlign::Center)
            .unwrap();
        assert_eq!(ink(&raster), 0);
    }

    #[test]
    fn test_supported_glyph_draws() {
        let mut raster = RgbaImage::new(256, 128);
        BitmapFont
            .fill_text(&mut raster, "HI!", 128.0, 64.0, 60.0, TextAlign::Center)
            .unwrap();
        assert!(ink(&raster) > 0);
        assert!(has_glyph('h'));
        assert!(!has_glyph('驴'));
    }

    #[test]
    fn test_invalid_font_size() {
        let mut raster = RgbaImage::new(16, 16);
        let err = BitmapFont
            .fill_text(&mut raster, "1", 8.0, 8.0, 0.0, TextAlign::Left)
            .unwrap_err();
        assert_eq!(err, SurfaceError::InvalidFontSize(0.0));
    }

    #[test]
    fn test_clipped_drawing_is_safe() {
        let mut raster = RgbaImage::new(32, 32);
        BitmapFont
            .fill_text(&mut raster, "WIDE TEXT", -50.0, 40.0, 80.0, TextAlign::Left)
            .unwrap();
    }
}
