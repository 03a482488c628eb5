//! Text to point-cloud rasterization.
//!
//! A string is drawn into a fixed 1024x512 off-screen raster, the raster is
//! sampled on a stride grid, and every sample whose alpha clears the
//! coverage threshold becomes a 3D point on a plane facing the camera.
//!
//! # Pipeline
//!
//! 1. Pick a font size from the layout hint and the character count
//!    (smaller for longer phrases, never below 44 px).
//! 2. Draw with a [`GlyphSurface`], either centered or left-aligned at a
//!    pre-measured offset ([`GlyphLayout`]).
//! 3. Keep grid cells with alpha > 130.
//! 4. Project to world units so the raster height spans 58% of the visible
//!    frustum, adding a hash-derived depth jitter.
//! 5. If there are more points than particles, keep an evenly strided subset.
//!
//! The same text, layout and frame always produce the same points.

mod font;

pub use font::{has_glyph, BitmapFont};

use crate::error::SurfaceError;
use glam::Vec3;
use image::RgbaImage;
use tracing::debug;

/// Off-screen raster width.
pub const RASTER_WIDTH: u32 = 1024;
/// Off-screen raster height.
pub const RASTER_HEIGHT: u32 = 512;
/// Samples with alpha above this are kept.
pub const COVERAGE_THRESHOLD: u8 = 130;
/// Smallest font size, in raster pixels.
pub const MIN_FONT_SIZE: f32 = 44.0;

/// Fraction of the visible frustum height the raster spans.
const PLANE_FILL: f32 = 0.58;
/// Total depth jitter range, in world units.
const DEPTH_JITTER: f32 = 1.6;

/// Horizontal anchoring of a drawn string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// `x` is the left edge.
    Left,
    /// `x` is the horizontal center.
    Center,
}

/// Something that can draw glyphs into an RGBA raster.
///
/// The rasterizer only reads the alpha channel, so implementations may draw
/// in any color.
pub trait GlyphSurface {
    /// Advance width of `text` at `font_size`, in raster pixels.
    fn measure(&self, text: &str, font_size: f32) -> f32;

    /// Draw `text` with its vertical middle at `y`.
    fn fill_text(
        &self,
        raster: &mut RgbaImage,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        align: TextAlign,
    ) -> Result<(), SurfaceError>;
}

/// How a string is placed on the raster.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GlyphLayout {
    /// Center the string itself.
    #[default]
    Centered,
    /// Left-align the string where `layout_text` would start if it were
    /// centered. Sizing also follows `layout_text`, so a growing prefix of a
    /// phrase stays put while the phrase is revealed.
    Measured { layout_text: String },
}

impl GlyphLayout {
    /// The text that decides font size and placement.
    pub fn layout_text<'a>(&'a self, text: &'a str) -> &'a str {
        match self {
            GlyphLayout::Centered => text,
            GlyphLayout::Measured { layout_text } => layout_text,
        }
    }
}

/// Viewing conditions for one rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFrame {
    /// Smaller viewport dimension, in CSS pixels; drives the font size.
    pub size_hint: f32,
    /// World-space height visible at the camera distance.
    pub visible_height: f32,
}

/// Font size for a phrase, shrinking at 4, 7 and 10 characters.
pub fn font_size_for(size_hint: f32, chars: usize) -> f32 {
    let mut size = (size_hint * 0.24).floor();
    if chars >= 4 {
        size *= 0.78;
    }
    if chars >= 7 {
        size *= 0.62;
    }
    if chars >= 10 {
        size *= 0.48;
    }
    size.max(MIN_FONT_SIZE)
}

/// Depth offset for a raster sample, derived from its coordinates only.
#[inline]
pub fn depth_jitter(x: u32, y: u32) -> f32 {
    let hash = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663);
    ((hash & 1023) as f32 / 1023.0 - 0.5) * DEPTH_JITTER
}

/// Pick exactly `cap` points at a fixed fractional stride.
pub fn downsample(points: Vec<Vec3>, cap: usize) -> Vec<Vec3> {
    if points.len() <= cap {
        return points;
    }
    let stride = points.len() as f64 / cap as f64;
    (0..cap)
        .map(|i| points[(i as f64 * stride).floor() as usize])
        .collect()
}

/// Turns strings into target point clouds.
pub struct TextRasterizer<S: GlyphSurface> {
    surface: S,
    raster: RgbaImage,
    sample_step: u32,
    max_points: usize,
}

impl<S: GlyphSurface> TextRasterizer<S> {
    /// Create a rasterizer.
    ///
    /// * `sample_step` - grid stride from the quality profile
    /// * `max_points` - particle population cap
    pub fn new(surface: S, sample_step: u32, max_points: usize) -> Self {
        Self {
            surface,
            raster: RgbaImage::new(RASTER_WIDTH, RASTER_HEIGHT),
            sample_step: sample_step.max(1),
            max_points,
        }
    }

    /// The glyph surface in use.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The raster as last drawn.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// Check that the surface can draw at all by drawing one glyph.
    pub fn check_surface(&mut self) -> Result<(), SurfaceError> {
        let (width, height) = self.raster.dimensions();
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }
        self.surface.fill_text(
            &mut self.raster,
            "0",
            width as f32 / 2.0,
            height as f32 / 2.0,
            MIN_FONT_SIZE,
            TextAlign::Center,
        )
    }

    /// Rasterize `text` into at most `max_points` world-space points.
    ///
    /// An unsupported string gives an empty list, not an error.
    pub fn rasterize(
        &mut self,
        text: &str,
        layout: &GlyphLayout,
        frame: &TextFrame,
    ) -> Result<Vec<Vec3>, SurfaceError> {
        let (width, height) = self.raster.dimensions();
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidSize { width, height });
        }

        for pixel in self.raster.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }

        let layout_text = layout.layout_text(text);
        let font_size = font_size_for(frame.size_hint, layout_text.chars().count());
        let middle = height as f32 / 2.0;
        match layout {
            GlyphLayout::Centered => self.surface.fill_text(
                &mut self.raster,
                text,
                width as f32 / 2.0,
                middle,
                font_size,
                TextAlign::Center,
            )?,
            GlyphLayout::Measured { layout_text } => {
                let full = self.surface.measure(layout_text, font_size);
                let start_x = width as f32 / 2.0 - full / 2.0;
                self.surface.fill_text(
                    &mut self.raster,
                    text,
                    start_x,
                    middle,
                    font_size,
                    TextAlign::Left,
                )?
            }
        }

        let scale = frame.visible_height / height as f32 * PLANE_FILL;
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        let mut points = Vec::new();
        for y in (0..height).step_by(self.sample_step as usize) {
            for x in (0..width).step_by(self.sample_step as usize) {
                if self.raster.get_pixel(x, y).0[3] > COVERAGE_THRESHOLD {
                    points.push(Vec3::new(
                        (x as f32 - half_w) * scale,
                        (half_h - y as f32) * scale,
                        depth_jitter(x, y),
                    ));
                }
            }
        }

        let sampled = points.len();
        let points = downsample(points, self.max_points);
        debug!(text, font_size, sampled, kept = points.len(), "rasterized text");
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> TextFrame {
        TextFrame {
            size_hint: 720.0,
            visible_height: 182.25,
        }
    }

    #[test]
    fn test_font_size_steps() {
        assert_eq!(font_size_for(1000.0, 1), 240.0);
        assert!((font_size_for(1000.0, 4) - 187.2).abs() < 1e-3);
        assert!((font_size_for(1000.0, 7) - 116.064).abs() < 1e-3);
        // 240 * 0.78 * 0.62 * 0.48 = 55.7
        assert!((font_size_for(1000.0, 12) - 55.71072).abs() < 1e-3);
        assert_eq!(font_size_for(300.0, 12), MIN_FONT_SIZE);
    }

    #[test]
    fn test_depth_jitter_bounds_and_determinism() {
        for (x, y) in [(0, 0), (3, 9), (1023, 511), (600, 27)] {
            let z = depth_jitter(x, y);
            assert!((-0.8..=0.8).contains(&z));
            assert_eq!(z, depth_jitter(x, y));
        }
        assert_eq!(depth_jitter(0, 0), -0.8);
    }

    #[test]
    fn test_downsample_exact_size() {
        let points: Vec<Vec3> = (0..1000).map(|i| Vec3::splat(i as f32)).collect();
        let kept = downsample(points.clone(), 300);
        assert_eq!(kept.len(), 300);
        assert_eq!(kept[0], points[0]);
        assert_eq!(downsample(points.clone(), 2000).len(), 1000);
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let mut r = TextRasterizer::new(BitmapFont, 3, 5600);
        let a = r.rasterize("2026", &GlyphLayout::Centered, &frame()).unwrap();
        let b = r.rasterize("2026", &GlyphLayout::Centered, &frame()).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_rasterize_caps_points() {
        let mut r = TextRasterizer::new(BitmapFont, 3, 100);
        let points = r.rasterize("8888", &GlyphLayout::Centered, &frame()).unwrap();
        assert_eq!(points.len(), 100);
    }

    #[test]
    fn test_rasterize_unsupported_is_empty() {
        let mut r = TextRasterizer::new(BitmapFont, 3, 5600);
        let points = r.rasterize("新年快乐", &GlyphLayout::Centered, &frame()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_measured_prefix_keeps_left_edge() {
        let mut r = TextRasterizer::new(BitmapFont, 1, 100_000);
        let layout = GlyphLayout::Measured {
            layout_text: "HELLO".into(),
        };
        let prefix = r.rasterize("H", &layout, &frame()).unwrap();
        let full = r.rasterize("HELLO", &layout, &frame()).unwrap();
        let min_x = |pts: &[Vec3]| pts.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        assert_eq!(min_x(&prefix), min_x(&full));

        let centered = r.rasterize("HELLO", &GlyphLayout::Centered, &frame()).unwrap();
        assert_eq!(centered, full);
    }
}
