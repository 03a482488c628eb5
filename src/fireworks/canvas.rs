//! 2D compositing surface for the firework layer.
//!
//! The simulator draws through [`Canvas2d`], in logical (CSS pixel)
//! coordinates. Drawing is additive, and [`Canvas2d::fade`] removes a
//! fraction of what is already there instead of clearing, which is what
//! leaves the trails.
//!
//! [`RasterCanvas`] is a software implementation on a premultiplied
//! floating-point image. It is used headless and in tests; a host with a
//! real 2D context implements the trait over that instead.

use crate::color::to_rgba8;
use glam::{Vec2, Vec3};
use image::{ImageBuffer, Rgba, RgbaImage};

/// Highest device-pixel ratio the firework layer renders at.
pub const MAX_CANVAS_PIXEL_RATIO: f32 = 1.5;

/// One color stop of a radial gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position along the radius, 0 to 1.
    pub offset: f32,
    pub color: Vec3,
    pub alpha: f32,
}

impl GradientStop {
    pub fn new(offset: f32, color: Vec3, alpha: f32) -> Self {
        Self { offset, color, alpha }
    }
}

/// Drawing operations the firework simulator needs.
pub trait Canvas2d {
    /// Resize to a logical size, backed at `pixel_ratio` device pixels per
    /// logical pixel. Contents are cleared.
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32);

    /// Logical size.
    fn size(&self) -> Vec2;

    /// Remove `alpha` of the existing contents everywhere.
    fn fade(&mut self, alpha: f32);

    /// Add a polyline stroke.
    fn stroke_polyline(&mut self, points: &[Vec2], color: Vec3, alpha: f32, width: f32);

    /// Add a disc of radius `clip_radius` filled with a radial gradient that
    /// spans `gradient_radius`.
    fn fill_radial(&mut self, center: Vec2, gradient_radius: f32, clip_radius: f32, stops: &[GradientStop]);
}

/// Color and alpha of a gradient at `t`, clamped to the end stops.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> (Vec3, f32) {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (Vec3::ZERO, 0.0),
    };
    if t <= first.offset {
        return (first.color, first.alpha);
    }
    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= b.offset {
            let span = (b.offset - a.offset).max(f32::EPSILON);
            let k = (t - a.offset) / span;
            return (a.color.lerp(b.color, k), a.alpha + (b.alpha - a.alpha) * k);
        }
    }
    (last.color, last.alpha)
}

type PremultipliedImage = ImageBuffer<Rgba<f32>, Vec<f32>>;

/// Software canvas with additive blending.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: PremultipliedImage,
    logical: Vec2,
    pixel_ratio: f32,
}

impl RasterCanvas {
    /// A cleared canvas. The pixel ratio is capped at
    /// [`MAX_CANVAS_PIXEL_RATIO`].
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let mut canvas = Self {
            image: PremultipliedImage::new(0, 0),
            logical: Vec2::ZERO,
            pixel_ratio: 1.0,
        };
        canvas.resize(width, height, pixel_ratio);
        canvas
    }

    /// Backing store size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Premultiplied RGBA of one device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Sum of alpha over the whole canvas.
    pub fn total_alpha(&self) -> f32 {
        self.image.pixels().map(|p| p.0[3]).sum()
    }

    pub fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            p.0 = [0.0; 4];
        }
    }

    /// Straight-alpha 8-bit copy, e.g. for saving as PNG.
    pub fn to_rgba8(&self) -> RgbaImage {
        let (w, h) = self.image.dimensions();
        RgbaImage::from_fn(w, h, |x, y| {
            let [r, g, b, a] = self.image.get_pixel(x, y).0;
            let color = if a > 0.0 {
                Vec3::new(r, g, b) / a
            } else {
                Vec3::ZERO
            };
            Rgba(to_rgba8(color, a))
        })
    }

    /// Add premultiplied color to one pixel, saturating at 1.
    #[inline]
    fn add(&mut self, x: u32, y: u32, color: Vec3, alpha: f32) {
        let px = self.image.get_pixel_mut(x, y);
        let src = [color.x * alpha, color.y * alpha, color.z * alpha, alpha];
        for (d, s) in px.0.iter_mut().zip(src) {
            *d = (*d + s).min(1.0);
        }
    }

    /// Device-pixel range covering `[lo, hi]` in device units.
    fn span(lo: f32, hi: f32, len: u32) -> std::ops::Range<u32> {
        let start = lo.floor().max(0.0) as u32;
        let end = (hi.ceil().max(0.0) as u32).min(len);
        start..end.max(start)
    }
}

impl Canvas2d for RasterCanvas {
    fn resize(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        let ratio = pixel_ratio.clamp(f32::EPSILON, MAX_CANVAS_PIXEL_RATIO);
        let w = (width.max(0.0) * ratio).floor() as u32;
        let h = (height.max(0.0) * ratio).floor() as u32;
        self.image = PremultipliedImage::new(w, h);
        self.logical = Vec2::new(width.max(0.0), height.max(0.0));
        self.pixel_ratio = ratio;
    }

    fn size(&self) -> Vec2 {
        self.logical
    }

    fn fade(&mut self, alpha: f32) {
        let keep = 1.0 - alpha.clamp(0.0, 1.0);
        for p in self.image.pixels_mut() {
            for c in p.0.iter_mut() {
                *c *= keep;
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: Vec3, alpha: f32, width: f32) {
        if points.len() < 2 || alpha <= 0.0 {
            return;
        }
        let scale = self.pixel_ratio;
        let pts: Vec<Vec2> = points.iter().map(|p| *p * scale).collect();
        let half = (width * scale / 2.0).max(0.5);

        let (min, max) = pts
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let (w, h) = self.image.dimensions();
        for y in Self::span(min.y - half, max.y + half, h) {
            for x in Self::span(min.x - half, max.x + half, w) {
                let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                // Each pixel is painted once even where segments overlap.
                let hit = pts.windows(2).any(|s| distance_to_segment(c, s[0], s[1]) <= half);
                if hit {
                    self.add(x, y, color, alpha);
                }
            }
        }
    }

    fn fill_radial(&mut self, center: Vec2, gradient_radius: f32, clip_radius: f32, stops: &[GradientStop]) {
        let scale = self.pixel_ratio;
        let c = center * scale;
        let grad = (gradient_radius * scale).max(f32::EPSILON);
        let clip = clip_radius * scale;
        let (w, h) = self.image.dimensions();

        for y in Self::span(c.y - clip, c.y + clip, h) {
            for x in Self::span(c.x - clip, c.x + clip, w) {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(c);
                if d > clip {
                    continue;
                }
                let (color, alpha) = sample_gradient(stops, d / grad);
                if alpha > 0.0 {
                    self.add(x, y, color, alpha);
                }
            }
        }
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
