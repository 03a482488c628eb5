//! Photo textures, placeholders and background preloading.
//!
//! Photos come from a [`TextureProvider`]. Loading runs off the frame loop:
//! [`PhotoPreload`] starts one loader per photo and the caller polls it once
//! per frame. Every slot resolves exactly once, to the loaded image or, on
//! error or after the timeout, to a generated placeholder card. A source
//! that failed is never retried.
//!
//! # Quick Start
//!
//! ```ignore
//! let provider: Arc<dyn TextureProvider> = Arc::new(ImageFileProvider);
//! let paths = photo_paths("assets/photos", 24);
//! let mut preload = PhotoPreload::start(provider, paths, now_ms, 3200);
//!
//! // every frame
//! if preload.poll(now_ms) {
//!     let textures = preload.take_textures();
//! }
//! ```
//!
//! # Supported Formats
//!
//! - PNG
//! - JPEG

use crate::error::TextureError;
use crate::fireworks::canvas::{sample_gradient, GradientStop};
use crate::text::{BitmapFont, TextAlign};
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use glam::Vec3;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Placeholder card size.
pub const PLACEHOLDER_WIDTH: u32 = 256;
pub const PLACEHOLDER_HEIGHT: u32 = 356;

const PLACEHOLDER_TOP: [u8; 3] = [0x20, 0x33, 0x5f];
const PLACEHOLDER_BOTTOM: [u8; 3] = [0x0d, 0x16, 0x30];
const PLACEHOLDER_LABEL: [u8; 4] = [0xe8, 0xf1, 0xff, 0xff];
const PLACEHOLDER_BORDER_ALPHA: f32 = 0.2;
const PLACEHOLDER_BORDER_INSET: f32 = 10.0;
const PLACEHOLDER_BORDER_WIDTH: f32 = 4.0;
const PLACEHOLDER_FONT_SIZE: f32 = 40.0;

/// Point sprite size.
const SPRITE_SIZE: u32 = 64;

/// Where a texture came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureOrigin {
    /// Loaded from this source.
    Photo(PathBuf),
    /// Generated stand-in labeled with this number.
    Placeholder(usize),
    /// Generated procedurally.
    Generated,
}

/// An RGBA image ready for upload.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: RgbaImage,
    pub origin: TextureOrigin,
}

impl Texture {
    /// Decode an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path)?.into_rgba8();
        Ok(Self {
            image,
            origin: TextureOrigin::Photo(path.to_path_buf()),
        })
    }

    /// A single-color texture.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
            origin: TextureOrigin::Generated,
        }
    }

    /// Gradient card standing in for photo `label`.
    ///
    /// The same label always gives the same pixels.
    pub fn placeholder(label: usize) -> Self {
        let (w, h) = (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
        let mut image = RgbaImage::from_fn(w, h, |_, y| {
            let t = (y as f32 + 0.5) / h as f32;
            Rgba([
                lerp_u8(PLACEHOLDER_TOP[0], PLACEHOLDER_BOTTOM[0], t),
                lerp_u8(PLACEHOLDER_TOP[1], PLACEHOLDER_BOTTOM[1], t),
                lerp_u8(PLACEHOLDER_TOP[2], PLACEHOLDER_BOTTOM[2], t),
                255,
            ])
        });

        // Stroke centered on the inset rectangle.
        let half = PLACEHOLDER_BORDER_WIDTH / 2.0;
        let outer = PLACEHOLDER_BORDER_INSET - half;
        let inner = PLACEHOLDER_BORDER_INSET + half;
        for (x, y, px) in image.enumerate_pixels_mut() {
            let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
            let edge_x = cx.min(w as f32 - cx);
            let edge_y = cy.min(h as f32 - cy);
            let in_outer = edge_x >= outer && edge_y >= outer;
            let in_inner = edge_x >= inner && edge_y >= inner;
            if in_outer && !in_inner {
                for c in px.0.iter_mut().take(3) {
                    *c = lerp_u8(*c, 255, PLACEHOLDER_BORDER_ALPHA);
                }
            }
        }

        let label_text = label.to_string();
        if let Err(err) = BitmapFont.draw(
            &mut image,
            &label_text,
            w as f32 / 2.0,
            h as f32 / 2.0,
            PLACEHOLDER_FONT_SIZE,
            TextAlign::Center,
            PLACEHOLDER_LABEL,
        ) {
            debug!(%err, label, "placeholder label skipped");
        }

        Self {
            image,
            origin: TextureOrigin::Placeholder(label),
        }
    }

    /// Soft round sprite for drawing particles.
    pub fn point_sprite() -> Self {
        let stops = [
            GradientStop::new(0.0, Vec3::ONE, 1.0),
            GradientStop::new(0.35, Vec3::new(1.0, 244.0 / 255.0, 225.0 / 255.0), 0.85),
            GradientStop::new(1.0, Vec3::new(1.0, 230.0 / 255.0, 180.0 / 255.0), 0.0),
        ];
        let center = SPRITE_SIZE as f32 / 2.0;
        let (inner, outer) = (2.0, center);
        let image = RgbaImage::from_fn(SPRITE_SIZE, SPRITE_SIZE, |x, y| {
            let d = ((x as f32 + 0.5 - center).powi(2) + (y as f32 + 0.5 - center).powi(2)).sqrt();
            let (color, alpha) = sample_gradient(&stops, (d - inner) / (outer - inner));
            Rgba(crate::color::to_rgba8(color, alpha))
        });
        Self {
            image,
            origin: TextureOrigin::Generated,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, TextureOrigin::Placeholder(_))
    }
}

/// Helper function for linear interpolation of u8 values.
fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round() as u8
}

/// Source of photo textures. Called from loader threads.
pub trait TextureProvider: Send + Sync {
    fn load(&self, path: &Path) -> Result<Texture, TextureError>;
}

/// Loads photos from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileProvider;

impl TextureProvider for ImageFileProvider {
    fn load(&self, path: &Path) -> Result<Texture, TextureError> {
        Texture::from_file(path)
    }
}

/// `dir/1.jpg` through `dir/{count}.jpg`.
pub fn photo_paths<P: AsRef<Path>>(dir: P, count: usize) -> Vec<PathBuf> {
    (1..=count)
        .map(|i| dir.as_ref().join(format!("{i}.jpg")))
        .collect()
}

type LoadResult = (usize, Result<Texture, TextureError>);

/// Photos loading in the background, each with a shared deadline.
pub struct PhotoPreload {
    slots: Vec<Option<Texture>>,
    receiver: Receiver<LoadResult>,
    deadline_ms: f64,
    timeout_ms: u64,
}

impl PhotoPreload {
    /// Start loading every path on its own thread.
    ///
    /// Slot `i` falls back to a placeholder labeled `i + 1`.
    pub fn start(provider: Arc<dyn TextureProvider>, paths: Vec<PathBuf>, now_ms: f64, timeout_ms: u64) -> Self {
        let (sender, receiver) = unbounded();
        let slots = (0..paths.len()).map(|_| None).collect();

        for (index, path) in paths.into_iter().enumerate() {
            let provider = Arc::clone(&provider);
            let sender = sender.clone();
            std::thread::spawn(move || {
                let result = provider.load(&path);
                // The preload may have been dropped or timed out already.
                let _ = sender.send((index, result));
            });
        }
        debug!(timeout_ms, "photo preload started");

        Self {
            slots,
            receiver,
            deadline_ms: now_ms + timeout_ms as f64,
            timeout_ms,
        }
    }

    /// Number of photos being loaded.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots resolved so far.
    pub fn resolved(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Collect finished loads and apply the deadline. Returns `true` once
    /// every slot has resolved.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok((index, result)) => {
                    let texture = match result {
                        Ok(texture) => texture,
                        Err(err) => {
                            warn!(index, %err, "photo failed to load, using placeholder");
                            Texture::placeholder(index + 1)
                        }
                    };
                    if let Some(slot) = self.slots.get_mut(index) {
                        if slot.is_none() {
                            *slot = Some(texture);
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.fill_missing(&TextureError::Disconnected);
                    break;
                }
            }
        }

        if now_ms >= self.deadline_ms {
            self.fill_missing(&TextureError::Timeout(self.timeout_ms));
        }
        self.is_complete()
    }

    fn fill_missing(&mut self, err: &TextureError) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                warn!(index, %err, "photo unavailable, using placeholder");
                *slot = Some(Texture::placeholder(index + 1));
            }
        }
    }

    /// Take the resolved textures in slot order. Unresolved slots are
    /// skipped, so call this after [`poll`](Self::poll) returned `true`.
    pub fn take_textures(&mut self) -> Vec<Texture> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}
