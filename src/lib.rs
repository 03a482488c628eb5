//! # Heartburst - particle choreography engine
//!
//! A scripted light show on a point-sprite particle field: a countdown and
//! a series of lines morph out of the particles, each scene scatters in an
//! explosion, and the finale folds the particles into a rotating 3D heart
//! carrying photo cards, under a sky of 2D fireworks and a typed note.
//!
//! Heartburst owns the simulation and the timing. Drawing is left to the
//! host through two small traits: [`PointRenderer`] receives the point
//! buffers every frame, and [`Canvas2d`] takes the firework draw calls.
//! [`RasterCanvas`] is a software canvas for headless use.
//!
//! ## Quick Start
//!
//! ```ignore
//! use heartburst::prelude::*;
//!
//! let config = Config::load("heartburst.toml")?;
//! let mut show = Experience::builder(config)
//!     .with_viewport(Viewport::new(1280.0, 720.0, 2.0))
//!     .build(BitmapFont, 0.0)?;
//!
//! let mut canvas = RasterCanvas::new(1280.0, 720.0, 1.5);
//! let mut now = 0.0;
//! while !show.is_finished() {
//!     show.frame(now, &mut renderer, &mut canvas);
//!     now += 1000.0 / 60.0;
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particle field
//!
//! A fixed-capacity buffer of points. Each point chases a target; setting
//! a new target cloud (text, heart) morphs the field into it. Slots beyond
//! the cloud are parked far away at a sentinel position.
//!
//! | Mode | Behavior |
//! |------|----------|
//! | `Idle` | Points hold still |
//! | `Morphing` | Points ease toward their targets |
//! | `Exploding` | Points fly outward with drag and gravity until a deadline |
//! | `HeartSteady` | Like `Morphing`, with heart-sized material |
//!
//! ### Script
//!
//! The show is a flat list of cues and waits built from [`Config`] and run
//! by a [`Sequencer`] from the frame loop. Waits never block a frame.
//!
//! ### Quality
//!
//! A device score picks a [`QualityTier`] at startup, scaling particle,
//! star and firework populations. While running, the [`QualityGovernor`]
//! watches the frame rate and downshifts at most twice.
//!
//! ## Logging
//!
//! Everything logs through `tracing`. Install a subscriber in the host to
//! see tier detection, phase changes, downshifts and texture fallbacks.

pub mod camera;
pub mod cards;
pub mod color;
pub mod config;
pub mod error;
pub mod experience;
pub mod fireworks;
pub mod heart;
pub mod particles;
pub mod quality;
pub mod scatter;
pub mod sequencer;
pub mod stars;
pub mod text;
pub mod textures;
pub mod time;

pub use bytemuck;
pub use glam::{Vec2, Vec3};

pub use camera::CameraRig;
pub use config::Config;
pub use error::{ConfigError, InitError, SequenceError, SurfaceError, TextureError};
pub use experience::{Experience, ExperienceBuilder, PointFrame, PointLayer, PointRenderer, Viewport};
pub use fireworks::{BurstKind, Canvas2d, FireworkShow, RasterCanvas, Stage};
pub use particles::{ParticleField, ParticleMode, PointMaterial, Tint};
pub use quality::{DeviceSignals, QualityGovernor, QualityProfile, QualityTier};
pub use sequencer::{Cue, Director, Script, Sequencer, Step};
pub use text::{BitmapFont, GlyphLayout, GlyphSurface, TextRasterizer};
pub use textures::{ImageFileProvider, Texture, TextureProvider};

/// Everything a host needs in one import.
pub mod prelude {
    pub use crate::camera::CameraRig;
    pub use crate::config::Config;
    pub use crate::error::{InitError, SequenceError};
    pub use crate::experience::{Experience, PointFrame, PointLayer, PointRenderer, Viewport};
    pub use crate::fireworks::{Canvas2d, RasterCanvas, Stage};
    pub use crate::particles::{ParticleMode, PointMaterial};
    pub use crate::quality::DeviceSignals;
    pub use crate::text::{BitmapFont, GlyphSurface};
    pub use crate::textures::{ImageFileProvider, Texture, TextureProvider};
    pub use crate::Vec2;
    pub use crate::Vec3;
}
