//! The frame loop tying every component together.
//!
//! An [`Experience`] owns the particle field, starfield, fireworks, camera,
//! photo preload and the script. The host calls [`Experience::frame`] once
//! per display frame with its own timestamp; everything else (phase
//! changes, downshifts, heart motion) happens inside that call.
//!
//! # Frame order
//!
//! | Step | What |
//! |------|------|
//! | 1 | Frame clock tick, `dt` clamped to 50 ms |
//! | 2 | Quality governor samples the frame, maybe downshifts |
//! | 3 | Script advances; due cues are applied |
//! | 4 | Particles integrate |
//! | 5 | Stars rotate |
//! | 6 | Heart spread, spin and card wobble (heart stage only) |
//! | 7 | Fireworks fade, spawn, integrate and draw |
//! | 8 | Stars and particles are submitted to the renderer |
//!
//! ```ignore
//! let mut experience = Experience::builder(Config::default())
//!     .with_viewport(Viewport::new(1280.0, 720.0, 2.0))
//!     .with_seed(7)
//!     .build(BitmapFont, now_ms)?;
//!
//! let mut canvas = RasterCanvas::new(1280.0, 720.0, 1.5);
//! loop {
//!     experience.frame(host_now_ms(), &mut renderer, &mut canvas);
//! }
//! ```

use crate::camera::CameraRig;
use crate::cards::{layout_cards, CardPose, HeartMotion, PhotoCard};
use crate::config::{Config, TextColors};
use crate::error::{InitError, SequenceError};
use crate::fireworks::{Canvas2d, FireworkShow, Stage, MAX_CANVAS_PIXEL_RATIO};
use crate::heart::{build_points, generate_anchors, HeartMetrics};
use crate::particles::{ParticleField, ParticleMode, PointMaterial, Tint};
use crate::quality::{DeviceSignals, QualityGovernor, QualityProfile};
use crate::scatter::Scatter;
use crate::sequencer::{Cue, Director, Script, Sequencer, SequencerState};
use crate::stars::Starfield;
use crate::text::{BitmapFont, GlyphLayout, GlyphSurface, TextFrame, TextRasterizer};
use crate::textures::{photo_paths, ImageFileProvider, PhotoPreload, Texture, TextureProvider};
use crate::time::FrameClock;
use glam::{Vec2, Vec3};
use std::sync::Arc;
use tracing::{debug, info};

/// Drawable area in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Pixel ratio for the firework canvas.
    pub fn canvas_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(MAX_CANVAS_PIXEL_RATIO)
    }

    fn validate(&self) -> Result<(), InitError> {
        let drawable = |v: f32| v.is_finite() && v > 0.0;
        if drawable(self.width) && drawable(self.height) {
            Ok(())
        } else {
            Err(InitError::Viewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

/// Which point set a [`PointFrame`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLayer {
    Stars,
    Particles,
}

/// One point set ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct PointFrame<'a> {
    pub layer: PointLayer,
    /// xyz triples for the whole buffer.
    pub positions: &'a [f32],
    /// rgb triples for the whole buffer.
    pub colors: &'a [f32],
    /// Points to draw, from the start of the buffer.
    pub draw_count: usize,
    pub material: PointMaterial,
    /// Group rotation around X and Y, radians.
    pub rotation: Vec2,
}

/// Host-side 3D point-sprite renderer.
pub trait PointRenderer {
    fn submit(&mut self, frame: &PointFrame<'_>);
}

/// The typed note shown under the heart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteState {
    /// The note box is on screen.
    pub open: bool,
    /// The note has faded in.
    pub shown: bool,
    /// Characters revealed so far.
    pub revealed: usize,
}

struct HeartScene {
    metrics: HeartMetrics,
    motion: HeartMotion,
    cards: Vec<PhotoCard>,
    tint: Tint,
}

/// Everything a cue can touch. Kept apart from the sequencer so the
/// sequencer can borrow it as its director.
struct Scene<S: GlyphSurface> {
    config: Config,
    colors: TextColors,
    viewport: Viewport,
    camera: CameraRig,
    governor: QualityGovernor,
    rasterizer: TextRasterizer<S>,
    field: ParticleField,
    stars: Starfield,
    fireworks: FireworkShow,
    preload: PhotoPreload,
    textures: Vec<Texture>,
    heart: Option<HeartScene>,
    status: Option<String>,
    note: NoteState,
    pixel_ratio: f32,
    time_secs: f32,
    rng: Scatter,
}

impl<S: GlyphSurface> Scene<S> {
    fn show_glyphs(
        &mut self,
        text: &str,
        layout: &GlyphLayout,
        tint: Tint,
        pulse: f32,
    ) -> Result<(), SequenceError> {
        let frame = TextFrame {
            size_hint: self.viewport.width.min(self.viewport.height),
            visible_height: self.camera.visible_height(),
        };
        let points = self
            .rasterizer
            .rasterize(text, layout, &frame)
            .map_err(|source| SequenceError::Rasterize {
                text: text.to_string(),
                source,
            })?;
        if points.is_empty() {
            debug!(text, "no coverage, particles park");
        }

        self.field.set_targets(&points, Some(tint));
        self.field.set_material(self.field.text_material());
        self.field.set_mode(ParticleMode::Morphing);
        self.field.set_pulse(pulse);
        Ok(())
    }

    fn enter_heart(&mut self) -> Result<(), SequenceError> {
        if self.heart.is_some() {
            return Err(SequenceError::InvalidCue("enter_heart"));
        }
        self.textures = self.preload.take_textures();

        let tint = Tint::new(self.colors.a, self.colors.c);
        let (metrics, points, cards) = self.lay_out_heart(tint);
        let heart = HeartScene {
            metrics,
            motion: HeartMotion::new(points),
            cards,
            tint,
        };
        self.field.set_mode(ParticleMode::HeartSteady);
        self.field.set_material(self.field.heart_material());
        self.status = None;

        let interval = self
            .governor
            .scaled_interval_ms(self.config.fireworks.heart_interval_ms as f64);
        self.fireworks.set_stage(Stage::Heart, interval);
        self.camera.frame_heart(heart.metrics.height);

        info!(
            height = heart.metrics.height,
            cards = heart.cards.len(),
            placeholders = self.textures.iter().filter(|t| t.is_placeholder()).count(),
            "heart formed"
        );
        self.heart = Some(heart);
        Ok(())
    }

    /// Heart points, anchors and cards sized for the current camera. The
    /// points also become the particle targets.
    fn lay_out_heart(&mut self, tint: Tint) -> (HeartMetrics, Vec<Vec3>, Vec<PhotoCard>) {
        let heart = &self.config.heart;
        let metrics = HeartMetrics::compute(
            self.camera.distance,
            self.camera.fov_degrees,
            heart.occupy_screen_height,
        );
        let points = build_points(&metrics, heart.depth, heart.point_count, &mut self.rng);
        self.field.set_targets(&points, Some(tint));

        let anchors = generate_anchors(&metrics, heart.depth, self.textures.len(), &mut self.rng);
        let cards = layout_cards(&anchors, &metrics, heart, &mut self.rng);
        (metrics, points, cards)
    }

    /// Re-lay the heart for the current camera, keeping its spin.
    fn rebuild_heart(&mut self) {
        let Some(tint) = self.heart.as_ref().map(|h| h.tint) else {
            return;
        };
        let (metrics, points, cards) = self.lay_out_heart(tint);
        if let Some(heart) = &mut self.heart {
            heart.motion.rebuild(points);
            heart.metrics = metrics;
            heart.cards = cards;
            debug!(height = metrics.height, "heart rebuilt for new viewport");
        }
    }

    fn sample_quality(&mut self, dt: f32, now_ms: f64) {
        if let Some(shift) = self.governor.observe_frame(dt, now_ms) {
            self.fireworks.apply_downshift(&shift);
            self.pixel_ratio = shift.pixel_ratio(self.pixel_ratio);
        }
    }

    fn update<C: Canvas2d + ?Sized>(&mut self, dt: f32, now_ms: f64, canvas: &mut C) {
        self.field.update(dt, now_ms);
        self.stars.update(dt);

        self.time_secs = (now_ms * 0.001) as f32;
        if let Some(heart) = &mut self.heart {
            heart
                .motion
                .update(dt, self.camera.zoom_fraction(), &self.config.heart);
            self.field
                .set_spread_targets(heart.motion.base_targets(), heart.motion.spread());
        }

        self.fireworks.tick(dt, now_ms, canvas);
    }

    fn submit<R: PointRenderer + ?Sized>(&self, renderer: &mut R) {
        renderer.submit(&PointFrame {
            layer: PointLayer::Stars,
            positions: self.stars.position_floats(),
            colors: self.stars.color_floats(),
            draw_count: self.stars.len(),
            material: self.stars.material(),
            rotation: self.stars.rotation(),
        });

        let buffer = self.field.buffer();
        let rotation_y = self.heart.as_ref().map_or(0.0, |h| h.motion.rotation_y());
        renderer.submit(&PointFrame {
            layer: PointLayer::Particles,
            positions: buffer.position_floats(),
            colors: buffer.color_floats(),
            draw_count: buffer.active_count(),
            material: self.field.material(),
            rotation: Vec2::new(0.0, rotation_y),
        });
    }
}

impl<S: GlyphSurface> Director for Scene<S> {
    fn perform(&mut self, cue: &Cue, now_ms: f64) -> Result<(), SequenceError> {
        match cue {
            Cue::ShowGlyphs {
                text,
                layout,
                tint,
                pulse,
            } => self.show_glyphs(text, layout, *tint, *pulse)?,
            Cue::Explode { duration_ms } => self.field.explode(*duration_ms, now_ms),
            Cue::Status(status) => self.status = status.clone(),
            Cue::AwaitPhotos => {
                debug!(
                    resolved = self.preload.resolved(),
                    total = self.preload.len(),
                    "waiting for photos"
                );
            }
            Cue::EnterHeart => self.enter_heart()?,
            Cue::OpenNote => self.note.open = true,
            Cue::ShowNote => {
                if !self.note.open {
                    return Err(SequenceError::InvalidCue("show_note"));
                }
                self.note.shown = true;
            }
            Cue::RevealNote { chars } => {
                if !self.note.open {
                    return Err(SequenceError::InvalidCue("reveal_note"));
                }
                self.note.revealed = *chars;
            }
        }
        Ok(())
    }

    fn photos_ready(&mut self, now_ms: f64) -> bool {
        self.preload.poll(now_ms)
    }
}

/// Builder for [`Experience`].
pub struct ExperienceBuilder {
    config: Config,
    viewport: Viewport,
    signals: Option<DeviceSignals>,
    provider: Arc<dyn TextureProvider>,
    seed: Option<u64>,
}

impl ExperienceBuilder {
    /// Set the initial viewport.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Use these device signals instead of querying the host.
    pub fn with_device(mut self, signals: DeviceSignals) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Load photos through `provider`.
    pub fn with_provider(mut self, provider: Arc<dyn TextureProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Seed every random choice, making the show reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the setup, start loading photos and schedule the script
    /// from `now_ms`.
    pub fn build<S: GlyphSurface>(self, surface: S, now_ms: f64) -> Result<Experience<S>, InitError> {
        self.viewport.validate()?;
        self.config.validate()?;

        let signals = self.signals.unwrap_or_else(DeviceSignals::from_host);
        let profile = QualityProfile::detect(&signals);
        let config = self.config.scaled(&profile);
        let colors = config.text.colors()?;

        let mut rng = self.seed.map_or_else(Scatter::from_entropy, Scatter::seeded);

        let mut rasterizer = TextRasterizer::new(surface, profile.sample_step, config.particle.max_count);
        rasterizer.check_surface()?;

        let field = ParticleField::new(&config.particle, rng.fork());
        let stars = Starfield::new(&config.stars, &mut rng);
        let fireworks = FireworkShow::new(&config.fireworks, rng.fork())?;
        let camera = CameraRig::new(config.renderer.camera_distance, config.renderer.fov_degrees);

        let preload = PhotoPreload::start(
            self.provider,
            photo_paths(&config.heart.photo_dir, config.heart.photo_count),
            now_ms,
            config.heart.photo_timeout_ms,
        );

        let script = Script::build(&config, &mut rng)?;
        info!(
            particles = config.particle.max_count,
            stars = config.stars.count,
            sample_step = profile.sample_step,
            steps = script.len(),
            "experience ready"
        );

        let pixel_ratio = self
            .viewport
            .device_pixel_ratio
            .min(config.renderer.max_pixel_ratio * profile.pixel_ratio_scale);

        Ok(Experience {
            clock: FrameClock::new(now_ms),
            sequencer: Sequencer::new(script, now_ms),
            scene: Scene {
                colors,
                viewport: self.viewport,
                camera,
                governor: QualityGovernor::new(profile, now_ms),
                rasterizer,
                field,
                stars,
                fireworks,
                preload,
                textures: Vec::new(),
                heart: None,
                status: None,
                note: NoteState::default(),
                pixel_ratio,
                time_secs: (now_ms * 0.001) as f32,
                rng,
                config,
            },
        })
    }
}

/// The running show.
pub struct Experience<S: GlyphSurface> {
    clock: FrameClock,
    sequencer: Sequencer,
    scene: Scene<S>,
}

impl Experience<BitmapFont> {
    /// Start configuring an experience. The glyph surface is chosen at
    /// [`ExperienceBuilder::build`].
    pub fn builder(config: Config) -> ExperienceBuilder {
        ExperienceBuilder {
            config,
            viewport: Viewport::default(),
            signals: None,
            provider: Arc::new(ImageFileProvider),
            seed: None,
        }
    }
}

impl<S: GlyphSurface> Experience<S> {
    /// Run one frame at host time `now_ms`.
    pub fn frame<R, C>(&mut self, now_ms: f64, renderer: &mut R, canvas: &mut C)
    where
        R: PointRenderer + ?Sized,
        C: Canvas2d + ?Sized,
    {
        let dt = self.clock.tick(now_ms);
        self.scene.sample_quality(dt, now_ms);
        self.sequencer.advance(now_ms, &mut self.scene);
        self.scene.update(dt, now_ms, canvas);
        self.scene.submit(renderer);
    }

    /// Apply a new viewport. The heart, if formed, is rebuilt for it.
    pub fn resize<C: Canvas2d + ?Sized>(&mut self, viewport: Viewport, canvas: &mut C) -> Result<(), InitError> {
        viewport.validate()?;
        let scene = &mut self.scene;
        scene.viewport = viewport;
        canvas.resize(viewport.width, viewport.height, viewport.canvas_pixel_ratio());

        let scale = scene.governor.profile().pixel_ratio_scale;
        scene.pixel_ratio = viewport
            .device_pixel_ratio
            .min(scene.config.renderer.max_pixel_ratio * scale);

        scene.rebuild_heart();
        Ok(())
    }

    /// Pixel ratio the point renderer should use.
    pub fn pixel_ratio(&self) -> f32 {
        self.scene.pixel_ratio
    }

    pub fn viewport(&self) -> Viewport {
        self.scene.viewport
    }

    /// Scaled configuration in effect.
    pub fn config(&self) -> &Config {
        &self.scene.config
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn sequencer_state(&self) -> &SequencerState {
        self.sequencer.state()
    }

    /// Whether the whole script has run.
    pub fn is_finished(&self) -> bool {
        self.sequencer.is_finished()
    }

    pub fn stage(&self) -> Stage {
        self.scene.fireworks.stage()
    }

    /// Status line to show, if any.
    pub fn status(&self) -> Option<&str> {
        self.scene.status.as_deref()
    }

    pub fn note(&self) -> &NoteState {
        &self.scene.note
    }

    /// The part of the love note revealed so far.
    pub fn love_note_text(&self) -> &str {
        let text = &self.scene.config.love_note.text;
        let end = text
            .char_indices()
            .nth(self.scene.note.revealed)
            .map_or(text.len(), |(i, _)| i);
        &text[..end]
    }

    pub fn camera(&self) -> &CameraRig {
        &self.scene.camera
    }

    /// Host input goes through here, e.g. `camera_mut().zoom_to(d)`.
    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.scene.camera
    }

    pub fn particles(&self) -> &ParticleField {
        &self.scene.field
    }

    pub fn stars(&self) -> &Starfield {
        &self.scene.stars
    }

    pub fn fireworks(&self) -> &FireworkShow {
        &self.scene.fireworks
    }

    pub fn governor(&self) -> &QualityGovernor {
        &self.scene.governor
    }

    /// Photo textures, available once the heart has formed.
    pub fn textures(&self) -> &[Texture] {
        &self.scene.textures
    }

    pub fn cards(&self) -> &[PhotoCard] {
        self.scene.heart.as_ref().map_or(&[], |h| &h.cards)
    }

    /// Card poses for the current frame, in card order.
    pub fn card_poses(&self) -> Vec<CardPose> {
        let Some(heart) = &self.scene.heart else {
            return Vec::new();
        };
        heart
            .cards
            .iter()
            .map(|card| heart.motion.card_pose(card, self.scene.time_secs))
            .collect()
    }

    /// Heart group rotation around Y, 0 before the heart forms.
    pub fn heart_rotation(&self) -> f32 {
        self.scene.heart.as_ref().map_or(0.0, |h| h.motion.rotation_y())
    }
}
