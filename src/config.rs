//! Configuration for the whole choreography.
//!
//! Every option has a default, so a TOML file only needs the fields it wants
//! to change:
//!
//! ```ignore
//! let config = Config::from_toml_str(r#"
//!     [timing]
//!     phrase_hold_ms = 1500
//!
//!     [text]
//!     lines = ["2026", "HELLO"]
//! "#)?;
//! ```
//!
//! Options are read-only while running, except the handful the quality
//! governor lowers (burst population, spawn interval, pixel ratio). Those
//! live on the components that use them, not here.

use crate::color::parse_hex;
use crate::error::ConfigError;
use crate::quality::QualityProfile;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub text: TextConfig,
    pub love_note: LoveNoteConfig,
    pub particle: ParticleConfig,
    pub heart: HeartConfig,
    pub stars: StarConfig,
    pub fireworks: FireworkConfig,
    pub renderer: RendererConfig,
}

/// Phase durations, in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause before the first countdown digit.
    pub start_delay_ms: u64,
    /// Total time each countdown digit is on screen, scatter included.
    pub countdown_step_ms: u64,
    /// Tail of each countdown step spent exploding.
    pub countdown_scatter_ms: u64,
    /// Per-character reveal gap range for progressive lines.
    pub phrase_char_min_ms: u64,
    pub phrase_char_max_ms: u64,
    pub phrase_assemble_ms: u64,
    pub phrase_hold_ms: u64,
    /// Explosion between consecutive lines.
    pub phrase_exit_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 350,
            countdown_step_ms: 900,
            countdown_scatter_ms: 300,
            phrase_char_min_ms: 120,
            phrase_char_max_ms: 180,
            phrase_assemble_ms: 640,
            phrase_hold_ms: 1200,
            phrase_exit_ms: 900,
        }
    }
}

/// Blessing lines and their colors.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub lines: Vec<String>,
    /// Reveal each line one character at a time before it assembles.
    pub progressive_lines: bool,
    pub color_a: String,
    pub color_b: String,
    pub color_c: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            lines: [
                "2026",
                "TO MY DEAR",
                "HAPPY NEW YEAR!",
                "WISHING YOU",
                "HEALTH & JOY",
                "SMOOTH DAYS",
                "MORE BEAUTIFUL",
                "GREAT PHOTOS!",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            progressive_lines: false,
            color_a: "#ffd18c".into(),
            color_b: "#f6bdd7".into(),
            color_c: "#89a7ff".into(),
        }
    }
}

/// The three text colors, parsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextColors {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl TextConfig {
    /// Parse the three color literals.
    pub fn colors(&self) -> Result<TextColors, ConfigError> {
        Ok(TextColors {
            a: color_field("text.color_a", &self.color_a)?,
            b: color_field("text.color_b", &self.color_b)?,
            c: color_field("text.color_c", &self.color_c)?,
        })
    }
}

/// The typed note shown once the heart has formed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoveNoteConfig {
    pub text: String,
    /// Lead-in between the note box appearing and its fade-in.
    pub lead_in_ms: u64,
    pub delay_ms: u64,
    pub char_ms: u64,
    pub jitter_ms: u64,
    /// Extra pause after punctuation.
    pub punctuation_pause_ms: u64,
    pub min_gap_ms: u64,
}

impl Default for LoveNoteConfig {
    fn default() -> Self {
        Self {
            text: "Lucky to have found you this year,\n\
                   and for every year that follows,\n\
                   let me walk beside you!"
                .into(),
            lead_in_ms: 140,
            delay_ms: 1100,
            char_ms: 95,
            jitter_ms: 24,
            punctuation_pause_ms: 80,
            min_gap_ms: 45,
        }
    }
}

/// Particle population and physics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_count: usize,
    pub point_size: f32,
    /// Per-frame (at 60 fps) blend toward targets.
    pub morph_lerp: f32,
    pub spawn_radius: f32,
    /// Extra random radius added to respawned slots.
    pub spawn_jitter: f32,
    pub explode_speed: f32,
    pub explode_speed_min: f32,
    pub explode_speed_max: f32,
    pub explode_drag: f32,
    pub explode_gravity: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_count: 5600,
            point_size: 2.8,
            morph_lerp: 0.13,
            spawn_radius: 48.0,
            spawn_jitter: 14.0,
            explode_speed: 2.0,
            explode_speed_min: 0.6,
            explode_speed_max: 1.3,
            explode_drag: 0.965,
            explode_gravity: 0.008,
        }
    }
}

/// Heart shape, motion and photo cards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeartConfig {
    /// Fraction of the visible frustum height the heart fills.
    pub occupy_screen_height: f32,
    pub depth: f32,
    /// Radians per second around Y.
    pub rotation_speed: f32,
    pub zoom_spread_near: f32,
    pub zoom_spread_far: f32,
    pub spread_lerp: f32,
    pub point_count: usize,
    pub photo_count: usize,
    pub photo_scale_min: f32,
    pub photo_scale_max: f32,
    pub photo_height_ratio: f32,
    pub photo_border: String,
    /// Directory holding `1.jpg`, `2.jpg`, ...
    pub photo_dir: String,
    pub photo_timeout_ms: u64,
}

impl Default for HeartConfig {
    fn default() -> Self {
        Self {
            occupy_screen_height: 0.6,
            depth: 18.0,
            rotation_speed: 0.24,
            zoom_spread_near: 1.2,
            zoom_spread_far: 0.82,
            spread_lerp: 3.4,
            point_count: 4200,
            photo_count: 24,
            photo_scale_min: 0.75,
            photo_scale_max: 1.15,
            photo_height_ratio: 0.105,
            photo_border: "#ffd8ea".into(),
            photo_dir: "assets/photos".into(),
            photo_timeout_ms: 3200,
        }
    }
}

/// Background stars.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarConfig {
    pub count: usize,
    pub size: f32,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            count: 1400,
            size: 1.15,
        }
    }
}

/// Firework launches and physics. Physics values are per 60 fps frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FireworkConfig {
    pub launch_interval_ms: u64,
    pub heart_interval_ms: u64,
    pub burst_particles: usize,
    pub burst_multiplier_min: f32,
    pub burst_multiplier_max: f32,
    pub simultaneous_bursts_intro: u32,
    pub simultaneous_bursts_heart: u32,
    pub gravity: f32,
    pub drag: f32,
    /// Alpha removed from the trail layer every frame.
    pub fade_alpha: f32,
    pub colors: Vec<String>,
}

impl Default for FireworkConfig {
    fn default() -> Self {
        Self {
            launch_interval_ms: 520,
            heart_interval_ms: 680,
            burst_particles: 44,
            burst_multiplier_min: 1.2,
            burst_multiplier_max: 2.9,
            simultaneous_bursts_intro: 2,
            simultaneous_bursts_heart: 3,
            gravity: 0.045,
            drag: 0.984,
            fade_alpha: 0.24,
            colors: ["#ffd77a", "#ff8ad8", "#6fb4ff", "#9e7bff", "#7affd4", "#ff7e7e"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl FireworkConfig {
    /// Parse the firework palette.
    pub fn palette(&self) -> Result<Vec<Vec3>, ConfigError> {
        self.colors
            .iter()
            .map(|c| color_field("fireworks.colors", c))
            .collect()
    }
}

/// Camera and pixel density.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    pub max_pixel_ratio: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub camera_distance: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            fov_degrees: 45.0,
            camera_distance: 220.0,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check colors and ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.text.colors()?;
        color_field("heart.photo_border", &self.heart.photo_border)?;
        if self.fireworks.palette()?.is_empty() {
            return Err(invalid("fireworks.colors", "palette is empty"));
        }
        if self.particle.max_count == 0 {
            return Err(invalid("particle.max_count", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.particle.morph_lerp) || self.particle.morph_lerp == 0.0 {
            return Err(invalid("particle.morph_lerp", "must be in (0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.particle.explode_drag) {
            return Err(invalid("particle.explode_drag", "must be in [0, 1]"));
        }
        if self.particle.explode_speed_min > self.particle.explode_speed_max {
            return Err(invalid("particle.explode_speed_min", "exceeds explode_speed_max"));
        }
        if self.timing.countdown_scatter_ms > self.timing.countdown_step_ms {
            return Err(invalid("timing.countdown_scatter_ms", "exceeds countdown_step_ms"));
        }
        if self.timing.phrase_char_min_ms > self.timing.phrase_char_max_ms {
            return Err(invalid("timing.phrase_char_min_ms", "exceeds phrase_char_max_ms"));
        }
        if self.heart.photo_scale_min > self.heart.photo_scale_max {
            return Err(invalid("heart.photo_scale_min", "exceeds photo_scale_max"));
        }
        if self.fireworks.burst_multiplier_min > self.fireworks.burst_multiplier_max {
            return Err(invalid("fireworks.burst_multiplier_min", "exceeds burst_multiplier_max"));
        }
        if !(self.renderer.fov_degrees > 0.0 && self.renderer.fov_degrees < 180.0) {
            return Err(invalid("renderer.fov_degrees", "must be in (0, 180)"));
        }
        Ok(())
    }

    /// Apply a quality profile's population scales.
    ///
    /// Counts are floored; the particle cap never drops to zero.
    pub fn scaled(&self, profile: &QualityProfile) -> Self {
        let scale = |n: usize, s: f32| (n as f32 * s).floor() as usize;
        let mut out = self.clone();
        out.particle.max_count = scale(self.particle.max_count, profile.particle_scale).max(1);
        out.heart.point_count = scale(self.heart.point_count, profile.particle_scale);
        out.stars.count = scale(self.stars.count, profile.star_scale);
        out.fireworks.burst_particles = scale(self.fireworks.burst_particles, profile.firework_scale);
        out
    }
}

fn color_field(field: &'static str, value: &str) -> Result<Vec3, ConfigError> {
    parse_hex(value).ok_or_else(|| ConfigError::InvalidColor {
        field,
        value: value.to_string(),
    })
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}
