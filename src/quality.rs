//! Device-tiered quality profile and frame-rate driven downshifting.
//!
//! At startup a [`QualityProfile`] is picked from coarse device signals
//! (core count, pointer type, pixel density). While running, the
//! [`QualityGovernor`] measures frame rate over 1.6 s windows and, when it
//! drops below 32 fps, emits a [`Downshift`] that the caller applies to the
//! firework simulator and the renderer. At most two downshifts happen per
//! session and nothing ever shifts back up.
//!
//! | Tier | Score | Particles | Stars | Fireworks | Pixel ratio | Raster stride |
//! |------|-------|-----------|-------|-----------|-------------|---------------|
//! | Low | < 3.8 | 0.56 | 0.66 | 0.58 | 0.86 | 5 |
//! | Medium | < 6.8 | 0.78 | 0.82 | 0.80 | 0.95 | 4 |
//! | High | else | 1.0 | 1.0 | 1.0 | 1.0 | 3 |

use tracing::{debug, info};

/// Length of one frame-rate sampling window.
pub const SAMPLE_WINDOW_MS: f64 = 1600.0;
/// Windows averaging below this rate trigger a downshift.
pub const MIN_FPS: f32 = 32.0;
/// Downshift cap per session.
pub const MAX_DOWNSHIFTS: u32 = 2;

const BURST_FACTOR: f32 = 0.78;
const BURST_FLOOR: usize = 24;
const INTERVAL_FACTOR: f64 = 1.18;
const INTERVAL_CAP_MS: f64 = 1900.0;
const PIXEL_RATIO_FACTOR: f32 = 0.88;

/// What the host knows about the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSignals {
    /// Logical CPU count, if the platform reports one.
    pub cores: Option<u32>,
    /// Coarse pointer (touch screen), used as a proxy for mobile.
    pub coarse_pointer: bool,
    /// Device pixel ratio.
    pub pixel_ratio: f32,
}

impl DeviceSignals {
    /// Signals for the machine this process runs on: reported parallelism,
    /// fine pointer, pixel ratio 1.
    pub fn from_host() -> Self {
        Self {
            cores: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get() as u32),
            coarse_pointer: false,
            pixel_ratio: 1.0,
        }
    }

    /// Combined capability score. Unknown core counts count as 4.
    pub fn score(&self) -> f32 {
        let cores = self.cores.unwrap_or(4) as f32;
        let pointer = if self.coarse_pointer { 0.88 } else { 1.18 };
        let density = if self.pixel_ratio > 2.0 { 1.25 } else { 1.0 };
        cores * pointer / density
    }
}

/// One of three fixed fidelity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    /// Map a capability score onto a tier.
    pub fn from_score(score: f32) -> Self {
        if score < 3.8 {
            Self::Low
        } else if score < 6.8 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Scale factors for this tier.
    pub fn profile(self) -> QualityProfile {
        match self {
            Self::Low => QualityProfile {
                particle_scale: 0.56,
                star_scale: 0.66,
                firework_scale: 0.58,
                pixel_ratio_scale: 0.86,
                sample_step: 5,
            },
            Self::Medium => QualityProfile {
                particle_scale: 0.78,
                star_scale: 0.82,
                firework_scale: 0.8,
                pixel_ratio_scale: 0.95,
                sample_step: 4,
            },
            Self::High => QualityProfile {
                particle_scale: 1.0,
                star_scale: 1.0,
                firework_scale: 1.0,
                pixel_ratio_scale: 1.0,
                sample_step: 3,
            },
        }
    }
}

/// Population and density scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    pub particle_scale: f32,
    pub star_scale: f32,
    pub firework_scale: f32,
    pub pixel_ratio_scale: f32,
    /// Grid stride, in raster pixels, used when sampling glyphs.
    pub sample_step: u32,
}

impl QualityProfile {
    /// Pick the profile for a device.
    pub fn detect(signals: &DeviceSignals) -> Self {
        let score = signals.score();
        let tier = QualityTier::from_score(score);
        info!(?tier, score, "detected quality tier");
        tier.profile()
    }
}

/// A single, irreversible step down in runtime quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Downshift {
    /// 1 for the first downshift of the session, 2 for the second.
    pub ordinal: u32,
    /// Frame rate measured over the window that triggered it.
    pub measured_fps: f32,
}

impl Downshift {
    /// New firework burst population: 22% fewer, never below 24.
    pub fn burst_particles(&self, current: usize) -> usize {
        ((current as f32 * BURST_FACTOR).floor() as usize).max(BURST_FLOOR)
    }

    /// New firework spawn interval: 18% longer, capped at 1900 ms.
    pub fn spawn_interval_ms(&self, current: f64) -> f64 {
        (current * INTERVAL_FACTOR).floor().min(INTERVAL_CAP_MS)
    }

    /// New renderer pixel ratio: 12% lower, never below 1.
    pub fn pixel_ratio(&self, current: f32) -> f32 {
        (current * PIXEL_RATIO_FACTOR).max(1.0)
    }
}

/// Watches frame timing and decides when to downshift.
#[derive(Debug, Clone)]
pub struct QualityGovernor {
    profile: QualityProfile,
    frames: u32,
    elapsed_secs: f32,
    last_check_ms: f64,
    downshifts: u32,
}

impl QualityGovernor {
    /// Start governing with the startup profile.
    ///
    /// `start_ms` is the host timestamp the session started at; the first
    /// window closes [`SAMPLE_WINDOW_MS`] after it.
    pub fn new(profile: QualityProfile, start_ms: f64) -> Self {
        Self {
            profile,
            frames: 0,
            elapsed_secs: 0.0,
            last_check_ms: start_ms,
            downshifts: 0,
        }
    }

    /// Current profile, including any downshifts applied so far.
    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    /// Downshifts applied this session.
    pub fn downshifts(&self) -> u32 {
        self.downshifts
    }

    /// Record one frame.
    ///
    /// * `dt` - seconds since the previous frame
    /// * `now_ms` - current timestamp in milliseconds
    ///
    /// Returns a downshift when a window just closed below [`MIN_FPS`] and
    /// the session cap has not been reached.
    pub fn observe_frame(&mut self, dt: f32, now_ms: f64) -> Option<Downshift> {
        self.frames += 1;
        self.elapsed_secs += dt;

        if now_ms - self.last_check_ms < SAMPLE_WINDOW_MS {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed_secs.max(0.001);
        self.frames = 0;
        self.elapsed_secs = 0.0;
        self.last_check_ms = now_ms;
        debug!(fps, "frame rate window closed");

        if fps >= MIN_FPS || self.downshifts >= MAX_DOWNSHIFTS {
            return None;
        }

        self.downshifts += 1;
        self.profile.firework_scale *= BURST_FACTOR;
        self.profile.pixel_ratio_scale *= PIXEL_RATIO_FACTOR;
        info!(ordinal = self.downshifts, fps, "quality downshift");
        Some(Downshift {
            ordinal: self.downshifts,
            measured_fps: fps,
        })
    }

    /// Apply every downshift taken so far to a base spawn interval.
    ///
    /// Used when the firework stage switches to a new base interval.
    pub fn scaled_interval_ms(&self, base_ms: f64) -> f64 {
        let shift = Downshift {
            ordinal: 0,
            measured_fps: 0.0,
        };
        (0..self.downshifts).fold(base_ms, |ms, _| shift.spawn_interval_ms(ms))
    }
}
