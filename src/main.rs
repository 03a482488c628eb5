//! Headless run of the full show.
//!
//! Drives an [`Experience`] on a simulated 60 Hz clock with the built-in
//! glyph surface and a software firework canvas, and prints a short summary.
//!
//! ```text
//! heartburst [config.toml] [--seconds N] [--png out.png]
//! RUST_LOG=heartburst=debug heartburst --seconds 20
//! ```

use heartburst::prelude::*;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FRAME_MS: f64 = 1000.0 / 60.0;
const DEFAULT_SECONDS: f64 = 30.0;

/// Counts what would have been uploaded.
#[derive(Default)]
struct SubmitStats {
    frames: u64,
    particle_points: u64,
    star_points: u64,
}

impl PointRenderer for SubmitStats {
    fn submit(&mut self, frame: &PointFrame<'_>) {
        match frame.layer {
            PointLayer::Stars => {
                self.frames += 1;
                self.star_points += frame.draw_count as u64;
            }
            PointLayer::Particles => self.particle_points += frame.draw_count as u64,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: heartburst [config.toml] [--seconds N] [--png out.png]");
        return ExitCode::SUCCESS;
    }

    let flag_value = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };
    let seconds: f64 = flag_value("--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SECONDS);
    let png = flag_value("--png");
    let config_path = args
        .iter()
        .enumerate()
        .find(|(i, a)| {
            !a.starts_with("--") && (*i == 0 || !matches!(args[i - 1].as_str(), "--seconds" | "--png"))
        })
        .map(|(_, a)| a.clone());

    let config = match config_path {
        Some(path) => match Config::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(%path, %err, "could not load config");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let viewport = Viewport::default();
    let mut show = match Experience::builder(config).with_viewport(viewport).build(BitmapFont, 0.0) {
        Ok(show) => show,
        Err(err) => {
            error!(%err, "cannot start");
            return ExitCode::FAILURE;
        }
    };

    let mut canvas = RasterCanvas::new(viewport.width, viewport.height, viewport.canvas_pixel_ratio());
    let mut stats = SubmitStats::default();
    let end_ms = seconds * 1000.0;
    let mut now = 0.0;
    while now <= end_ms {
        show.frame(now, &mut stats, &mut canvas);
        now += FRAME_MS;
    }

    info!(
        frames = stats.frames,
        particle_points = stats.particle_points,
        star_points = stats.star_points,
        stage = ?show.stage(),
        finished = show.is_finished(),
        cards = show.cards().len(),
        downshifts = show.governor().downshifts(),
        "simulation done"
    );
    if let Some(status) = show.status() {
        println!("{status}");
    }
    if !show.love_note_text().is_empty() {
        println!("{}", show.love_note_text());
    }

    if let Some(path) = png {
        if let Err(err) = canvas.to_rgba8().save(&path) {
            error!(%path, %err, "could not save firework layer");
            return ExitCode::FAILURE;
        }
        info!(%path, "firework layer saved");
    }
    ExitCode::SUCCESS
}
