//! Frame timing driven by host timestamps.
//!
//! The host (a browser `requestAnimationFrame`, a winit loop, or a test)
//! passes its own millisecond timestamp every frame; nothing here reads the
//! wall clock, so tests can advance time by exact amounts.
//!
//! # Example
//!
//! ```ignore
//! use heartburst::time::FrameClock;
//!
//! let mut clock = FrameClock::new(0.0);
//!
//! // In your frame callback:
//! let dt = clock.tick(now_ms);
//!
//! println!("Delta: {:.4}s", dt);
//! println!("Frame: {}", clock.frame());
//! println!("FPS: {:.1}", clock.fps());
//! ```

/// Largest step handed to the simulation, in seconds.
///
/// A long stall (tab in background, debugger pause) would otherwise fling
/// particles across the screen on the next frame.
pub const MAX_DELTA_SECS: f32 = 0.05;

/// Frame timing state.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Timestamp of the previous tick, in milliseconds.
    last_ms: f64,
    /// Clamped delta of the most recent tick, in seconds.
    delta_secs: f32,
    /// Total frames ticked.
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Timestamp of last FPS calculation.
    fps_update_ms: f64,
    /// How often to update the FPS figure.
    fps_update_interval_ms: f64,
}

impl FrameClock {
    /// Create a clock whose first frame is measured from `start_ms`.
    pub fn new(start_ms: f64) -> Self {
        Self {
            last_ms: start_ms,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_ms: start_ms,
            fps_update_interval_ms: 500.0,
        }
    }

    /// Advance to `now_ms`. Call once per frame.
    ///
    /// Returns the elapsed seconds, clamped to [`MAX_DELTA_SECS`]. Timestamps
    /// that go backwards yield zero.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let raw = ((now_ms - self.last_ms) / 1000.0).max(0.0) as f32;
        self.delta_secs = raw.min(MAX_DELTA_SECS);
        self.last_ms = now_ms;
        self.frame_count += 1;

        let since = now_ms - self.fps_update_ms;
        if since >= self.fps_update_interval_ms {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = (frames as f64 / (since / 1000.0)) as f32;
            self.fps_frame_count = self.frame_count;
            self.fps_update_ms = now_ms;
        }

        self.delta_secs
    }

    /// Seconds covered by the most recent tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Most recent FPS figure.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Timestamp of the latest tick.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.last_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new(0.0);
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    fn test_tick_delta() {
        let mut clock = FrameClock::new(1000.0);
        let dt = clock.tick(1016.0);
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_tick_clamps_stalls() {
        let mut clock = FrameClock::new(0.0);
        assert_eq!(clock.tick(2000.0), MAX_DELTA_SECS);
    }

    #[test]
    fn test_tick_ignores_backwards_time() {
        let mut clock = FrameClock::new(100.0);
        assert_eq!(clock.tick(50.0), 0.0);
    }

    #[test]
    fn test_fps_estimate() {
        let mut clock = FrameClock::new(0.0);
        let mut now = 0.0;
        for _ in 0..60 {
            now += 1000.0 / 60.0;
            clock.tick(now);
        }
        assert!((clock.fps() - 60.0).abs() < 1.0);
    }
}
