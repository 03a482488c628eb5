//! Error types for heartburst.
//!
//! Failures fall into four groups:
//!
//! | Group | Type | Handling |
//! |-------|------|----------|
//! | Asset unavailable | [`TextureError`] | Replaced by a placeholder card, never shown to the user |
//! | Initialization | [`InitError`] | Fatal; the host shows a static message and no animation starts |
//! | Sequencing | [`SequenceError`] | Aborts the remaining script, status line shows a retry message |
//! | Configuration | [`ConfigError`] | Returned from loading/validation, before anything runs |
//!
//! Degraded frame rate is not an error; the quality governor handles it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The TOML document is malformed or has wrongly-typed fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A color field is not a `#rrggbb` literal.
    #[error("invalid color '{value}' for {field}")]
    InvalidColor {
        /// Dotted field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// A numeric field is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors that can occur while loading a photo texture.
///
/// None of these reach the user: the preloader substitutes a placeholder.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The image could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// The file could not be read.
    #[error("failed to read texture file: {0}")]
    Io(#[from] std::io::Error),
    /// The provider did not answer before the deadline.
    #[error("texture load timed out after {0} ms")]
    Timeout(u64),
    /// The loader thread went away without answering.
    #[error("texture loader disconnected")]
    Disconnected,
}

/// Errors raised by a glyph drawing surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    /// The requested raster has a zero dimension.
    #[error("invalid raster size {width}x{height}")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The font size is not a positive finite number.
    #[error("invalid font size {0}")]
    InvalidFontSize(f32),
}

/// Fatal errors while setting up an [`Experience`](crate::experience::Experience).
#[derive(Debug, Error)]
pub enum InitError {
    /// The viewport has no area, so nothing can be drawn.
    #[error("viewport {width}x{height} is not drawable")]
    Viewport {
        /// Viewport width in CSS pixels.
        width: f32,
        /// Viewport height in CSS pixels.
        height: f32,
    },
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The glyph surface could not be prepared.
    #[error("glyph surface unsupported: {0}")]
    Surface(#[from] SurfaceError),
}

/// A fault while running the timed script.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequenceError {
    /// Rasterizing a line of text failed.
    #[error("failed to rasterize '{text}': {source}")]
    Rasterize {
        /// The text being drawn.
        text: String,
        /// Surface failure.
        #[source]
        source: SurfaceError,
    },
    /// A cue referred to a step that cannot run in the current stage.
    #[error("cue '{0}' is not valid in the current stage")]
    InvalidCue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_error_mentions_text() {
        let err = SequenceError::Rasterize {
            text: "2026".into(),
            source: SurfaceError::InvalidSize { width: 0, height: 512 },
        };
        let msg = err.to_string();
        assert!(msg.contains("2026"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_init_error_wraps_config() {
        let err: InitError = ConfigError::InvalidValue {
            field: "particle.max_count",
            reason: "must be positive".into(),
        }
        .into();
        assert!(err.to_string().contains("particle.max_count"));
    }
}
