//! Color helpers.
//!
//! Colors are plain [`Vec3`] RGB triples in the 0.0-1.0 range, the same
//! representation the particle buffers carry.

use glam::Vec3;

/// Parse a `#rrggbb` (or `rrggbb`) literal.
///
/// Returns `None` for anything else.
pub fn parse_hex(hex: &str) -> Option<Vec3> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some(Vec3::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Linear blend between two colors.
#[inline]
pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Quantize a color plus alpha into 8-bit RGBA. Alpha is clamped to 0-1.
pub fn to_rgba8(color: Vec3, alpha: f32) -> [u8; 4] {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(color.x), q(color.y), q(color.z), q(alpha)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let c = parse_hex("#ff8000").unwrap();
        assert_eq!(c.x, 1.0);
        assert!((c.y - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.z, 0.0);
        assert_eq!(parse_hex("ff8000"), Some(c));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#fff").is_none());
        assert!(parse_hex("#gg0000").is_none());
        assert!(parse_hex("#ff00ff00").is_none());
        assert!(parse_hex("#ffé000").is_none());
    }

    #[test]
    fn test_to_rgba8_clamps() {
        assert_eq!(to_rgba8(Vec3::new(2.0, 0.5, -1.0), 1.5), [255, 128, 0, 255]);
    }
}
