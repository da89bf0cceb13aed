//! 24-bit colours and the palette shared by game, effects, and render.

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// Linear-ish float RGBA for GPU upload (no gamma conversion).
    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha.clamp(0.0, 1.0),
        ]
    }

    /// HSV → RGB with `h`, `s`, `v` all in [0, 1].
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(1.0) * 6.0;
        let sector = h.floor() as i32;
        let f = h - sector as f32;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::new(
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
        )
    }
}

/// Player and UI palette.
pub mod palette {
    use super::Rgb;

    pub const P1: Rgb = Rgb::from_hex(0x007AFF);
    pub const P2: Rgb = Rgb::from_hex(0xFF3B30);
    pub const SHARED: Rgb = Rgb::from_hex(0xFFD700);
    pub const GOLD: Rgb = Rgb::from_hex(0xFFD700);
    pub const WARNING: Rgb = Rgb::from_hex(0xFF0000);
    pub const FPS_GREEN: Rgb = Rgb::from_hex(0x34C759);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Rgb::from_hex(0xFF6B35);
        assert_eq!(c, Rgb::new(0xFF, 0x6B, 0x35));
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(Rgb::from_hsv(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsv(1.0 / 3.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsv(2.0 / 3.0, 1.0, 1.0), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hsv(0.5, 0.0, 1.0), Rgb::WHITE);
    }

    #[test]
    fn test_rgba_alpha_clamped() {
        let c = Rgb::WHITE.to_rgba_f32(1.7);
        assert_eq!(c[3], 1.0);
    }
}
