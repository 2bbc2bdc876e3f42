/// OKLab color representation.
///
/// Bjorn Ottosson's perceptually uniform color space.
/// L: lightness [0, 1], a: green-red, b: blue-yellow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OKLab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl OKLab {
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// Squared Euclidean distance, a stand-in for perceptual difference.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }

    pub fn add_scaled(self, err: [f32; 3], scale: f32) -> Self {
        Self::new(
            self.l + err[0] * scale,
            self.a + err[1] * scale,
            self.b + err[2] * scale,
        )
    }

    pub fn error_to(self, other: Self) -> [f32; 3] {
        [self.l - other.l, self.a - other.a, self.b - other.b]
    }
}

// sRGB transfer curve via linear-srgb's lookup tables.

#[inline(always)]
fn srgb_to_linear(c: u8) -> f32 {
    linear_srgb::default::srgb_u8_to_linear(c)
}

#[inline(always)]
fn linear_to_srgb(c: f32) -> u8 {
    linear_srgb::default::linear_to_srgb_u8(c.clamp(0.0, 1.0))
}

// Matrix constants are from the OKLab reference implementation.

/// Convert sRGB (0..255 per channel) to OKLab.
#[allow(clippy::excessive_precision)]
pub fn srgb_to_oklab(r: u8, g: u8, b: u8) -> OKLab {
    let r = srgb_to_linear(r);
    let g = srgb_to_linear(g);
    let b = srgb_to_linear(b);

    let l = 0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b;
    let m = 0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b;
    let s = 0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    OKLab {
        l: 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
        a: 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
        b: 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
    }
}

/// Convert OKLab to sRGB (0..255 per channel).
#[allow(clippy::excessive_precision)]
pub fn oklab_to_srgb(lab: OKLab) -> [u8; 3] {
    let l_ = lab.l + 0.3963377774 * lab.a + 0.2158037573 * lab.b;
    let m_ = lab.l - 0.1055613458 * lab.a - 0.0638541728 * lab.b;
    let s_ = lab.l - 0.0894841775 * lab.a - 1.2914855480 * lab.b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    let r = 4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s;
    let g = -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s;
    let b = -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s;

    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_roundtrip() {
        let black = srgb_to_oklab(0, 0, 0);
        assert!(black.l.abs() < 0.001);
        assert_eq!(oklab_to_srgb(black), [0, 0, 0]);

        let white = srgb_to_oklab(255, 255, 255);
        assert!((white.l - 1.0).abs() < 0.001);
        assert!(white.a.abs() < 0.001);
        assert_eq!(oklab_to_srgb(white), [255, 255, 255]);
    }

    #[test]
    fn primaries_survive() {
        let [r, g, b] = oklab_to_srgb(srgb_to_oklab(255, 0, 0));
        assert_eq!(r, 255);
        assert!(g <= 1 && b <= 1);
        let [r, g, b] = oklab_to_srgb(srgb_to_oklab(0, 0, 255));
        assert!(r <= 1 && g <= 1);
        assert_eq!(b, 255);
    }

    #[test]
    fn midtone_within_one() {
        let [r, g, b] = oklab_to_srgb(srgb_to_oklab(128, 64, 200));
        assert!((r as i16 - 128).abs() <= 1);
        assert!((g as i16 - 64).abs() <= 1);
        assert!((b as i16 - 200).abs() <= 1);
    }

    #[test]
    fn lightness_orders_grays() {
        let dark = srgb_to_oklab(40, 40, 40);
        let light = srgb_to_oklab(200, 200, 200);
        assert!(dark.l < light.l);
        assert!(dark.distance_sq(light) > dark.distance_sq(srgb_to_oklab(41, 40, 40)));
    }
}
