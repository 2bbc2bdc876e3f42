//! Per-tile bit depth selection.
//!
//! A tile is stored with the narrowest PNG layout that still represents it:
//! indexed when its opaque colors fit a palette, 24-bit when it has no alpha,
//! and 32-bit otherwise. Choosing an alpha-less or binary-alpha layout also
//! rewrites the tile's pixels so they match what will be stored.

use imgref::{Img, ImgRefMut};
use rgb::alt::BGRA8;

use crate::analyze::{AnalysisReport, analyze};
use crate::image::TRANSPARENT;

/// Storage layout chosen for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 32 bpp RGBA.
    FullColorWithAlpha,
    /// 24 bpp RGB.
    FullColorOpaque,
    /// 8 bpp palette, up to 256 colors.
    IndexedOpaque,
    /// 8 bpp palette, up to 255 colors plus one transparent entry.
    IndexedWithBinaryAlpha,
}

impl BitDepth {
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            Self::FullColorWithAlpha => 32,
            Self::FullColorOpaque => 24,
            Self::IndexedOpaque | Self::IndexedWithBinaryAlpha => 8,
        }
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::IndexedOpaque | Self::IndexedWithBinaryAlpha)
    }

    /// Whether the palette needs a dedicated fully transparent entry.
    pub const fn reserves_transparency(self) -> bool {
        matches!(self, Self::IndexedWithBinaryAlpha)
    }
}

/// Pick a layout from the tile statistics.
///
/// The opaque palette accepts up to 256 colors while the binary-alpha palette
/// only accepts 255, matching the long-standing behavior of this format.
pub fn classify(report: &AnalysisReport) -> BitDepth {
    if report.all_opaque {
        if report.unique_opaque_colors <= 256 {
            BitDepth::IndexedOpaque
        } else {
            BitDepth::FullColorOpaque
        }
    } else if report.all_alpha_binary && report.unique_opaque_colors < 256 {
        BitDepth::IndexedWithBinaryAlpha
    } else {
        BitDepth::FullColorWithAlpha
    }
}

/// Composite `p` over opaque white.
#[inline]
pub fn blend_over_white(p: BGRA8) -> BGRA8 {
    let a = p.a as u32;
    let inv = 255 - a;
    let mix = |c: u8| ((c as u32 * a + 255 * inv + 127) / 255) as u8;
    BGRA8 {
        b: mix(p.b),
        g: mix(p.g),
        r: mix(p.r),
        a: 255,
    }
}

/// Rewrite a tile in place so its pixels fit `depth`.
///
/// 32-bit tiles are left untouched. Binary-alpha tiles clear every pixel
/// with alpha below 128; every other pixel is flattened onto white.
pub fn prepare(mut tile: ImgRefMut<'_, BGRA8>, depth: BitDepth) {
    if depth == BitDepth::FullColorWithAlpha {
        return;
    }
    let binary = depth == BitDepth::IndexedWithBinaryAlpha;

    for row in tile.rows_mut() {
        for p in row.iter_mut() {
            *p = if binary && p.a < 128 {
                TRANSPARENT
            } else {
                blend_over_white(*p)
            };
        }
    }
}

/// Analyze, classify and prepare a contiguous tile buffer in one step.
pub fn select(pixels: &mut [BGRA8], width: usize, height: usize) -> (BitDepth, AnalysisReport) {
    let report = analyze(Img::new(&*pixels, width, height));
    let depth = classify(&report);
    prepare(Img::new(pixels, width, height), depth);
    (depth, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(all_opaque: bool, all_alpha_binary: bool, colors: usize) -> AnalysisReport {
        AnalysisReport {
            all_opaque,
            all_alpha_binary,
            unique_opaque_colors: colors,
        }
    }

    #[test]
    fn decision_table() {
        assert_eq!(classify(&report(true, true, 1)), BitDepth::IndexedOpaque);
        assert_eq!(classify(&report(true, true, 300)), BitDepth::FullColorOpaque);
        assert_eq!(
            classify(&report(false, true, 10)),
            BitDepth::IndexedWithBinaryAlpha
        );
        assert_eq!(
            classify(&report(false, false, 10)),
            BitDepth::FullColorWithAlpha
        );
    }

    #[test]
    fn asymmetric_palette_thresholds() {
        assert_eq!(classify(&report(true, true, 256)), BitDepth::IndexedOpaque);
        assert_eq!(classify(&report(true, true, 257)), BitDepth::FullColorOpaque);
        assert_eq!(
            classify(&report(false, true, 255)),
            BitDepth::IndexedWithBinaryAlpha
        );
        assert_eq!(
            classify(&report(false, true, 256)),
            BitDepth::FullColorWithAlpha
        );
    }

    #[test]
    fn bits_per_pixel() {
        assert_eq!(BitDepth::FullColorWithAlpha.bits_per_pixel(), 32);
        assert_eq!(BitDepth::FullColorOpaque.bits_per_pixel(), 24);
        assert_eq!(BitDepth::IndexedOpaque.bits_per_pixel(), 8);
        assert_eq!(BitDepth::IndexedWithBinaryAlpha.bits_per_pixel(), 8);
    }

    #[test]
    fn blend_endpoints() {
        let red = BGRA8 {
            b: 0,
            g: 0,
            r: 255,
            a: 255,
        };
        assert_eq!(blend_over_white(red), red);
        let hidden = BGRA8 {
            b: 10,
            g: 20,
            r: 30,
            a: 0,
        };
        assert_eq!(blend_over_white(hidden), crate::image::WHITE);
        let half_black = BGRA8 {
            b: 0,
            g: 0,
            r: 0,
            a: 128,
        };
        assert_eq!(blend_over_white(half_black).r, 127);
    }

    #[test]
    fn binary_prepare_clears_low_alpha() {
        let mut buf = vec![
            BGRA8 {
                b: 1,
                g: 2,
                r: 3,
                a: 127,
            },
            BGRA8 {
                b: 1,
                g: 2,
                r: 3,
                a: 255,
            },
        ];
        prepare(
            Img::new(&mut buf[..], 2, 1),
            BitDepth::IndexedWithBinaryAlpha,
        );
        assert_eq!(buf[0], TRANSPARENT);
        assert_eq!(buf[1].a, 255);
        assert_eq!((buf[1].r, buf[1].g, buf[1].b), (3, 2, 1));
    }

    #[test]
    fn full_alpha_prepare_is_noop() {
        let original = vec![
            BGRA8 {
                b: 1,
                g: 2,
                r: 3,
                a: 40,
            };
            4
        ];
        let mut buf = original.clone();
        prepare(Img::new(&mut buf[..], 2, 2), BitDepth::FullColorWithAlpha);
        assert_eq!(buf, original);
    }

    #[test]
    fn select_flattens_binary_tile() {
        let mut buf = vec![
            BGRA8 {
                b: 0,
                g: 0,
                r: 200,
                a: 255,
            },
            BGRA8 {
                b: 50,
                g: 50,
                r: 50,
                a: 0,
            },
        ];
        let (depth, report) = select(&mut buf, 2, 1);
        assert_eq!(depth, BitDepth::IndexedWithBinaryAlpha);
        assert_eq!(report.unique_opaque_colors, 1);
        assert_eq!(buf[1], TRANSPARENT);
    }
}
