use alloc::collections::BTreeSet;

use imgref::ImgRef;
use rgb::alt::BGRA8;

/// Distinct opaque colors are only counted up to this many.
/// Anything above 256 already rules out an indexed encoding, so the exact
/// count beyond the cap is irrelevant.
pub const UNIQUE_COLOR_CAP: usize = 300;

/// Alpha and color statistics for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Every pixel has alpha 255.
    pub all_opaque: bool,
    /// Every pixel has alpha 0 or 255.
    pub all_alpha_binary: bool,
    /// Distinct RGB values among opaque pixels, saturating at [`UNIQUE_COLOR_CAP`].
    pub unique_opaque_colors: usize,
}

#[inline]
fn rgb_key(p: BGRA8) -> u32 {
    (p.r as u32) << 16 | (p.g as u32) << 8 | p.b as u32
}

/// Scan a region once and report its alpha shape and opaque color count.
pub fn analyze(region: ImgRef<'_, BGRA8>) -> AnalysisReport {
    let mut all_opaque = true;
    let mut all_alpha_binary = true;
    let mut colors = BTreeSet::new();

    for p in region.pixels() {
        if p.a != 255 {
            all_opaque = false;
            if p.a != 0 {
                all_alpha_binary = false;
            }
            continue;
        }
        if colors.len() < UNIQUE_COLOR_CAP {
            colors.insert(rgb_key(p));
        }
    }

    AnalysisReport {
        all_opaque,
        all_alpha_binary,
        unique_opaque_colors: colors.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    fn opaque(v: u32) -> BGRA8 {
        BGRA8 {
            b: v as u8,
            g: (v >> 8) as u8,
            r: (v >> 16) as u8,
            a: 255,
        }
    }

    #[test]
    fn solid_tile() {
        let buf = vec![opaque(0x336699); 64];
        let report = analyze(Img::new(&buf[..], 8, 8));
        assert_eq!(
            report,
            AnalysisReport {
                all_opaque: true,
                all_alpha_binary: true,
                unique_opaque_colors: 1,
            }
        );
    }

    #[test]
    fn partial_alpha_clears_both_flags() {
        let mut buf = vec![opaque(0); 4];
        buf[2].a = 17;
        let report = analyze(Img::new(&buf[..], 2, 2));
        assert!(!report.all_opaque);
        assert!(!report.all_alpha_binary);
    }

    #[test]
    fn transparent_pixels_do_not_count_as_colors() {
        let buf = vec![
            opaque(1),
            BGRA8 {
                b: 9,
                g: 9,
                r: 9,
                a: 0,
            },
            opaque(2),
            opaque(1),
        ];
        let report = analyze(Img::new(&buf[..], 4, 1));
        assert!(!report.all_opaque);
        assert!(report.all_alpha_binary);
        assert_eq!(report.unique_opaque_colors, 2);
    }

    #[test]
    fn color_count_saturates_at_cap() {
        let buf: Vec<BGRA8> = (0..1000).map(opaque).collect();
        let report = analyze(Img::new(&buf[..], 100, 10));
        assert_eq!(report.unique_opaque_colors, UNIQUE_COLOR_CAP);
    }

    #[test]
    fn only_the_region_is_scanned() {
        // Left half opaque, right half translucent
        let mut buf = Vec::new();
        for _ in 0..4 {
            buf.extend([opaque(5), opaque(6)]);
            buf.extend([opaque(7), opaque(8)].map(|mut p| {
                p.a = 100;
                p
            }));
        }
        let full = Img::new(&buf[..], 4, 4);
        let left = full.sub_image(0, 0, 2, 4);
        let report = analyze(left);
        assert!(report.all_opaque);
        assert_eq!(report.unique_opaque_colors, 2);
    }
}
