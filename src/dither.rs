use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use rgb::alt::BGRA8;

use crate::histogram::pack_rgb;
use crate::oklab::{OKLab, srgb_to_oklab};
use crate::palette::Palette;

/// How pixels are mapped onto a reduced palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Nearest palette color only.
    None,
    /// Floyd-Steinberg error diffusion in OKLab.
    #[default]
    FloydSteinberg,
}

/// Map a contiguous tile onto `palette`.
///
/// When the palette has a transparent entry, pixels with alpha 0 take it and
/// neither emit nor receive diffused error. `strength` scales the diffused
/// error (0.0 disables it, 1.0 is classic Floyd-Steinberg).
pub fn remap(
    pixels: &[BGRA8],
    width: usize,
    height: usize,
    palette: &Palette,
    mode: DitherMode,
    strength: f32,
) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), width * height);
    if mode == DitherMode::None || strength <= 0.0 {
        return nearest_remap(pixels, palette);
    }

    let transparent = palette.transparent_index();
    let is_clear = |p: &BGRA8| transparent.is_some() && p.a == 0;

    let mut work: Vec<OKLab> = pixels.iter().map(|p| srgb_to_oklab(p.r, p.g, p.b)).collect();
    let mut indices = vec![0u8; pixels.len()];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if let (Some(t), true) = (transparent, is_clear(&pixels[idx])) {
                indices[idx] = t;
                continue;
            }

            let current = work[idx];
            let chosen = palette.nearest(current);
            indices[idx] = chosen;

            let err = current.error_to(palette.entries_oklab()[chosen as usize]);
            let mut spread = |tx: usize, ty: usize, fraction: f32| {
                let ti = ty * width + tx;
                if !is_clear(&pixels[ti]) {
                    work[ti] = work[ti].add_scaled(err, fraction * strength);
                }
            };

            // right 7/16, bottom-left 3/16, bottom 5/16, bottom-right 1/16
            if x + 1 < width {
                spread(x + 1, y, 7.0 / 16.0);
            }
            if y + 1 < height {
                if x > 0 {
                    spread(x - 1, y + 1, 3.0 / 16.0);
                }
                spread(x, y + 1, 5.0 / 16.0);
                if x + 1 < width {
                    spread(x + 1, y + 1, 1.0 / 16.0);
                }
            }
        }
    }

    indices
}

/// Nearest-color mapping with a per-color memo.
fn nearest_remap(pixels: &[BGRA8], palette: &Palette) -> Vec<u8> {
    let transparent = palette.transparent_index();
    let mut memo: BTreeMap<u32, u8> = BTreeMap::new();

    pixels
        .iter()
        .map(|p| match transparent {
            Some(t) if p.a == 0 => t,
            _ => *memo
                .entry(pack_rgb(p.r, p.g, p.b))
                .or_insert_with(|| palette.nearest(srgb_to_oklab(p.r, p.g, p.b))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: u8) -> BGRA8 {
        BGRA8 {
            b: v,
            g: v,
            r: v,
            a: 255,
        }
    }

    fn black_white() -> Palette {
        Palette::from_colors([[0, 0, 0], [255, 255, 255]], false)
    }

    #[test]
    fn nearest_mode_is_flat() {
        let pixels = vec![gray(100); 16];
        let idx = remap(&pixels, 4, 4, &black_white(), DitherMode::None, 1.0);
        assert!(idx.iter().all(|&i| i == idx[0]));
    }

    #[test]
    fn diffusion_mixes_levels() {
        let pixels = vec![gray(150); 64];
        let idx = remap(&pixels, 8, 8, &black_white(), DitherMode::FloydSteinberg, 1.0);
        let whites = idx.iter().filter(|&&i| i == 1).count();
        assert!(whites > 0 && whites < 64, "whites={whites}");
    }

    #[test]
    fn transparent_pixels_take_reserved_index() {
        let palette = Palette::from_colors([[10, 20, 30]], true);
        let mut pixels = vec![
            BGRA8 {
                b: 30,
                g: 20,
                r: 10,
                a: 255,
            };
            9
        ];
        pixels[4] = crate::image::TRANSPARENT;
        for mode in [DitherMode::None, DitherMode::FloydSteinberg] {
            let idx = remap(&pixels, 3, 3, &palette, mode, 0.875);
            assert_eq!(idx[4], 0);
            assert!(idx.iter().enumerate().all(|(i, &v)| i == 4 || v == 1));
        }
    }

    #[test]
    fn exact_colors_stay_exact_under_diffusion() {
        let palette = black_white();
        let pixels: Vec<_> = (0..16).map(|i| gray(if i % 3 == 0 { 0 } else { 255 })).collect();
        let idx = remap(&pixels, 4, 4, &palette, DitherMode::FloydSteinberg, 1.0);
        for (p, i) in pixels.iter().zip(&idx) {
            assert_eq!(palette.entries()[*i as usize][0], p.r);
        }
    }
}
