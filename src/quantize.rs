//! Palette reduction for indexed tiles.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use imgref::ImgRef;
use rgb::alt::BGRA8;

use crate::dither::{self, DitherMode};
use crate::error::QuantizeError;
use crate::histogram::{build_histogram, count_colors, pack_rgb, unpack_rgb};
use crate::median_cut::median_cut;
use crate::oklab::srgb_to_oklab;
use crate::palette::Palette;

/// Reduces a true-color region to a palette and per-pixel indices.
pub trait Quantizer {
    /// Quantize `region` to at most `max_colors` palette entries.
    ///
    /// With `reserve_transparency`, one of those entries is a fully transparent
    /// color that every alpha-0 pixel maps to; all other pixels are treated as
    /// opaque and matched on RGB alone.
    fn quantize(
        &self,
        region: ImgRef<'_, BGRA8>,
        max_colors: usize,
        reserve_transparency: bool,
    ) -> Result<IndexedImage, QuantizeError>;
}

/// An 8-bit indexed image.
#[derive(Debug, Clone)]
pub struct IndexedImage {
    width: usize,
    height: usize,
    palette: Palette,
    indices: Vec<u8>,
}

impl IndexedImage {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// sRGB palette entries.
    pub fn palette(&self) -> &[[u8; 3]] {
        self.palette.entries()
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// Row-major palette indices, one per pixel.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.palette.transparent_index()
    }

    /// Alpha values for a PNG tRNS chunk, truncated after the last
    /// non-opaque entry. `None` when every entry is opaque.
    pub fn alpha_table(&self) -> Option<Vec<u8>> {
        let t = self.transparent_index()? as usize;
        let mut table = vec![255u8; t + 1];
        table[t] = 0;
        Some(table)
    }

    /// Color of the pixel at `(x, y)` as stored.
    pub fn rgba_at(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.indices[y * self.width + x];
        if Some(idx) == self.transparent_index() {
            return Some([0, 0, 0, 0]);
        }
        let [r, g, b] = self.palette()[idx as usize];
        Some([r, g, b, 255])
    }
}

/// Weighted median cut in OKLab, followed by optional error diffusion.
///
/// Regions whose distinct colors already fit the palette are stored exactly,
/// without any approximation or dithering.
#[derive(Debug, Clone)]
pub struct MedianCutQuantizer {
    pub dither: DitherMode,
    /// Fraction of quantization error diffused to neighbors, 0.0..=1.0.
    pub dither_strength: f32,
    /// Run k-means rounds after the cut.
    pub refine: bool,
}

impl Default for MedianCutQuantizer {
    fn default() -> Self {
        Self {
            dither: DitherMode::FloydSteinberg,
            dither_strength: 0.875,
            refine: true,
        }
    }
}

impl MedianCutQuantizer {
    pub fn new(dither: DitherMode, dither_strength: f32) -> Self {
        Self {
            dither,
            dither_strength: dither_strength.clamp(0.0, 1.0),
            ..Self::default()
        }
    }
}

impl Quantizer for MedianCutQuantizer {
    fn quantize(
        &self,
        region: ImgRef<'_, BGRA8>,
        max_colors: usize,
        reserve_transparency: bool,
    ) -> Result<IndexedImage, QuantizeError> {
        let min = if reserve_transparency { 2 } else { 1 };
        if !(min..=256).contains(&max_colors) {
            return Err(QuantizeError::InvalidMaxColors {
                got: max_colors,
                min,
            });
        }

        let (width, height) = (region.width(), region.height());
        if width == 0 || height == 0 {
            return Ok(IndexedImage {
                width,
                height,
                palette: Palette::from_colors([], false),
                indices: Vec::new(),
            });
        }

        let pixels: Vec<BGRA8> = region.pixels().collect();
        let budget = max_colors - usize::from(reserve_transparency);
        let counts = count_colors(pixels.iter().copied(), reserve_transparency);

        if counts.len() <= budget {
            let palette =
                Palette::from_colors(counts.keys().map(|&k| unpack_rgb(k)), reserve_transparency);
            let lookup: BTreeMap<u32, u8> = palette
                .entries()
                .iter()
                .enumerate()
                .skip(usize::from(reserve_transparency))
                .map(|(i, c)| (pack_rgb(c[0], c[1], c[2]), i as u8))
                .collect();
            let transparent = palette.transparent_index();
            let indices = pixels
                .iter()
                .map(|p| match transparent {
                    Some(t) if p.a == 0 => t,
                    _ => lookup
                        .get(&pack_rgb(p.r, p.g, p.b))
                        .copied()
                        .unwrap_or_else(|| palette.nearest(srgb_to_oklab(p.r, p.g, p.b))),
                })
                .collect();
            log::trace!(
                "exact palette: {} colors for {}x{} region",
                palette.len(),
                width,
                height
            );
            return Ok(IndexedImage {
                width,
                height,
                palette,
                indices,
            });
        }

        let centroids = median_cut(build_histogram(&counts), budget, self.refine);
        let palette = Palette::from_centroids(centroids, reserve_transparency);
        let indices = dither::remap(
            &pixels,
            width,
            height,
            &palette,
            self.dither,
            self.dither_strength,
        );
        log::trace!(
            "median cut: {} distinct colors reduced to {} for {}x{} region",
            counts.len(),
            palette.len(),
            width,
            height
        );

        Ok(IndexedImage {
            width,
            height,
            palette,
            indices,
        })
    }
}
