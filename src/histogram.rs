use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use rgb::alt::BGRA8;

use crate::oklab::{OKLab, srgb_to_oklab};

/// Pixel counts keyed by packed `0xRRGGBB`.
pub type ColorCounts = BTreeMap<u32, u32>;

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}

#[inline]
pub fn unpack_rgb(key: u32) -> [u8; 3] {
    [(key >> 16) as u8, (key >> 8) as u8, key as u8]
}

/// Count each distinct RGB value. Pixels with alpha 0 are skipped when
/// `skip_transparent` is set; otherwise alpha is ignored.
pub fn count_colors(
    pixels: impl IntoIterator<Item = BGRA8>,
    skip_transparent: bool,
) -> ColorCounts {
    let mut counts = ColorCounts::new();
    for p in pixels {
        if skip_transparent && p.a == 0 {
            continue;
        }
        *counts.entry(pack_rgb(p.r, p.g, p.b)).or_insert(0) += 1;
    }
    counts
}

/// A histogram bucket: weighted OKLab sums and the pixel count behind them.
#[derive(Debug, Clone, Default)]
struct Bucket {
    l_sum: f64,
    a_sum: f64,
    b_sum: f64,
    weight: f64,
}

impl Bucket {
    fn centroid(&self) -> OKLab {
        if self.weight < 1e-10 {
            return OKLab::new(0.0, 0.0, 0.0);
        }
        OKLab::new(
            (self.l_sum / self.weight) as f32,
            (self.a_sum / self.weight) as f32,
            (self.b_sum / self.weight) as f32,
        )
    }
}

/// Quantize an OKLab value to a bucket key with `bits` per axis.
fn bucket_key(lab: OKLab, bits: u32) -> u32 {
    let max_val = (1u32 << bits) - 1;
    let scale = max_val as f32;
    let l_bin = ((lab.l * scale).round().max(0.0) as u32).min(max_val);
    let a_bin = (((lab.a + 0.4) * (scale / 0.8)).round().max(0.0) as u32).min(max_val);
    let b_bin = (((lab.b + 0.4) * (scale / 0.8)).round().max(0.0) as u32).min(max_val);
    (l_bin << (bits * 2)) | (a_bin << bits) | b_bin
}

/// Collapse exact color counts into OKLab buckets.
///
/// Returns `(centroid, pixel_count)` per occupied bucket. Six bits per axis
/// keeps near-identical shades together without merging distinct ones.
pub fn build_histogram(counts: &ColorCounts) -> Vec<(OKLab, f32)> {
    const BITS: u32 = 6;
    let mut buckets: BTreeMap<u32, Bucket> = BTreeMap::new();

    for (&key, &count) in counts {
        let [r, g, b] = unpack_rgb(key);
        let lab = srgb_to_oklab(r, g, b);
        let w = count as f64;
        let bucket = buckets.entry(bucket_key(lab, BITS)).or_default();
        bucket.l_sum += lab.l as f64 * w;
        bucket.a_sum += lab.a as f64 * w;
        bucket.b_sum += lab.b as f64 * w;
        bucket.weight += w;
    }

    buckets
        .into_values()
        .map(|b| (b.centroid(), b.weight as f32))
        .collect()
}
