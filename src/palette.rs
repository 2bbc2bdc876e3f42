use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::histogram::pack_rgb;
use crate::oklab::{OKLab, oklab_to_srgb, srgb_to_oklab};

/// A palette of at most 256 colors, optionally with a transparent entry at index 0.
///
/// Opaque entries are ordered by OKLab lightness so neighboring pixels in a
/// smooth region get nearby indices, which helps PNG's scanline filters.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<[u8; 3]>,
    entries_oklab: Vec<OKLab>,
    transparent_index: Option<u8>,
}

impl Palette {
    /// Build a palette from OKLab centroids. Centroids that land on the same
    /// sRGB value collapse into one entry.
    pub fn from_centroids(centroids: Vec<OKLab>, reserve_transparency: bool) -> Self {
        let mut seen = BTreeSet::new();
        let pairs = centroids
            .into_iter()
            .filter_map(|lab| {
                let rgb = oklab_to_srgb(lab);
                seen.insert(pack_rgb(rgb[0], rgb[1], rgb[2]))
                    .then(|| (srgb_to_oklab(rgb[0], rgb[1], rgb[2]), rgb))
            })
            .collect();
        Self::from_pairs(pairs, reserve_transparency)
    }

    /// Build a palette holding exactly the given colors.
    pub fn from_colors(colors: impl IntoIterator<Item = [u8; 3]>, reserve_transparency: bool) -> Self {
        let pairs = colors
            .into_iter()
            .map(|c| (srgb_to_oklab(c[0], c[1], c[2]), c))
            .collect();
        Self::from_pairs(pairs, reserve_transparency)
    }

    fn from_pairs(mut pairs: Vec<(OKLab, [u8; 3])>, reserve_transparency: bool) -> Self {
        pairs.sort_by(|x, y| {
            x.0.l
                .partial_cmp(&y.0.l)
                .unwrap_or(Ordering::Equal)
                .then(x.1.cmp(&y.1))
        });

        let mut entries = Vec::with_capacity(pairs.len() + 1);
        let mut entries_oklab = Vec::with_capacity(pairs.len() + 1);
        let transparent_index = if reserve_transparency {
            entries.push([0, 0, 0]);
            entries_oklab.push(OKLab::new(0.0, 0.0, 0.0));
            Some(0)
        } else {
            None
        };
        for (lab, rgb) in pairs {
            entries.push(rgb);
            entries_oklab.push(lab);
        }

        Self {
            entries,
            entries_oklab,
            transparent_index,
        }
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn entries_oklab(&self) -> &[OKLab] {
        &self.entries_oklab
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First index that holds an opaque color.
    fn first_opaque(&self) -> usize {
        usize::from(self.transparent_index.is_some())
    }

    /// Nearest opaque entry to `color`. Never returns the transparent index.
    pub fn nearest(&self, color: OKLab) -> u8 {
        let start = self.first_opaque();
        let mut best_idx = start;
        let mut best_dist = f32::MAX;
        for (i, lab) in self.entries_oklab.iter().enumerate().skip(start) {
            let d = color.distance_sq(*lab);
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }
        best_idx as u8
    }
}
