use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::oklab::OKLab;

/// Rounds of histogram-level k-means run after the cut.
const REFINE_ROUNDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    L,
    A,
    B,
}

impl Axis {
    fn of(self, lab: &OKLab) -> f32 {
        match self {
            Self::L => lab.l,
            Self::A => lab.a,
            Self::B => lab.b,
        }
    }
}

/// A set of histogram entries that will become one palette color.
#[derive(Debug, Clone)]
struct ColorBox {
    entries: Vec<(OKLab, f32)>,
    weight: f32,
}

impl ColorBox {
    fn new(entries: Vec<(OKLab, f32)>) -> Self {
        let weight = entries.iter().map(|(_, w)| w).sum();
        Self { entries, weight }
    }

    /// Widest axis and its extent.
    fn widest_axis(&self) -> (Axis, f32) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for (lab, _) in &self.entries {
            for (i, v) in [lab.l, lab.a, lab.b].into_iter().enumerate() {
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }
        let (rl, ra, rb) = (max[0] - min[0], max[1] - min[1], max[2] - min[2]);
        if rl >= ra && rl >= rb {
            (Axis::L, rl)
        } else if ra >= rb {
            (Axis::A, ra)
        } else {
            (Axis::B, rb)
        }
    }

    /// Heavier boxes with a wider spread are split first.
    fn priority(&self) -> f32 {
        self.weight * self.widest_axis().1
    }

    fn centroid(&self) -> OKLab {
        weighted_mean(self.entries.iter().map(|&(lab, w)| (lab, w)))
            .unwrap_or(OKLab::new(0.0, 0.0, 0.0))
    }

    /// Split at the weighted median of the widest axis. Both halves are non-empty.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (axis, _) = self.widest_axis();
        self.entries.sort_unstable_by(|x, y| {
            axis.of(&x.0)
                .partial_cmp(&axis.of(&y.0))
                .unwrap_or(Ordering::Equal)
        });

        let half = self.weight / 2.0;
        let mut acc = 0.0f32;
        let mut at = 1;
        for (i, (_, w)) in self.entries.iter().enumerate() {
            acc += w;
            if acc >= half {
                at = i + 1;
                break;
            }
        }
        at = at.clamp(1, self.entries.len() - 1);

        let right = self.entries.split_off(at);
        (ColorBox::new(self.entries), ColorBox::new(right))
    }
}

fn weighted_mean(items: impl Iterator<Item = (OKLab, f32)>) -> Option<OKLab> {
    let (mut l, mut a, mut b, mut w_sum) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for (lab, w) in items {
        l += lab.l * w;
        a += lab.a * w;
        b += lab.b * w;
        w_sum += w;
    }
    (w_sum > 1e-10).then(|| OKLab::new(l / w_sum, a / w_sum, b / w_sum))
}

fn nearest(centroids: &[OKLab], lab: OKLab) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| {
            lab.distance_sq(**x)
                .partial_cmp(&lab.distance_sq(**y))
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Weighted median cut over `(color, weight)` histogram entries.
///
/// Produces at most `max_colors` OKLab centroids. With `refine`, a few rounds
/// of weighted k-means pull each centroid toward the entries nearest to it.
pub fn median_cut(histogram: Vec<(OKLab, f32)>, max_colors: usize, refine: bool) -> Vec<OKLab> {
    if histogram.is_empty() || max_colors == 0 {
        return Vec::new();
    }
    if histogram.len() <= max_colors {
        return histogram.into_iter().map(|(lab, _)| lab).collect();
    }

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox::new(histogram));

    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() >= 2)
            .max_by(|(_, x), (_, y)| {
                x.priority()
                    .partial_cmp(&y.priority())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(i, _)| i);

        let Some(idx) = candidate else {
            break;
        };
        let (left, right) = boxes.swap_remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    let mut centroids: Vec<OKLab> = boxes.iter().map(ColorBox::centroid).collect();
    if refine {
        let entries: Vec<(OKLab, f32)> = boxes.into_iter().flat_map(|b| b.entries).collect();
        kmeans_refine(&mut centroids, &entries);
    }
    centroids
}

fn kmeans_refine(centroids: &mut [OKLab], entries: &[(OKLab, f32)]) {
    let k = centroids.len();
    for _ in 0..REFINE_ROUNDS {
        let mut sums = vec![(0.0f32, 0.0f32, 0.0f32, 0.0f32); k];
        for &(lab, w) in entries {
            let s = &mut sums[nearest(centroids, lab)];
            s.0 += lab.l * w;
            s.1 += lab.a * w;
            s.2 += lab.b * w;
            s.3 += w;
        }
        for (c, (l, a, b, w)) in centroids.iter_mut().zip(sums) {
            if w > 1e-10 {
                *c = OKLab::new(l / w, a / w, b / w);
            }
        }
    }
}
