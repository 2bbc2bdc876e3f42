use std::io::Cursor;

use proptest::prelude::*;
use zentile::{
    BGRA8, BitDepth, DitherMode, ExportConfig, Image, MedianCutQuantizer, Quantizer, TileGrid,
    analyze, classify, export,
};

fn pixel_strategy() -> impl Strategy<Value = BGRA8> {
    // Small channel alphabet so palettes sometimes fit and sometimes don't.
    (0u8..8, 0u8..8, 0u8..8, prop_oneof![Just(0u8), Just(255u8), any::<u8>()]).prop_map(
        |(r, g, b, a)| BGRA8 {
            b: b * 36,
            g: g * 36,
            r: r * 36,
            a,
        },
    )
}

fn image_strategy(max: usize) -> impl Strategy<Value = (usize, usize, Vec<BGRA8>)> {
    (1..=max, 1..=max).prop_flat_map(|(w, h)| {
        proptest::collection::vec(pixel_strategy(), w * h).prop_map(move |px| (w, h, px))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tiles_cover_image_once(w in 1usize..3000, h in 1usize..3000, size in 8usize..=2048) {
        let grid = TileGrid::new(w, h, size);
        prop_assert_eq!(grid.len(), w.div_ceil(size) * h.div_ceil(size));

        let area: usize = grid.iter().map(|r| r.area()).sum();
        prop_assert_eq!(area, w * h);

        for (i, r) in grid.iter().enumerate() {
            prop_assert!(r.width >= 1 && r.width <= size);
            prop_assert!(r.height >= 1 && r.height <= size);
            prop_assert!(r.right() <= w && r.bottom() <= h);
            prop_assert_eq!(r.x, (i % grid.columns()) * size);
            prop_assert_eq!(r.y, (i / grid.columns()) * size);
        }
    }

    #[test]
    fn prop_classification_matches_rules((w, h, pixels) in image_strategy(24)) {
        let report = analyze(imgref::Img::new(&pixels[..], w, h));
        let depth = classify(&report);
        let colors = report.unique_opaque_colors;

        let all_opaque = pixels.iter().all(|p| p.a == 255);
        let binary = pixels.iter().all(|p| p.a == 0 || p.a == 255);
        prop_assert_eq!(report.all_opaque, all_opaque);
        prop_assert_eq!(report.all_alpha_binary, binary);

        let expected = if all_opaque && colors <= 256 {
            BitDepth::IndexedOpaque
        } else if all_opaque {
            BitDepth::FullColorOpaque
        } else if binary && colors < 256 {
            BitDepth::IndexedWithBinaryAlpha
        } else {
            BitDepth::FullColorWithAlpha
        };
        prop_assert_eq!(depth, expected);
    }

    #[test]
    fn prop_progress_is_cumulative((w, h, pixels) in image_strategy(40), size in 8u32..24) {
        let image = Image::new(w, h, pixels).unwrap();
        let config = ExportConfig::new().tile_size(size).dither(DitherMode::None);
        let mut seen = Vec::new();
        let summary = export(&image, &config, Cursor::new(Vec::new()), &mut |p: f64| seen.push(p))
            .unwrap();

        let n = summary.len();
        prop_assert_eq!(seen.len(), n);
        for (k, p) in seen.iter().enumerate() {
            prop_assert!((p - 100.0 * (k + 1) as f64 / n as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn prop_quantized_indices_are_valid(
        (w, h, pixels) in image_strategy(32),
        max_colors in 2usize..=256,
        reserve in any::<bool>(),
    ) {
        let out = MedianCutQuantizer::default()
            .quantize(imgref::Img::new(&pixels[..], w, h), max_colors, reserve)
            .unwrap();

        prop_assert!(out.palette_len() <= max_colors);
        prop_assert_eq!(out.indices().len(), w * h);
        prop_assert!(out.indices().iter().all(|&i| (i as usize) < out.palette_len()));
        if reserve {
            let t = out.transparent_index().unwrap();
            for (p, &i) in pixels.iter().zip(out.indices()) {
                prop_assert_eq!(p.a == 0, i == t);
            }
        }
    }
}
