//! PNG encoding of prepared tiles.

use std::io::Write;

use imgref::ImgRef;
use rgb::alt::BGRA8;

use crate::bit_depth::BitDepth;
use crate::config::PngCompression;
use crate::quantize::IndexedImage;

/// Pixel data for one tile, already in the layout its PNG will use.
#[derive(Debug, Clone)]
pub enum TilePixels {
    /// Interleaved RGBA, 4 bytes per pixel.
    Rgba {
        width: usize,
        height: usize,
        data: Vec<u8>,
    },
    /// Interleaved RGB, 3 bytes per pixel.
    Rgb {
        width: usize,
        height: usize,
        data: Vec<u8>,
    },
    Indexed(IndexedImage),
}

impl TilePixels {
    /// Convert a prepared tile to the true-color layout implied by `depth`.
    ///
    /// Returns `None` for indexed depths, which go through a quantizer instead.
    pub fn true_color(tile: ImgRef<'_, BGRA8>, depth: BitDepth) -> Option<Self> {
        let (width, height) = (tile.width(), tile.height());
        match depth {
            BitDepth::FullColorWithAlpha => Some(Self::Rgba {
                width,
                height,
                data: tile.pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect(),
            }),
            BitDepth::FullColorOpaque => Some(Self::Rgb {
                width,
                height,
                data: tile.pixels().flat_map(|p| [p.r, p.g, p.b]).collect(),
            }),
            BitDepth::IndexedOpaque | BitDepth::IndexedWithBinaryAlpha => None,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            Self::Rgba { width, height, .. } | Self::Rgb { width, height, .. } => (*width, *height),
            Self::Indexed(img) => (img.width(), img.height()),
        }
    }
}

/// Write `pixels` as a single PNG image to `out`.
pub fn encode_png<W: Write>(
    out: W,
    pixels: &TilePixels,
    compression: PngCompression,
) -> Result<(), png::EncodingError> {
    let (width, height) = pixels.dimensions();
    let mut encoder = png::Encoder::new(out, width as u32, height as u32);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(compression.to_png());

    let data: &[u8] = match pixels {
        TilePixels::Rgba { data, .. } => {
            encoder.set_color(png::ColorType::Rgba);
            data
        }
        TilePixels::Rgb { data, .. } => {
            encoder.set_color(png::ColorType::Rgb);
            data
        }
        TilePixels::Indexed(img) => {
            encoder.set_color(png::ColorType::Indexed);
            let flat: Vec<u8> = img.palette().iter().flatten().copied().collect();
            encoder.set_palette(flat);
            if let Some(trns) = img.alpha_table() {
                encoder.set_trns(trns);
            }
            img.indices()
        }
    };

    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;
    writer.finish()
}
