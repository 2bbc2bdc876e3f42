//! Tile loop and archive assembly.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use imgref::Img;
use rgb::alt::BGRA8;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::bit_depth::{self, BitDepth};
use crate::config::{ExportConfig, PngCompression};
use crate::encode::{TilePixels, encode_png};
use crate::error::ExportError;
use crate::image::{Image, Rect};
use crate::quantize::{MedianCutQuantizer, Quantizer};
use crate::tiler::{TileGrid, entry_name};

/// Palette size requested for indexed tiles.
const PALETTE_COLORS: usize = 256;

/// Receives progress and may request cancellation.
///
/// Any `FnMut(f64)` closure is an observer that never cancels.
pub trait ExportObserver {
    /// Cumulative completion in percent, called once after each tile.
    fn on_progress(&mut self, percent: f64);

    /// Polled before each tile; returning `true` stops the export.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F: FnMut(f64)> ExportObserver for F {
    fn on_progress(&mut self, percent: f64) {
        self(percent)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ExportObserver for NoProgress {
    fn on_progress(&mut self, _percent: f64) {}
}

/// Pairs a progress observer with a shared cancellation flag.
#[derive(Debug)]
pub struct Cancellable<'a, P> {
    flag: &'a AtomicBool,
    progress: P,
}

impl<'a, P: ExportObserver> Cancellable<'a, P> {
    pub fn new(flag: &'a AtomicBool, progress: P) -> Self {
        Self { flag, progress }
    }
}

impl<P: ExportObserver> ExportObserver for Cancellable<'_, P> {
    fn on_progress(&mut self, percent: f64) {
        self.progress.on_progress(percent);
    }

    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.progress.is_cancelled()
    }
}

/// One archive entry as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    pub name: String,
    pub rect: Rect,
    pub bit_depth: BitDepth,
    /// Size of the PNG stream before ZIP compression.
    pub encoded_len: usize,
}

/// What an export wrote, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub tiles: Vec<TileRecord>,
}

impl ExportSummary {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tiles stored at `depth`.
    pub fn count(&self, depth: BitDepth) -> usize {
        self.tiles.iter().filter(|t| t.bit_depth == depth).count()
    }

    pub fn encoded_bytes(&self) -> usize {
        self.tiles.iter().map(|t| t.encoded_len).sum()
    }
}

/// Per-export working buffers, reused from one tile to the next.
#[derive(Default)]
struct Packer {
    scratch: Vec<BGRA8>,
    encoded: Vec<u8>,
}

impl Packer {
    /// Select a depth for `rect`, convert it, and leave the PNG in `self.encoded`.
    fn encode_tile<Q: Quantizer + ?Sized>(
        &mut self,
        image: &Image,
        rect: Rect,
        tile: usize,
        quantizer: &Q,
        compression: PngCompression,
    ) -> Result<BitDepth, ExportError> {
        let Some(region) = image.region(rect) else {
            return Err(ExportError::DimensionMismatch {
                len: image.pixels().len(),
                width: rect.right(),
                height: rect.bottom(),
            });
        };

        self.scratch.clear();
        for row in region.rows() {
            self.scratch.extend_from_slice(row);
        }

        let (depth, _) = bit_depth::select(&mut self.scratch, rect.width, rect.height);
        let view = Img::new(&self.scratch[..], rect.width, rect.height);
        let pixels = match TilePixels::true_color(view, depth) {
            Some(pixels) => pixels,
            None => {
                let indexed = quantizer
                    .quantize(view, PALETTE_COLORS, depth.reserves_transparency())
                    .map_err(|source| ExportError::Quantize { tile, source })?;
                TilePixels::Indexed(indexed)
            }
        };

        self.encoded.clear();
        encode_png(&mut self.encoded, &pixels, compression)
            .map_err(|e| ExportError::encoding(tile, e))?;
        Ok(depth)
    }
}

/// Export `image` as a ZIP of PNG tiles using the built-in median cut quantizer.
///
/// On cancellation the archive is finalized with the tiles written so far and
/// [`ExportError::Cancelled`] is returned. Use [`export_to_file`] to have the
/// partial file removed instead.
pub fn export<W, O>(
    image: &Image,
    config: &ExportConfig,
    output: W,
    observer: &mut O,
) -> Result<ExportSummary, ExportError>
where
    W: Write + Seek,
    O: ExportObserver + ?Sized,
{
    let quantizer = MedianCutQuantizer::new(config.dither, config.dither_strength);
    export_with(image, config, &quantizer, output, observer)
}

/// Like [`export`], with a caller-supplied [`Quantizer`] for indexed tiles.
pub fn export_with<W, O, Q>(
    image: &Image,
    config: &ExportConfig,
    quantizer: &Q,
    output: W,
    observer: &mut O,
) -> Result<ExportSummary, ExportError>
where
    W: Write + Seek,
    O: ExportObserver + ?Sized,
    Q: Quantizer + ?Sized,
{
    config.validate()?;
    if image.is_empty() {
        return Err(ExportError::ZeroDimension);
    }

    let grid = TileGrid::new(image.width(), image.height(), config.tile_size as usize);
    log::debug!(
        "exporting {}x{} image as {} tiles ({}x{}) of up to {}px",
        image.width(),
        image.height(),
        grid.len(),
        grid.columns(),
        grid.rows(),
        config.tile_size
    );

    let mut zip = ZipWriter::new(output);
    let result = write_tiles(&mut zip, image, config, quantizer, &grid, observer);

    match result {
        Ok(summary) => {
            zip.finish()?;
            log::debug!(
                "wrote {} tiles, {} PNG bytes",
                summary.len(),
                summary.encoded_bytes()
            );
            Ok(summary)
        }
        Err(err @ ExportError::Cancelled { .. }) => {
            zip.finish()?;
            log::debug!("{err}");
            Err(err)
        }
        Err(err) => {
            if let Err(cleanup) = zip.finish() {
                log::warn!("failed to close archive after error: {cleanup}");
            }
            Err(err)
        }
    }
}

fn write_tiles<W, O, Q>(
    zip: &mut ZipWriter<W>,
    image: &Image,
    config: &ExportConfig,
    quantizer: &Q,
    grid: &TileGrid,
    observer: &mut O,
) -> Result<ExportSummary, ExportError>
where
    W: Write + Seek,
    O: ExportObserver + ?Sized,
    Q: Quantizer + ?Sized,
{
    let total = grid.len();
    let delta = (1.0 / total as f64) * 100.0;
    let mut percent = 0.0f64;
    let mut packer = Packer::default();
    let mut summary = ExportSummary {
        tiles: Vec::with_capacity(total),
    };

    for (i, &rect) in grid.iter().enumerate() {
        if observer.is_cancelled() {
            return Err(ExportError::Cancelled { written: i, total });
        }

        let depth = packer.encode_tile(image, rect, i + 1, quantizer, config.png_compression)?;
        let name = entry_name(i);
        let options =
            SimpleFileOptions::default().compression_method(config.entry_compression.to_zip());
        zip.start_file(name.clone(), options)?;
        zip.write_all(&packer.encoded)?;

        log::debug!(
            "{name}: {}x{} at ({}, {}) as {:?}, {} bytes",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            depth,
            packer.encoded.len()
        );
        summary.tiles.push(TileRecord {
            name,
            rect,
            bit_depth: depth,
            encoded_len: packer.encoded.len(),
        });

        percent += delta;
        observer.on_progress(percent);
    }

    Ok(summary)
}

/// Export into a new file at `path`.
///
/// If the export fails or is cancelled, the partially written file is removed.
pub fn export_to_file<P, O>(
    image: &Image,
    config: &ExportConfig,
    path: P,
    observer: &mut O,
) -> Result<ExportSummary, ExportError>
where
    P: AsRef<Path>,
    O: ExportObserver + ?Sized,
{
    let path = path.as_ref();
    config.validate()?;
    if image.is_empty() {
        return Err(ExportError::ZeroDimension);
    }

    let file = BufWriter::new(File::create(path)?);
    let result = export(image, config, file, observer);
    if result.is_err() {
        if let Err(err) = std::fs::remove_file(path) {
            log::warn!("failed to remove partial archive {}: {err}", path.display());
        }
    }
    result
}
