use alloc::vec::Vec;

use crate::image::Rect;

/// Row-major grid of tile rectangles covering an image.
///
/// Tiles in the last column and row are clamped to the image edge and may be
/// narrower or shorter than the nominal tile size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    tiles: Vec<Rect>,
    columns: usize,
    rows: usize,
}

impl TileGrid {
    /// Lay out tiles of `tile_size` over a `width` x `height` image.
    /// A zero tile size or a zero-area image produces an empty grid.
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        if tile_size == 0 || width == 0 || height == 0 {
            return Self {
                tiles: Vec::new(),
                columns: 0,
                rows: 0,
            };
        }

        let columns = width.div_ceil(tile_size);
        let rows = height.div_ceil(tile_size);
        let mut tiles = Vec::with_capacity(columns * rows);
        for y in (0..height).step_by(tile_size) {
            for x in (0..width).step_by(tile_size) {
                tiles.push(Rect::new(
                    x,
                    y,
                    tile_size.min(width - x),
                    tile_size.min(height - y),
                ));
            }
        }

        Self {
            tiles,
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tiles(&self) -> &[Rect] {
        &self.tiles
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Rect> {
        self.tiles.iter()
    }
}

impl<'a> IntoIterator for &'a TileGrid {
    type Item = &'a Rect;
    type IntoIter = core::slice::Iter<'a, Rect>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Archive entry name for the tile at 0-based position `index`.
pub fn entry_name(index: usize) -> String {
    format!("Image{}.png", index + 1)
}
