//! Source pixel buffer and tile rectangles.

use imgref::{ImgRef, ImgVec};
use rgb::alt::BGRA8;

use crate::error::ExportError;

/// Fully transparent black, the value binary-alpha tiles use for cleared pixels.
pub const TRANSPARENT: BGRA8 = BGRA8 {
    b: 0,
    g: 0,
    r: 0,
    a: 0,
};

/// Opaque white, the background partially transparent pixels are flattened onto.
pub const WHITE: BGRA8 = BGRA8 {
    b: 255,
    g: 255,
    r: 255,
    a: 255,
};

/// A rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> usize {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An owned, row-major BGRA image.
///
/// Rows are stored contiguously without padding, so `pixels().len()` is always
/// `width * height`.
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    buf: ImgVec<BGRA8>,
}

impl Image {
    /// Wrap a row-major pixel vector.
    pub fn new(width: usize, height: usize, pixels: Vec<BGRA8>) -> Result<Self, ExportError> {
        if width.checked_mul(height) != Some(pixels.len()) {
            return Err(ExportError::DimensionMismatch {
                len: pixels.len(),
                width,
                height,
            });
        }
        Ok(Self::from_parts(width, height, pixels))
    }

    /// An image where every pixel is `color`.
    pub fn filled(width: usize, height: usize, color: BGRA8) -> Self {
        Self::from_parts(width, height, vec![color; width * height])
    }

    /// A zero-area image is representable so that exporting it can be
    /// rejected as a configuration error. imgref needs a nonzero stride, so
    /// such an image keeps an empty 1-wide buffer.
    fn from_parts(width: usize, height: usize, pixels: Vec<BGRA8>) -> Self {
        let buf = if width == 0 || height == 0 {
            ImgVec::new(Vec::new(), 1, 0)
        } else {
            ImgVec::new(pixels, width, height)
        };
        Self { width, height, buf }
    }

    /// Build an image from tightly packed 8-bit RGBA bytes.
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, ExportError> {
        if bytes.len() % 4 != 0 {
            return Err(ExportError::DimensionMismatch {
                len: bytes.len(),
                width,
                height,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| BGRA8 {
                b: c[2],
                g: c[1],
                r: c[0],
                a: c[3],
            })
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[BGRA8] {
        self.buf.buf()
    }

    pub fn pixel_at(&self, x: usize, y: usize) -> Option<BGRA8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.buf.buf()[y * self.width() + x])
    }

    /// Overwrite one pixel. Returns `false` when `(x, y)` is outside the image.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: BGRA8) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        let width = self.width();
        self.buf.buf_mut()[y * width + x] = color;
        true
    }

    /// Whether `rect` lies entirely inside the image.
    pub fn contains(&self, rect: Rect) -> bool {
        rect.right() <= self.width() && rect.bottom() <= self.height()
    }

    /// A borrowed view of `rect`, or `None` if it leaves the image bounds or
    /// the image is empty.
    pub fn region(&self, rect: Rect) -> Option<ImgRef<'_, BGRA8>> {
        if self.is_empty() || !self.contains(rect) {
            return None;
        }
        Some(self.buf.sub_image(rect.x, rect.y, rect.width, rect.height))
    }
}
