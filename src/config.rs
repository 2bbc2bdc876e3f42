use crate::dither::DitherMode;
use crate::error::ExportError;

/// Display name of the archive format.
pub const FORMAT_NAME: &str = "Image Tiles";
/// File extension written by [`export_to_file`](crate::export_to_file) callers.
pub const FILE_EXTENSION: &str = ".zip";

pub const DEFAULT_TILE_SIZE: u32 = 256;
pub const MIN_TILE_SIZE: u32 = 8;
pub const MAX_TILE_SIZE: u32 = 2048;

/// Deflate effort for each tile's PNG stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl PngCompression {
    pub(crate) fn to_png(self) -> png::Compression {
        match self {
            Self::Fast => png::Compression::Fast,
            Self::Default => png::Compression::Default,
            Self::Best => png::Compression::Best,
        }
    }
}

/// How tile entries are stored inside the ZIP container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryCompression {
    /// Store the PNG bytes as-is.
    Stored,
    #[default]
    Deflated,
}

impl EntryCompression {
    pub(crate) fn to_zip(self) -> zip::CompressionMethod {
        match self {
            Self::Stored => zip::CompressionMethod::Stored,
            Self::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

/// Settings for one export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Edge length of a full tile in pixels, 8..=2048.
    pub tile_size: u32,
    /// Dithering used when a tile must lose colors to fit a palette.
    pub dither: DitherMode,
    /// Fraction of quantization error to diffuse (0.0..=1.0).
    pub dither_strength: f32,
    pub png_compression: PngCompression,
    pub entry_compression: EntryCompression,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            dither: DitherMode::FloydSteinberg,
            dither_strength: 0.875,
            png_compression: PngCompression::Default,
            entry_compression: EntryCompression::Deflated,
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_size(mut self, size: u32) -> Self {
        self.tile_size = size;
        self
    }

    pub fn dither(mut self, mode: DitherMode) -> Self {
        self.dither = mode;
        self
    }

    pub fn dither_strength(mut self, strength: f32) -> Self {
        self.dither_strength = strength.clamp(0.0, 1.0);
        self
    }

    pub fn png_compression(mut self, compression: PngCompression) -> Self {
        self.png_compression = compression;
        self
    }

    pub fn entry_compression(mut self, compression: EntryCompression) -> Self {
        self.entry_compression = compression;
        self
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if !(MIN_TILE_SIZE..=MAX_TILE_SIZE).contains(&self.tile_size) {
            return Err(ExportError::InvalidTileSize(self.tile_size));
        }
        Ok(())
    }
}

/// Validated configuration for the given tile size, other settings at defaults.
pub fn configure(tile_size: u32) -> Result<ExportConfig, ExportError> {
    let config = ExportConfig::new().tile_size(tile_size);
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.dither, DitherMode::FloydSteinberg);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tile_size_bounds() {
        assert!(configure(MIN_TILE_SIZE).is_ok());
        assert!(configure(MAX_TILE_SIZE).is_ok());
        assert!(matches!(configure(7), Err(ExportError::InvalidTileSize(7))));
        assert!(matches!(configure(0), Err(ExportError::InvalidTileSize(0))));
        assert!(configure(2049).is_err());
    }

    #[test]
    fn strength_is_clamped() {
        assert_eq!(ExportConfig::new().dither_strength(3.0).dither_strength, 1.0);
        assert_eq!(ExportConfig::new().dither_strength(-1.0).dither_strength, 0.0);
    }
}
