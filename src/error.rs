use thiserror::Error;

/// Errors raised by a [`Quantizer`](crate::quantize::Quantizer).
#[derive(Debug, Error)]
pub enum QuantizeError {
    #[error("max_colors must be between {min} and 256, got {got}")]
    InvalidMaxColors { got: usize, min: usize },
}

/// Coarse classification of an [`ExportError`], for hosts that only need to
/// decide between "fix the settings", "report a failure" and "user aborted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any archive bytes were written.
    Configuration,
    /// A tile could not be quantized or encoded.
    Encoding,
    /// The output stream failed.
    Io,
    /// The caller asked to stop.
    Cancelled,
}

/// Everything that can stop an export, from bad settings to a failing sink.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("tile size must be between 8 and 2048, got {0}")]
    InvalidTileSize(u32),

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("failed to quantize tile {tile}")]
    Quantize {
        tile: usize,
        #[source]
        source: QuantizeError,
    },

    #[error("failed to encode tile {tile} as PNG")]
    Encoding {
        tile: usize,
        #[source]
        source: png::EncodingError,
    },

    #[error("failed to write archive")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("export cancelled after {written} of {total} tiles")]
    Cancelled { written: usize, total: usize },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTileSize(_) | Self::ZeroDimension | Self::DimensionMismatch { .. } => {
                ErrorKind::Configuration
            }
            Self::Quantize { .. } => ErrorKind::Encoding,
            Self::Encoding { source, .. } => match source {
                png::EncodingError::IoError(_) => ErrorKind::Io,
                _ => ErrorKind::Encoding,
            },
            Self::Archive(err) => match err {
                zip::result::ZipError::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Encoding,
            },
            Self::Io(_) => ErrorKind::Io,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Tag an encoder failure with the 1-based tile it happened on.
    pub(crate) fn encoding(tile: usize, source: png::EncodingError) -> Self {
        Self::Encoding { tile, source }
    }
}
