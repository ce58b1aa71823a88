use thiserror::Error;

/// Errors reported before any segmentation work starts.
///
/// Configuration and geometry problems are the only failures of this crate. Everything after
/// `Seeds::initialize()` is pure computation and cannot fail.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Numeric color space code outside of 0 = RGB, 1 = Lab, 2 = HSV.
    #[error("invalid color space code {0} (expected 0 = RGB, 1 = Lab, 2 = HSV)")]
    InvalidColorSpace(u8),
    #[error("block size must be positive, got {width}x{height}")]
    InvalidBlockSize { width: usize, height: usize },
    #[error("at least 2 levels are required, got {0}")]
    TooFewLevels(usize),
    #[error("number of histogram bins must be positive")]
    ZeroBins,
    #[error("minimum confidence {0} is outside of [0, 1]")]
    ConfidenceOutOfRange(f32),
    #[error("number of iterations per level must be positive")]
    ZeroIterations,
    #[error("image data has {actual} elements, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("image must have non-zero width and height")]
    EmptyImage,
    /// The block size or the number of levels is too large for the image, so some level of the
    /// hierarchy would not contain a single block.
    #[error(
        "level {level} has no blocks for {image_width}x{image_height} image \
         (blocks of {block_width}x{block_height} pixels)"
    )]
    EmptyLevel {
        level: usize,
        image_width: usize,
        image_height: usize,
        block_width: usize,
        block_height: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
