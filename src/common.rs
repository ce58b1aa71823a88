use crate::error::{Error, Result};

/// Color space in which pixels are quantized into histogram bins and in which the running means
/// of the mean-based pixel refinement are computed.
#[derive(Clone, PartialEq, Debug, Copy)]
pub enum ColorSpace {
    /// Direct RGB channels. Bins are balanced per image using sampled percentiles.
    Rgb,
    /// CIE Lab (perceptual). Bins are balanced per image using sampled percentiles.
    ///
    /// Lab gives better segmentations, HSV is faster to initialize.
    Lab,
    /// Hue, saturation and value. Each channel is divided into equally sized bins, no percentile
    /// cutoffs are computed.
    Hsv,
}

impl TryFrom<u8> for ColorSpace {
    type Error = Error;

    /// Numeric codes used by the command-line tools: 0 = RGB, 1 = Lab, 2 = HSV.
    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ColorSpace::Rgb),
            1 => Ok(ColorSpace::Lab),
            2 => Ok(ColorSpace::Hsv),
            _ => Err(Error::InvalidColorSpace(code)),
        }
    }
}

/// Main config for the processing.
///
/// The superpixel size is `base_block_width * 2^(num_levels - 1)` by
/// `base_block_height * 2^(num_levels - 1)`. Use `Config::with_superpixels()` to derive the
/// geometry from a desired number of superpixels instead.
#[derive(Clone, Debug)]
pub struct Config {
    /// Width of the blocks at level 0 in pixels.
    pub base_block_width: usize,
    /// Height of the blocks at level 0 in pixels.
    pub base_block_height: usize,
    /// Number of block levels including the superpixel level. At least 2.
    pub num_levels: usize,
    /// Number of histogram bins per channel. The histograms have `nr_bins^3` bins.
    pub nr_bins: usize,
    /// Minimum gain in histogram intersection before a block is moved to a neighboring
    /// superpixel. Pixel moves only need a strictly better fit. In `[0, 1]`.
    pub min_confidence: f32,
    /// Scale the pixel decisions by the number of same-labeled pixels around the pixel.
    pub use_local_prior: bool,
    /// Use the distance to the running mean colors (as in SLIC) instead of the histograms for the
    /// pixel updates.
    pub use_mean_refinement: bool,
    pub color_space: ColorSpace,
    /// How many times every block level is swept, and how many pixel passes are done.
    pub iterations_per_level: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_block_width: 2,
            base_block_height: 2,
            num_levels: 4,
            nr_bins: 5,
            min_confidence: 0.1,
            use_local_prior: true,
            use_mean_refinement: true,
            color_space: ColorSpace::Lab,
            iterations_per_level: 2,
        }
    }
}

const MAX_BLOCK_SIZE: usize = 20;
const MAX_LEVELS: usize = 12;

impl Config {
    /// Checks everything that can be checked without knowing the image.
    pub fn validate(&self) -> Result<()> {
        if self.base_block_width == 0 || self.base_block_height == 0 {
            return Err(Error::InvalidBlockSize {
                width: self.base_block_width,
                height: self.base_block_height,
            });
        }
        if self.num_levels < 2 {
            return Err(Error::TooFewLevels(self.num_levels));
        }
        if self.nr_bins == 0 {
            return Err(Error::ZeroBins);
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::ConfidenceOutOfRange(self.min_confidence));
        }
        if self.iterations_per_level == 0 {
            return Err(Error::ZeroIterations);
        }
        Ok(())
    }

    /// Number of bins of the joint color histogram.
    pub fn histogram_size(&self) -> usize {
        self.nr_bins * self.nr_bins * self.nr_bins
    }

    /// Picks block width, block height and number of levels so that the number of superpixels
    /// for a `width` x `height` image is as close as possible to `superpixels`.
    ///
    /// Block sides are searched in `2..=20` and level counts in `2..=12`. Other fields are kept.
    pub fn with_superpixels(mut self, width: usize, height: usize, superpixels: usize) -> Self {
        let mut best = None;
        for block_width in 2..=MAX_BLOCK_SIZE {
            for block_height in 2..=MAX_BLOCK_SIZE {
                for levels in 2..=MAX_LEVELS {
                    let difference = superpixels.abs_diff(superpixel_count(
                        width,
                        height,
                        block_width,
                        block_height,
                        levels,
                    ));
                    if best.map_or(true, |(min_difference, _)| difference < min_difference) {
                        best = Some((difference, (block_width, block_height, levels)));
                    }
                }
            }
        }
        if let Some((_, (block_width, block_height, levels))) = best {
            self.base_block_width = block_width;
            self.base_block_height = block_height;
            self.num_levels = levels;
        }
        self
    }

    /// Same as `with_superpixels()` but only square blocks are considered, which makes
    /// the comparison with algorithms using square initial regions fair.
    pub fn with_square_superpixels(
        mut self,
        width: usize,
        height: usize,
        superpixels: usize,
    ) -> Self {
        let mut best = None;
        for block_size in 2..=MAX_BLOCK_SIZE {
            for levels in 2..=MAX_LEVELS {
                let difference = superpixels.abs_diff(superpixel_count(
                    width, height, block_size, block_size, levels,
                ));
                if best.map_or(true, |(min_difference, _)| difference < min_difference) {
                    best = Some((difference, (block_size, levels)));
                }
            }
        }
        if let Some((_, (block_size, levels))) = best {
            self.base_block_width = block_size;
            self.base_block_height = block_size;
            self.num_levels = levels;
        }
        self
    }
}

/// Number of top-level blocks for the given geometry.
pub fn superpixel_count(
    width: usize,
    height: usize,
    block_width: usize,
    block_height: usize,
    levels: usize,
) -> usize {
    let scale = 1usize << (levels - 1);
    (width / (block_width * scale)) * (height / (block_height * scale))
}
