use crate::arrays::{Array2D, RGBImage};
use crate::colorspace::{rgb_to_hsv, rgb_to_lab};
use crate::common::{ColorSpace, Config};

/// Only every N-th pixel in both directions is used to estimate the bin cutoffs.
pub const CUTOFF_SAMPLE_STRIDE: usize = 5;

/// Per-channel ascending bin thresholds, balanced so that every bin receives approximately the
/// same share of the sampled pixels.
///
/// The last cutoff of every channel is infinite so that every value finds a bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinCutoffs {
    pub cutoffs: [Vec<f32>; 3],
}

impl BinCutoffs {
    /// Computes the cutoffs from per-channel sample lists. The lists are reordered.
    pub fn from_samples(mut samples: [Vec<f32>; 3], nr_bins: usize) -> Self {
        let cutoffs = std::array::from_fn(|c| {
            let channel = &mut samples[c];
            let n_samples = channel.len();
            let mut cutoffs = Vec::with_capacity(nr_bins);
            for i in 1..nr_bins {
                let n = i * n_samples / nr_bins;
                let (_, nth, _) = channel.select_nth_unstable_by(n, |a, b| a.total_cmp(b));
                cutoffs.push(*nth);
            }
            cutoffs.push(f32::INFINITY);
            cutoffs
        });
        Self { cutoffs }
    }

    /// Samples the image on a regular grid and computes the cutoffs of the channels produced by
    /// `convert`.
    pub fn from_image(image: &RGBImage, nr_bins: usize, convert: fn([u8; 3]) -> [f32; 3]) -> Self {
        let capacity = image.width.div_ceil(CUTOFF_SAMPLE_STRIDE)
            * image.height.div_ceil(CUTOFF_SAMPLE_STRIDE);
        let mut samples: [Vec<f32>; 3] = std::array::from_fn(|_| Vec::with_capacity(capacity));
        for y in (0..image.height).step_by(CUTOFF_SAMPLE_STRIDE) {
            for x in (0..image.width).step_by(CUTOFF_SAMPLE_STRIDE) {
                let values = convert(image.get_pixel(x, y));
                for (channel, value) in samples.iter_mut().zip(values) {
                    channel.push(value);
                }
            }
        }
        Self::from_samples(samples, nr_bins)
    }

    /// Index of the first cutoff the value does not exceed.
    #[inline(always)]
    pub fn bin(&self, channel: usize, value: f32) -> usize {
        let cutoffs = &self.cutoffs[channel];
        let mut bin = 0;
        while bin + 1 < cutoffs.len() && value > cutoffs[bin] {
            bin += 1;
        }
        bin
    }
}

/// How the working channels of a pixel are mapped to per-channel bins.
#[derive(Debug, Clone, PartialEq)]
enum Binning {
    Rgb(BinCutoffs),
    Lab(BinCutoffs),
    /// HSV channels already lie in `[0, 1]` and are split into equal intervals.
    Hsv,
}

/// Converts pixels to a joint histogram bin and to three working channel values in `[0, 1]`.
pub struct ColorQuantizer {
    nr_bins: usize,
    binning: Binning,
}

impl ColorQuantizer {
    pub fn new(image: &RGBImage, config: &Config) -> Self {
        let nr_bins = config.nr_bins;
        let binning = match config.color_space {
            ColorSpace::Rgb => {
                Binning::Rgb(BinCutoffs::from_image(image, nr_bins, |p| p.map(f32::from)))
            }
            ColorSpace::Lab => Binning::Lab(BinCutoffs::from_image(image, nr_bins, rgb_to_lab)),
            ColorSpace::Hsv => Binning::Hsv,
        };
        Self { nr_bins, binning }
    }

    pub fn cutoffs(&self) -> Option<&BinCutoffs> {
        match &self.binning {
            Binning::Rgb(cutoffs) | Binning::Lab(cutoffs) => Some(cutoffs),
            Binning::Hsv => None,
        }
    }

    /// Returns the joint bin `bin1 + nr_bins * bin2 + nr_bins^2 * bin3` and the working channels.
    #[inline]
    pub fn quantize(&self, rgb: [u8; 3]) -> (u32, [f32; 3]) {
        let (bins, channels) = match &self.binning {
            Binning::Rgb(cutoffs) => {
                let values = rgb.map(f32::from);
                (
                    [0, 1, 2].map(|c| cutoffs.bin(c, values[c])),
                    values.map(|v| v / 255.0),
                )
            }
            Binning::Lab(cutoffs) => {
                let [l, a, b] = rgb_to_lab(rgb);
                (
                    [cutoffs.bin(0, l), cutoffs.bin(1, a), cutoffs.bin(2, b)],
                    [l / 100.0, (a + 128.0) / 255.0, (b + 128.0) / 255.0],
                )
            }
            Binning::Hsv => {
                let hsv = rgb_to_hsv(rgb);
                // saturation reaches 1 for fully saturated colors
                (
                    hsv.map(|v| ((v * self.nr_bins as f32) as usize).min(self.nr_bins - 1)),
                    hsv,
                )
            }
        };
        let bin = bins[0] + self.nr_bins * bins[1] + self.nr_bins * self.nr_bins * bins[2];
        (bin as u32, channels)
    }
}

/// Per-pixel histogram bins and working channels of one image.
pub struct QuantizedImage {
    pub bins: Array2D<u32>,
    pub channels: Array2D<[f32; 3]>,
    pub histogram_size: usize,
}

impl QuantizedImage {
    pub fn new(image: &RGBImage, config: &Config) -> Self {
        let quantizer = ColorQuantizer::new(image, config);
        let mut bins = Array2D::from_fill(0u32, image.width, image.height);
        let mut channels = Array2D::from_fill([0f32; 3], image.width, image.height);
        for (i, pixel) in image.pixels().enumerate() {
            let (bin, values) = quantizer.quantize(pixel);
            bins.data[i] = bin;
            channels.data[i] = values;
        }
        Self {
            bins,
            channels,
            histogram_size: config.histogram_size(),
        }
    }

    pub fn width(&self) -> usize {
        self.bins.width
    }

    pub fn height(&self) -> usize {
        self.bins.height
    }
}
