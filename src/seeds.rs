use crate::arrays::{Array2D, RGBImage};
use crate::block_exchange::{refresh_labels, update_blocks};
use crate::common::Config;
use crate::error::Result;
use crate::histogram::HistogramStore;
use crate::levels::LevelHierarchy;
use crate::pixel_exchange::PixelExchange;
use crate::quantize::QuantizedImage;
use log::{debug, info};
use rayon::prelude::*;

/// Segmentation session of one image.
///
/// Owns all state of the optimization: the quantized image, the histograms with the block
/// ownership, and the label of every pixel. Nothing is shared between sessions.
pub struct Seeds {
    config: Config,
    hierarchy: LevelHierarchy,
    image: QuantizedImage,
    store: HistogramStore,
    labels: Array2D<u32>,
    /// Direction of the next pixel pass.
    forward: bool,
    block_phase_done: bool,
}

impl Seeds {
    /// Validates the configuration, quantizes the image and builds all histograms.
    ///
    /// The initial labels are the regular grid of superpixels.
    pub fn initialize(image: &RGBImage, config: &Config) -> Result<Seeds> {
        let hierarchy = LevelHierarchy::new(image.width, image.height, config)?;
        let top = hierarchy.top_level();
        info!(
            "SEEDS {}x{}: {} levels, {}x{} superpixels of {}x{} pixels, {:?} with {} bins",
            image.width,
            image.height,
            hierarchy.num_levels(),
            top.nr_w,
            top.nr_h,
            top.block_width,
            top.block_height,
            config.color_space,
            config.nr_bins,
        );
        let quantized = QuantizedImage::new(image, config);
        let store = HistogramStore::new(&quantized, &hierarchy);
        let labels = Array2D::from_fn(image.width, image.height, |x, y| {
            top.block_of_pixel(x, y) as u32
        });
        Ok(Seeds {
            config: config.clone(),
            hierarchy,
            image: quantized,
            store,
            labels,
            forward: true,
            block_phase_done: false,
        })
    }

    /// Exchanges blocks from the level below the superpixels down to level 0.
    ///
    /// Every level is swept `iterations_per_level` times. Calling this again has no effect.
    pub fn run_block_phase(&mut self) {
        if self.block_phase_done {
            return;
        }
        for level in (0..self.hierarchy.top()).rev() {
            self.store.descend_to(level);
            refresh_labels(level, &self.hierarchy, &self.store, &mut self.labels);
            let mut moves = 0;
            for _ in 0..self.config.iterations_per_level {
                moves += update_blocks(
                    level,
                    &self.hierarchy,
                    &mut self.store,
                    &mut self.labels,
                    self.config.min_confidence,
                );
            }
            debug!("level {level}: {moves} block moves");
        }
        self.block_phase_done = true;
    }

    /// Runs `iterations_per_level` pixel passes, alternating the scan direction. Runs the block
    /// phase first if it has not run yet.
    pub fn run_pixel_phase(&mut self) {
        self.run_block_phase();
        if self.config.use_mean_refinement && !self.store.means_enabled() {
            self.store.enable_means(&self.labels, &self.image.channels);
        }
        let exchange = PixelExchange::new(&self.image, &self.config);
        for pass in 0..self.config.iterations_per_level {
            let moves = exchange.update_pixels(&mut self.store, &mut self.labels, self.forward);
            debug!(
                "pixel pass {pass} ({}): {moves} pixel moves",
                if self.forward { "forward" } else { "backward" }
            );
            self.forward = !self.forward;
        }
    }

    /// Full optimization: block phase followed by the pixel phase.
    pub fn iterate(&mut self) {
        self.run_block_phase();
        self.run_pixel_phase();
    }

    /// Superpixel label of every pixel, in `[0, number of superpixels of the grid)`.
    pub fn labels(&self) -> &Array2D<u32> {
        &self.labels
    }

    pub fn into_labels(self) -> Array2D<u32> {
        self.labels
    }

    /// Number of distinct labels present in the label grid.
    pub fn count_superpixels(&self) -> usize {
        let mut present = vec![false; self.store.num_superpixels()];
        for label in self.labels.data.iter() {
            present[*label as usize] = true;
        }
        present.into_iter().filter(|p| *p).count()
    }

    pub fn histograms(&self) -> &HistogramStore {
        &self.store
    }

    pub fn hierarchy(&self) -> &LevelHierarchy {
        &self.hierarchy
    }

    pub fn quantized_image(&self) -> &QuantizedImage {
        &self.image
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Segments one image and returns the superpixel label of every pixel.
pub fn segment(image: &RGBImage, config: &Config) -> Result<Array2D<u32>> {
    let mut seeds = Seeds::initialize(image, config)?;
    seeds.iterate();
    Ok(seeds.into_labels())
}

/// Segments independent images in parallel. The result of every image is the same as from
/// `segment()`.
pub fn segment_batch(images: &[RGBImage], config: &Config) -> Vec<Result<Array2D<u32>>> {
    images
        .par_iter()
        .map(|image| segment(image, config))
        .collect()
}
