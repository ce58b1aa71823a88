use crate::common::Config;
use crate::error::{Error, Result};

/// One resolution tier of the block grid.
///
/// Blocks at the right and bottom border absorb the remainder pixels, so the last column and row
/// of blocks can be larger than `block_width` x `block_height`.
#[derive(Debug, Clone)]
pub struct Level {
    /// Number of blocks horizontally.
    pub nr_w: usize,
    /// Number of blocks vertically.
    pub nr_h: usize,
    /// Nominal block width in pixels.
    pub block_width: usize,
    /// Nominal block height in pixels.
    pub block_height: usize,
    /// Block column of every pixel column.
    column_blocks: Vec<u32>,
    /// Block row of every pixel row.
    row_blocks: Vec<u32>,
}

impl Level {
    fn new(width: usize, height: usize, block_width: usize, block_height: usize) -> Level {
        let nr_w = width / block_width;
        let nr_h = height / block_height;
        Level {
            nr_w,
            nr_h,
            block_width,
            block_height,
            column_blocks: (0..width)
                .map(|x| (x / block_width).min(nr_w.saturating_sub(1)) as u32)
                .collect(),
            row_blocks: (0..height)
                .map(|y| (y / block_height).min(nr_h.saturating_sub(1)) as u32)
                .collect(),
        }
    }

    #[inline(always)]
    pub fn num_blocks(&self) -> usize {
        self.nr_w * self.nr_h
    }

    #[inline(always)]
    pub fn block_id(&self, bx: usize, by: usize) -> usize {
        debug_assert!(bx < self.nr_w && by < self.nr_h);
        by * self.nr_w + bx
    }

    /// Grid coordinates `(bx, by)` of the block.
    #[inline(always)]
    pub fn block_xy(&self, block: usize) -> (usize, usize) {
        (block % self.nr_w, block / self.nr_w)
    }

    /// Block containing the pixel `(x, y)`.
    #[inline(always)]
    pub fn block_of_pixel(&self, x: usize, y: usize) -> usize {
        self.row_blocks[y] as usize * self.nr_w + self.column_blocks[x] as usize
    }
}

/// Grid resolutions from level 0 (blocks of `base_block_width` x `base_block_height` pixels) up to
/// the superpixel level. Every level doubles the block size of the level below.
#[derive(Debug, Clone)]
pub struct LevelHierarchy {
    pub width: usize,
    pub height: usize,
    levels: Vec<Level>,
}

impl LevelHierarchy {
    /// Fails with `Error::EmptyLevel` when the block size or the number of levels is too large for
    /// the image.
    pub fn new(width: usize, height: usize, config: &Config) -> Result<LevelHierarchy> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        let mut levels = Vec::with_capacity(config.num_levels);
        for level in 0..config.num_levels {
            let block_width = config.base_block_width << level;
            let block_height = config.base_block_height << level;
            let grid = Level::new(width, height, block_width, block_height);
            if grid.num_blocks() == 0 {
                return Err(Error::EmptyLevel {
                    level,
                    image_width: width,
                    image_height: height,
                    block_width,
                    block_height,
                });
            }
            levels.push(grid);
        }
        Ok(LevelHierarchy {
            width,
            height,
            levels,
        })
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Index of the superpixel level.
    #[inline(always)]
    pub fn top(&self) -> usize {
        self.levels.len() - 1
    }

    #[inline(always)]
    pub fn level(&self, level: usize) -> &Level {
        &self.levels[level]
    }

    pub fn top_level(&self) -> &Level {
        &self.levels[self.top()]
    }

    /// Number of superpixels the segmentation starts with.
    pub fn num_superpixels(&self) -> usize {
        self.top_level().num_blocks()
    }

    /// Block at `level + 1` that structurally contains `block` of `level`.
    ///
    /// Border blocks of an odd-sized grid belong to the last block of the coarser level.
    pub fn structural_parent(&self, level: usize, block: usize) -> usize {
        debug_assert!(level < self.top());
        let (bx, by) = self.levels[level].block_xy(block);
        let upper = &self.levels[level + 1];
        upper.block_id((bx / 2).min(upper.nr_w - 1), (by / 2).min(upper.nr_h - 1))
    }
}
