use crate::arrays::Array2D;
use crate::levels::LevelHierarchy;
use crate::quantize::QuantizedImage;
use multiversion::multiversion;

#[multiversion(targets = "simd")]
fn accumulate(target: &mut [u32], source: &[u32]) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += *s;
    }
}

#[multiversion(targets = "simd")]
fn subtract(target: &mut [u32], source: &[u32]) {
    for (t, s) in target.iter_mut().zip(source) {
        debug_assert!(*t >= *s, "histogram bin underflow");
        *t -= *s;
    }
}

/// Histogram intersection of two histograms, each normalized by its own pixel count.
///
/// The result is in `[0, 1]`. An empty histogram has zero intersection with anything.
#[multiversion(targets = "simd")]
pub fn intersection(a: &[u32], a_count: u32, b: &[u32], b_count: u32) -> f32 {
    if a_count == 0 || b_count == 0 {
        return 0.0;
    }
    let a_norm = 1.0 / a_count as f32;
    let b_norm = 1.0 / b_count as f32;
    a.iter()
        .zip(b)
        .map(|(x, y)| (*x as f32 * a_norm).min(*y as f32 * b_norm))
        .sum()
}

/// Color histograms of every block at every level with the ownership of the blocks.
///
/// All mutations go through `add_pixel`/`delete_pixel` and `add_block`/`delete_block`, which keeps
/// every histogram equal to the sum of its current children.
#[derive(Debug, Clone)]
pub struct HistogramStore {
    histogram_size: usize,
    top: usize,
    /// Per level, `num_blocks * histogram_size` bin counts.
    bins: Vec<Vec<u32>>,
    /// Per level, pixel count of every block.
    counts: Vec<Vec<u32>>,
    /// Per level below the top, the block of a coarser level owning the block. During the block
    /// phase the parents of the current level are superpixels.
    parent: Vec<Vec<u32>>,
    /// Number of blocks of the current exchange level owned by every superpixel.
    partitions: Vec<u32>,
    /// Per superpixel sums of the working channels, only kept for the mean-based refinement.
    means: Option<Vec<[f32; 3]>>,
}

impl HistogramStore {
    /// Builds the level 0 histograms pixel by pixel and every coarser level block by block.
    pub fn new(image: &QuantizedImage, hierarchy: &LevelHierarchy) -> HistogramStore {
        let histogram_size = image.histogram_size;
        let top = hierarchy.top();
        let mut store = HistogramStore {
            histogram_size,
            top,
            bins: (0..=top)
                .map(|l| vec![0; hierarchy.level(l).num_blocks() * histogram_size])
                .collect(),
            counts: (0..=top)
                .map(|l| vec![0; hierarchy.level(l).num_blocks()])
                .collect(),
            parent: (0..top)
                .map(|l| vec![0; hierarchy.level(l).num_blocks()])
                .collect(),
            partitions: vec![0; hierarchy.top_level().num_blocks()],
            means: None,
        };
        let level0 = hierarchy.level(0);
        for y in 0..image.height() {
            for (x, bin) in image.bins.get_row(y).iter().enumerate() {
                store.add_pixel(0, level0.block_of_pixel(x, y), *bin);
            }
        }
        for level in 0..top {
            for block in 0..hierarchy.level(level).num_blocks() {
                let parent = hierarchy.structural_parent(level, block);
                store.add_block(level + 1, parent, level, block);
            }
        }
        store
    }

    #[inline(always)]
    pub fn histogram_size(&self) -> usize {
        self.histogram_size
    }

    #[inline(always)]
    pub fn top(&self) -> usize {
        self.top
    }

    #[inline(always)]
    pub fn histogram(&self, level: usize, block: usize) -> &[u32] {
        &self.bins[level][block * self.histogram_size..(block + 1) * self.histogram_size]
    }

    #[inline(always)]
    pub fn count(&self, level: usize, block: usize) -> u32 {
        self.counts[level][block]
    }

    #[inline(always)]
    pub fn parent(&self, level: usize, block: usize) -> u32 {
        self.parent[level][block]
    }

    /// Owner of every block of `level`.
    pub fn parents(&self, level: usize) -> &[u32] {
        &self.parent[level]
    }

    #[inline(always)]
    pub fn partitions(&self, superpixel: usize) -> u32 {
        self.partitions[superpixel]
    }

    pub fn num_superpixels(&self) -> usize {
        self.partitions.len()
    }

    pub fn add_pixel(&mut self, level: usize, block: usize, bin: u32) {
        self.bins[level][block * self.histogram_size + bin as usize] += 1;
        self.counts[level][block] += 1;
    }

    pub fn delete_pixel(&mut self, level: usize, block: usize, bin: u32) {
        let idx = block * self.histogram_size + bin as usize;
        debug_assert!(self.bins[level][idx] > 0, "histogram bin underflow");
        debug_assert!(self.counts[level][block] > 0);
        self.bins[level][idx] -= 1;
        self.counts[level][block] -= 1;
    }

    /// Adds the histogram of `subblock` at `sublevel` to `block` at `level` and makes `block` its
    /// owner.
    pub fn add_block(&mut self, level: usize, block: usize, sublevel: usize, subblock: usize) {
        debug_assert!(sublevel < level);
        let h = self.histogram_size;
        let (lower, upper) = self.bins.split_at_mut(level);
        accumulate(
            &mut upper[0][block * h..(block + 1) * h],
            &lower[sublevel][subblock * h..(subblock + 1) * h],
        );
        self.counts[level][block] += self.counts[sublevel][subblock];
        self.parent[sublevel][subblock] = block as u32;
        if level == self.top {
            self.partitions[block] += 1;
        }
    }

    /// Removes the histogram of `subblock` at `sublevel` from its owner `block` at `level`.
    ///
    /// The parent entry of `subblock` is left for the following `add_block()`.
    pub fn delete_block(&mut self, level: usize, block: usize, sublevel: usize, subblock: usize) {
        debug_assert!(sublevel < level);
        debug_assert_eq!(self.parent[sublevel][subblock] as usize, block);
        let h = self.histogram_size;
        let (lower, upper) = self.bins.split_at_mut(level);
        subtract(
            &mut upper[0][block * h..(block + 1) * h],
            &lower[sublevel][subblock * h..(subblock + 1) * h],
        );
        debug_assert!(self.counts[level][block] >= self.counts[sublevel][subblock]);
        self.counts[level][block] -= self.counts[sublevel][subblock];
        if level == self.top {
            debug_assert!(self.partitions[block] > 0);
            self.partitions[block] -= 1;
        }
    }

    /// Intersection of a block of `sublevel` with a superpixel.
    pub fn intersection(&self, superpixel: usize, sublevel: usize, subblock: usize) -> f32 {
        intersection(
            self.histogram(self.top, superpixel),
            self.count(self.top, superpixel),
            self.histogram(sublevel, subblock),
            self.count(sublevel, subblock),
        )
    }

    /// Makes `level` the exchange level. Its blocks become owned directly by the superpixels
    /// owning their former parents, and the partition counts are recounted in blocks of `level`.
    ///
    /// Must be called with decreasing levels, starting at `top - 1`.
    pub fn descend_to(&mut self, level: usize) {
        debug_assert!(level < self.top);
        if level + 1 < self.top {
            let (lower, upper) = self.parent.split_at_mut(level + 1);
            for parent in lower[level].iter_mut() {
                *parent = upper[0][*parent as usize];
            }
        }
        self.partitions.fill(0);
        for parent in self.parent[level].iter() {
            self.partitions[*parent as usize] += 1;
        }
    }

    /// Starts tracking the channel sums of every superpixel from the current labels.
    pub fn enable_means(&mut self, labels: &Array2D<u32>, channels: &Array2D<[f32; 3]>) {
        let mut sums = vec![[0f32; 3]; self.num_superpixels()];
        for (label, values) in labels.data.iter().zip(channels.data.iter()) {
            let sum = &mut sums[*label as usize];
            sum[0] += values[0];
            sum[1] += values[1];
            sum[2] += values[2];
        }
        self.means = Some(sums);
    }

    pub fn means_enabled(&self) -> bool {
        self.means.is_some()
    }

    /// Mean working channels of a superpixel, `None` if the means are not tracked or the
    /// superpixel is empty.
    pub fn mean(&self, superpixel: usize) -> Option<[f32; 3]> {
        let sums = self.means.as_ref()?;
        let count = self.counts[self.top][superpixel];
        if count == 0 {
            return None;
        }
        Some(sums[superpixel].map(|s| s / count as f32))
    }

    pub fn add_pixel_channels(&mut self, superpixel: usize, values: &[f32; 3]) {
        if let Some(sums) = self.means.as_mut() {
            let sum = &mut sums[superpixel];
            sum[0] += values[0];
            sum[1] += values[1];
            sum[2] += values[2];
        }
    }

    pub fn delete_pixel_channels(&mut self, superpixel: usize, values: &[f32; 3]) {
        if let Some(sums) = self.means.as_mut() {
            let sum = &mut sums[superpixel];
            sum[0] -= values[0];
            sum[1] -= values[1];
            sum[2] -= values[2];
        }
    }
}
