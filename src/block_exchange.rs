use crate::arrays::Array2D;
use crate::connectivity::{check_split, Axis, PairWindow, Side};
use crate::histogram::HistogramStore;
use crate::levels::{Level, LevelHierarchy};

/// A superpixel never gives away its last block of the current level.
pub const MINIMUM_NR_SUBLABELS: u32 = 1;

/// Takes `block` of `level` out of superpixel `from` and gives it to `to` if its histogram
/// intersection with `to` is higher by more than `min_confidence`. Otherwise the block is put back.
///
/// Returns whether the block was moved.
pub fn exchange_block(
    store: &mut HistogramStore,
    level: usize,
    block: usize,
    from: usize,
    to: usize,
    min_confidence: f32,
) -> bool {
    let top = store.top();
    store.delete_block(top, from, level, block);
    let intersection_from = store.intersection(from, level, block);
    let intersection_to = store.intersection(to, level, block);
    if intersection_to > intersection_from && intersection_to - intersection_from > min_confidence {
        store.add_block(top, to, level, block);
        true
    } else {
        store.add_block(top, from, level, block);
        false
    }
}

/// Sets the label of every pixel to the superpixel owning its block at `level`.
pub fn refresh_labels(
    level: usize,
    hierarchy: &LevelHierarchy,
    store: &HistogramStore,
    labels: &mut Array2D<u32>,
) {
    let grid = hierarchy.level(level);
    for y in 0..labels.height {
        let row_start = labels.get_index(0, y);
        let width = labels.width;
        for (x, label) in labels.data[row_start..row_start + width].iter_mut().enumerate() {
            *label = store.parent(level, grid.block_of_pixel(x, y));
        }
    }
}

/// Whether the owner of the moving cell may give it away.
#[inline(always)]
fn can_give_away(store: &HistogramStore, owner: usize, window: &PairWindow, side: Side) -> bool {
    let partitions = store.partitions(owner);
    partitions > MINIMUM_NR_SUBLABELS
        && (partitions <= 2 || !check_split(&window.neighborhood(side), window.axis(), side))
}

/// Tries to move the first block of the pair to the owner of the second one and, if that does not
/// happen, the second block to the owner of the first one.
fn exchange_pair(
    store: &mut HistogramStore,
    level: usize,
    grid: &Level,
    axis: Axis,
    (x, y): (usize, usize),
    min_confidence: f32,
) -> Option<Side> {
    let window = PairWindow::gather(axis, x, y, |bx, by| {
        (bx < grid.nr_w && by < grid.nr_h).then(|| store.parent(level, grid.block_id(bx, by)))
    });
    let label_a = window.first() as usize;
    let label_b = window.second() as usize;
    if label_a == label_b {
        return None;
    }
    let first = grid.block_id(x, y);
    let second = match axis {
        Axis::Horizontal => grid.block_id(x + 1, y),
        Axis::Vertical => grid.block_id(x, y + 1),
    };
    let accepted = if can_give_away(store, label_a, &window, Side::Forward)
        && exchange_block(store, level, first, label_a, label_b, min_confidence)
    {
        Some((Side::Forward, first, label_a))
    } else if can_give_away(store, label_b, &window, Side::Backward)
        && exchange_block(store, level, second, label_b, label_a, min_confidence)
    {
        Some((Side::Backward, second, label_b))
    } else {
        None
    };
    #[cfg(test)]
    move_log::record(store, level, axis, accepted);
    accepted.map(|(side, _, _)| side)
}


/// One horizontal and one vertical sweep over the interior blocks of `level`. The labels are
/// refreshed after each sweep.
///
/// Returns the number of moved blocks.
pub fn update_blocks(
    level: usize,
    hierarchy: &LevelHierarchy,
    store: &mut HistogramStore,
    labels: &mut Array2D<u32>,
    min_confidence: f32,
) -> usize {
    let grid = hierarchy.level(level);
    let mut moves = 0;

    for y in 1..grid.nr_h.saturating_sub(1) {
        let mut x = 1;
        while x + 1 < grid.nr_w {
            match exchange_pair(store, level, grid, Axis::Horizontal, (x, y), min_confidence) {
                Some(Side::Forward) => moves += 1,
                Some(Side::Backward) => {
                    moves += 1;
                    // the block right of the pair has a new neighbor already
                    x += 1;
                }
                None => {}
            }
            x += 1;
        }
    }
    refresh_labels(level, hierarchy, store, labels);

    for x in 1..grid.nr_w.saturating_sub(1) {
        let mut y = 1;
        while y + 1 < grid.nr_h {
            match exchange_pair(store, level, grid, Axis::Vertical, (x, y), min_confidence) {
                Some(Side::Forward) => moves += 1,
                Some(Side::Backward) => {
                    moves += 1;
                    y += 1;
                }
                None => {}
            }
            y += 1;
        }
    }
    refresh_labels(level, hierarchy, store, labels);

    debug_assert!(
        (0..store.num_superpixels()).all(|s| store.partitions(s) >= MINIMUM_NR_SUBLABELS),
        "superpixel without blocks at level {level}"
    );
    moves
}

#[cfg(test)]
mod tests {
    use super::{exchange_block, move_log, refresh_labels, update_blocks};
    use crate::arrays::{Array2D, RGBImage};
    use crate::common::{ColorSpace, Config};
    use crate::connectivity::{Axis, Side};
    use crate::histogram::tests::assert_consistent;
    use crate::histogram::HistogramStore;
    use crate::levels::LevelHierarchy;
    use crate::quantize::QuantizedImage;

    const RED: [u8; 3] = [200, 30, 30];
    const BLUE: [u8; 3] = [30, 30, 200];

    fn setup(
        image: &RGBImage,
        levels: usize,
    ) -> (QuantizedImage, LevelHierarchy, HistogramStore, Array2D<u32>) {
        let config = Config {
            num_levels: levels,
            color_space: ColorSpace::Hsv,
            nr_bins: 3,
            iterations_per_level: 1,
            ..Config::default()
        };
        let quantized = QuantizedImage::new(image, &config);
        let hierarchy = LevelHierarchy::new(image.width, image.height, &config).unwrap();
        let mut store = HistogramStore::new(&quantized, &hierarchy);
        store.descend_to(0);
        let mut labels = Array2D::from_fill(0u32, image.width, image.height);
        refresh_labels(0, &hierarchy, &store, &mut labels);
        (quantized, hierarchy, store, labels)
    }

    #[test]
    fn exchange_block_test() {
        // two 4x4 superpixels, only the first column of blocks is red
        let image = RGBImage::from_fn(8, 4, |x, _| if x < 2 { RED } else { BLUE }).unwrap();
        let (_, hierarchy, mut store, _) = setup(&image, 2);
        let level0 = hierarchy.level(0);
        let blue_block = level0.block_id(1, 0);
        let red_block = level0.block_id(0, 0);

        // a red block stays with the other red blocks
        assert!(!exchange_block(&mut store, 0, red_block, 0, 1, 0.1));
        assert_eq!(store.parent(0, red_block), 0);

        let before = store.intersection(1, 0, blue_block);
        assert!(exchange_block(&mut store, 0, blue_block, 0, 1, 0.1));
        assert_eq!(store.parent(0, blue_block), 1);
        store.delete_block(1, 1, 0, blue_block);
        let gain = store.intersection(1, 0, blue_block) - store.intersection(0, 0, blue_block);
        assert!(gain > 0.1, "gain {gain}, before {before}");
        store.add_block(1, 1, 0, blue_block);

        // a confidence above any possible gain forbids every move
        assert!(!exchange_block(&mut store, 0, blue_block, 1, 0, 1.0));
        assert_eq!(store.partitions(0), 3);
        assert_eq!(store.partitions(1), 5);
    }

    #[test]
    fn update_blocks_two_colors_test() {
        // the red area reaches two pixels into the right superpixels
        let image = RGBImage::from_fn(8, 8, |x, _| if x < 6 { RED } else { BLUE }).unwrap();
        let (quantized, hierarchy, mut store, mut labels) = setup(&image, 2);
        assert_ne!(labels[(4, 2)], labels[(0, 0)]);
        let moves = update_blocks(0, &hierarchy, &mut store, &mut labels, 0.1);
        assert!(moves >= 2);
        // the red interior blocks left the right superpixels
        assert_eq!(labels[(4, 2)], labels[(0, 0)]);
        assert_eq!(labels[(4, 4)], labels[(0, 4)]);
        assert_eq!(labels[(5, 6)], labels[(0, 6)]);
        // the blue column never moves
        for y in 0..8 {
            assert_ne!(labels[(6, y)], labels[(0, y)]);
        }
        assert_consistent(&store, &labels, &quantized);
    }

    #[test]
    fn uniform_image_test() {
        let image = RGBImage::from_fn(16, 16, |_, _| RED).unwrap();
        let (quantized, hierarchy, mut store, mut labels) = setup(&image, 2);
        let before = labels.data.to_vec();
        assert_eq!(update_blocks(0, &hierarchy, &mut store, &mut labels, 0.0), 0);
        assert_eq!(labels.data.as_slice(), before.as_slice());
        assert_consistent(&store, &labels, &quantized);
    }

    #[test]
    fn update_blocks_vertical_test() {
        // the red area reaches two pixels into the lower superpixels
        let image = RGBImage::from_fn(8, 8, |_, y| if y < 6 { RED } else { BLUE }).unwrap();
        let (quantized, hierarchy, mut store, mut labels) = setup(&image, 2);
        move_log::take();
        assert_eq!(update_blocks(0, &hierarchy, &mut store, &mut labels, 0.1), 3);
        let moves = move_log::take();
        let vertical: Vec<_> = moves.iter().filter(|m| m.axis == Axis::Vertical).collect();
        // both moves give the lower block away and skip the following pair
        assert_eq!(vertical.len(), 2);
        assert!(vertical.iter().all(|m| m.side == Side::Backward));
        assert_eq!(labels[(2, 4)], labels[(0, 0)]);
        assert_eq!(labels[(4, 4)], labels[(4, 0)]);
        // the blue row never moves
        for x in 0..8 {
            assert_ne!(labels[(x, 6)], labels[(x, 0)]);
        }
        assert_consistent(&store, &labels, &quantized);
    }

    /// Normalized bin counts of the given pixels.
    fn histogram_of(quantized: &QuantizedImage, pixels: &[(usize, usize)]) -> Vec<f64> {
        let mut histogram = vec![0f64; quantized.histogram_size];
        for &(x, y) in pixels {
            histogram[quantized.bins[(x, y)] as usize] += 1.0 / pixels.len() as f64;
        }
        histogram
    }

    #[test]
    fn accepted_block_moves_gain_confidence_test() {
        // checkerboard of 2x2 tiles, every superpixel starts half red and half blue
        let image = RGBImage::from_fn(16, 16, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                RED
            } else {
                BLUE
            }
        })
        .unwrap();
        let (quantized, hierarchy, mut store, mut labels) = setup(&image, 2);
        let grid = hierarchy.level(0);
        let min_confidence = 0.1;
        move_log::take();
        let moved = update_blocks(0, &hierarchy, &mut store, &mut labels, min_confidence);
        let moves = move_log::take();
        assert_eq!(moves.len(), moved);
        assert!(moves.iter().any(|m| m.axis == Axis::Horizontal));
        assert!(moves.iter().any(|m| m.axis == Axis::Vertical));

        let pixels: Vec<(usize, usize)> =
            (0..16).flat_map(|y| (0..16).map(move |x| (x, y))).collect();
        for m in moves {
            assert_eq!(m.level, 0);
            let block_of = |&(x, y): &(usize, usize)| grid.block_of_pixel(x, y);
            let in_block: Vec<_> = pixels.iter().copied().filter(|p| block_of(p) == m.block).collect();
            let in_from: Vec<_> = pixels
                .iter()
                .copied()
                .filter(|p| block_of(p) != m.block && m.owners[block_of(p)] as usize == m.from)
                .collect();
            let in_to: Vec<_> =
                pixels.iter().copied().filter(|p| m.owners[block_of(p)] as usize == m.to).collect();
            assert!(m.owners.iter().filter(|o| **o as usize == m.from).count() > 1);

            let block = histogram_of(&quantized, &in_block);
            let intersection = |pixels: &[(usize, usize)]| -> f64 {
                histogram_of(&quantized, pixels)
                    .iter()
                    .zip(&block)
                    .map(|(a, b)| a.min(*b))
                    .sum()
            };
            let gain = intersection(&in_to) - intersection(&in_from);
            assert!(gain > min_confidence as f64, "block {} gain {gain}", m.block);
        }
        assert_consistent(&store, &labels, &quantized);
    }
}
