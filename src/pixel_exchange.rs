use crate::arrays::Array2D;
use crate::common::Config;
use crate::connectivity::{check_split, Axis, PairWindow, Side};
use crate::histogram::HistogramStore;
use crate::quantize::QuantizedImage;

/// How a pixel chooses between two superpixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rule {
    /// Share of the pixel's bin in the superpixel histogram.
    Histogram,
    /// Squared distance of the working channels to the superpixel mean.
    Mean,
}

/// Fraction of the pixels of `superpixel` falling into `bin`, scaled by the prior.
#[inline(always)]
pub fn histogram_probability(store: &HistogramStore, superpixel: usize, bin: u32, prior: u32) -> f32 {
    let count = store.count(store.top(), superpixel);
    if count == 0 {
        return 0.0;
    }
    let hits = store.histogram(store.top(), superpixel)[bin as usize];
    hits as f32 / count as f32 * prior as f32
}

/// Squared distance of `values` to the mean of `superpixel`, divided by the prior.
///
/// Superpixels without pixels or without a neighbor in the window are infinitely far away.
#[inline(always)]
pub fn mean_distance(
    store: &HistogramStore,
    superpixel: usize,
    values: &[f32; 3],
    prior: u32,
) -> f32 {
    match store.mean(superpixel) {
        Some(mean) if prior > 0 => {
            let d: f32 = values
                .iter()
                .zip(mean)
                .map(|(v, m)| (v - m) * (v - m))
                .sum();
            d / prior as f32
        }
        _ => f32::INFINITY,
    }
}

/// Moves single pixels between neighboring superpixels.
pub struct PixelExchange<'a> {
    image: &'a QuantizedImage,
    rule: Rule,
    use_local_prior: bool,
}

impl<'a> PixelExchange<'a> {
    pub fn new(image: &'a QuantizedImage, config: &Config) -> PixelExchange<'a> {
        PixelExchange {
            image,
            rule: if config.use_mean_refinement {
                Rule::Mean
            } else {
                Rule::Histogram
            },
            use_local_prior: config.use_local_prior,
        }
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Whether pixel `(x, y)` fits superpixel `to` strictly better than `from`.
    #[inline]
    pub fn prefers(
        &self,
        store: &HistogramStore,
        (x, y): (usize, usize),
        from: usize,
        to: usize,
        prior_from: u32,
        prior_to: u32,
    ) -> bool {
        match self.rule {
            Rule::Histogram => {
                let bin = self.image.bins[(x, y)];
                histogram_probability(store, to, bin, prior_to)
                    > histogram_probability(store, from, bin, prior_from)
            }
            Rule::Mean => {
                let values = &self.image.channels[(x, y)];
                mean_distance(store, from, values, prior_from)
                    > mean_distance(store, to, values, prior_to)
            }
        }
    }

    /// Gives pixel `(x, y)` to superpixel `to`.
    pub fn move_pixel(
        &self,
        store: &mut HistogramStore,
        labels: &mut Array2D<u32>,
        (x, y): (usize, usize),
        to: usize,
    ) {
        let from = labels[(x, y)] as usize;
        let bin = self.image.bins[(x, y)];
        let values = &self.image.channels[(x, y)];
        let top = store.top();
        store.delete_pixel(top, from, bin);
        store.add_pixel(top, to, bin);
        store.delete_pixel_channels(from, values);
        store.add_pixel_channels(to, values);
        labels[(x, y)] = to as u32;
    }

    /// Tries to exchange the pixel pair at `(x, y)`. A forward pass tries the first pixel first, a
    /// backward pass the second one.
    fn exchange_pair(
        &self,
        store: &mut HistogramStore,
        labels: &mut Array2D<u32>,
        axis: Axis,
        (x, y): (usize, usize),
        forward: bool,
    ) -> Option<Side> {
        let window = PairWindow::from_labels(axis, x, y, labels);
        let label_a = window.first() as usize;
        let label_b = window.second() as usize;
        if label_a == label_b {
            return None;
        }
        let first = (x, y);
        let second = match axis {
            Axis::Horizontal => (x + 1, y),
            Axis::Vertical => (x, y + 1),
        };
        let (prior_a, prior_b) = if self.use_local_prior {
            (window.prior(label_a as u32), window.prior(label_b as u32))
        } else {
            (1, 1)
        };
        let order = if forward {
            [Side::Forward, Side::Backward]
        } else {
            [Side::Backward, Side::Forward]
        };
        for side in order {
            // a forbidden first attempt also ends the pair
            if check_split(&window.neighborhood(side), axis, side) {
                return None;
            }
            let moved = match side {
                Side::Forward => self.prefers(store, first, label_a, label_b, prior_a, prior_b),
                Side::Backward => self.prefers(store, second, label_b, label_a, prior_b, prior_a),
            };
            if moved {
                let (pixel, to) = match side {
                    Side::Forward => (first, label_b),
                    Side::Backward => (second, label_a),
                };
                #[cfg(test)]
                move_log::record(labels, pixel, to, Some((axis, (x, y))));
                self.move_pixel(store, labels, pixel, to);
                return Some(side);
            }
        }
        None
    }

    /// One horizontal and one vertical sweep over the interior pixels followed by the border
    /// pixels. Returns the number of moved pixels.
    pub fn update_pixels(
        &self,
        store: &mut HistogramStore,
        labels: &mut Array2D<u32>,
        forward: bool,
    ) -> usize {
        let (width, height) = (labels.width, labels.height);
        let mut moves = 0;

        for y in 1..height.saturating_sub(1) {
            let mut x = 1;
            while x + 1 < width {
                if let Some(side) = self.exchange_pair(store, labels, Axis::Horizontal, (x, y), forward) {
                    moves += 1;
                    if side == Side::Backward {
                        x += 1;
                    }
                }
                x += 1;
            }
        }

        for x in 1..width.saturating_sub(1) {
            let mut y = 1;
            while y + 1 < height {
                if let Some(side) = self.exchange_pair(store, labels, Axis::Vertical, (x, y), forward) {
                    moves += 1;
                    if side == Side::Backward {
                        y += 1;
                    }
                }
                y += 1;
            }
        }

        moves + self.update_border(store, labels)
    }

    /// Border pixels take the label of their single interior neighbor whenever it differs.
    fn update_border(&self, store: &mut HistogramStore, labels: &mut Array2D<u32>) -> usize {
        let (width, height) = (labels.width, labels.height);
        if width < 2 || height < 2 {
            return 0;
        }
        let mut candidates = Vec::with_capacity(2 * (width + height));
        for x in 0..width {
            candidates.push(((x, 0), (x, 1)));
            candidates.push(((x, height - 1), (x, height - 2)));
        }
        for y in 0..height {
            candidates.push(((0, y), (1, y)));
            candidates.push(((width - 1, y), (width - 2, y)));
        }
        let mut moves = 0;
        for (pixel, neighbor) in candidates {
            let to = labels[neighbor] as usize;
            if labels[pixel] as usize != to {
                #[cfg(test)]
                move_log::record(labels, pixel, to, None);
                self.move_pixel(store, labels, pixel, to);
                moves += 1;
            }
        }
        moves
    }
}
