use crate::error::{Error, Result};
use aligned_vec::{AVec, ConstAlign};
use std::ops::{Index, IndexMut};

const ALIGN: usize = 64;

/// Row-major 2D array with 64-byte aligned storage. Indexed by `(x, y)`.
#[derive(Debug, Clone)]
pub struct Array2D<T> {
    pub data: AVec<T, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl<T> Array2D<T> {
    pub fn from_slice(data: &[T], width: usize, height: usize) -> Result<Self>
    where
        T: Clone,
    {
        if data.len() != width * height {
            return Err(Error::DimensionMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: AVec::from_slice(ALIGN, data),
        })
    }

    pub fn from_fill(value: T, width: usize, height: usize) -> Self
    where
        T: Clone + Copy,
    {
        let data: AVec<T, ConstAlign<ALIGN>> =
            AVec::from_iter(ALIGN, (0..width * height).map(|_| value));
        Self {
            width,
            height,
            data,
        }
    }

    /// Builds the array from a function of `(x, y)`, filled in row-major order.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let data: AVec<T, ConstAlign<ALIGN>> = AVec::from_iter(
            ALIGN,
            (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).map(|(x, y)| f(x, y)),
        );
        Self {
            width,
            height,
            data,
        }
    }

    pub fn get_row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.height);
        &self.data[(self.width * row)..(self.width * row + self.width)]
    }

    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            self.width > x,
            "Index ({x}, {y}) is out of bounds ({}, {})",
            self.width,
            self.height
        );
        debug_assert!(
            self.height > y,
            "Index ({x}, {y}) is out of bounds ({}, {})",
            self.width,
            self.height
        );
        self.width * y + x
    }

    /// Element at `(x, y)` or `None` outside of the array.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            Some(&self.data[self.width * y + x])
        } else {
            None
        }
    }
}

impl<T> Index<(usize, usize)> for Array2D<T> {
    type Output = T;
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(x, y)]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2D<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        let idx = self.get_index(x, y);
        &mut self.data[idx]
    }
}

/// Packed RGB24 image (the layout of `image::RgbImage`).
///
/// The image is never modified by the segmentation.
#[derive(Debug, Clone)]
pub struct RGBImage {
    pub rgb_data: AVec<u8, ConstAlign<ALIGN>>,
    pub width: usize,
    pub height: usize,
}

impl RGBImage {
    pub fn from_rgb(rgb_image: &[u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        if rgb_image.len() != width * height * 3 {
            return Err(Error::DimensionMismatch {
                expected: width * height * 3,
                actual: rgb_image.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgb_data: AVec::from_slice(ALIGN, rgb_image),
        })
    }

    /// Builds the image from a function of `(x, y)` returning the RGB triplet.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        let rgb_data = AVec::from_iter(
            ALIGN,
            (0..height)
                .flat_map(|y| (0..width).map(move |x| (x, y)))
                .flat_map(|(x, y)| f(x, y)),
        );
        Ok(Self {
            width,
            height,
            rgb_data,
        })
    }

    #[inline(always)]
    pub fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(self.width > x);
        debug_assert!(self.height > y);
        self.width * y * 3 + x * 3
    }

    #[inline(always)]
    pub fn get_pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = self.get_index(x, y);
        [
            self.rgb_data[idx],
            self.rgb_data[idx + 1],
            self.rgb_data[idx + 2],
        ]
    }

    /// Iterates pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.rgb_data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::{Array2D, RGBImage};
    use crate::error::Error;

    #[test]
    fn array2d_index_test() {
        let mut arr = Array2D::from_fn(5, 3, |x, y| (x + 10 * y) as u32);
        assert_eq!(arr[(4, 2)], 24);
        assert_eq!(arr.get_row(1), &[10, 11, 12, 13, 14]);
        arr[(0, 1)] = 99;
        assert_eq!(arr.data[5], 99);
        assert_eq!(arr.get(5, 0), None);
        assert_eq!(arr.get(4, 0), Some(&4));
    }

    #[test]
    fn array2d_from_slice_test() {
        assert!(Array2D::from_slice(&[0u32; 6], 3, 2).is_ok());
        assert_eq!(
            Array2D::from_slice(&[0u32; 5], 3, 2).unwrap_err(),
            Error::DimensionMismatch {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn rgb_image_test() {
        let img = RGBImage::from_fn(4, 2, |x, y| [x as u8, y as u8, 7]).unwrap();
        assert_eq!(img.rgb_data.len(), 4 * 2 * 3);
        assert_eq!(img.get_pixel(3, 1), [3, 1, 7]);
        assert_eq!(img.pixels().count(), 8);
        assert_eq!(RGBImage::from_rgb(&[], 0, 4).unwrap_err(), Error::EmptyImage);
        assert!(RGBImage::from_rgb(&[0u8; 11], 2, 2).is_err());
    }
}
