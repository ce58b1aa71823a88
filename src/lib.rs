//! SEEDS superpixels in Rust.
//!
//! SEEDS (Superpixels Extracted via Energy-Driven Sampling) starts from a regular grid of
//! superpixels and refines it coarse to fine. Blocks of pixels at several resolutions are moved
//! between neighboring superpixels when their color histogram fits the neighbor better, and
//! finally single boundary pixels are exchanged using either the histograms or the mean colors
//! of the superpixels.
//!
//! The following example describes how to process image in packed RGB24 (RGB 8bit) format
//! (default for image crate):
//!
//! ```rust
//! use seeds_rust::arrays::RGBImage;
//! use seeds_rust::common::*;
//! use seeds_rust::seeds::Seeds;
//!
//! fn main(){
//!     // synthetic image, use image::open() and as_rgb8() for real ones
//!     let (width, height) = (64, 48);
//!     let img: Vec<u8> = (0..width * height)
//!         .flat_map(|i| [(i % width * 4) as u8, (i / width * 5) as u8, 128])
//!         .collect();
//!     let image = RGBImage::from_rgb(img.as_slice(), width, height).unwrap();
//!     // create config with defaults and ask for about 40 superpixels
//!     let config = Config::default().with_superpixels(width, height, 40);
//!     // quantize the image and build the histograms
//!     let mut seeds = Seeds::initialize(&image, &config).unwrap();
//!     // block updates from coarse to fine, then pixel updates
//!     seeds.iterate();
//!     let labels = seeds.labels();
//!     assert_eq!(labels.data.len(), width * height);
//! }
//! ```
//!
//! The labels are not guaranteed to be connected. Use `connectivity::relabel_connected()` if
//! every superpixel has to be a single 4-connected region.
//!
//! Independent images can be processed in parallel with `seeds::segment_batch()`. A single
//! segmentation is sequential, since the result depends on the order in which blocks and pixels
//! are visited.
//!
//! The library logs through the `log` crate and never installs a logger.
//!

pub mod arrays;
pub mod block_exchange;
pub mod colorspace;
pub mod common;
pub mod connectivity;
pub mod error;
pub mod histogram;
pub mod levels;
pub mod pixel_exchange;
pub mod quantize;
pub mod seeds;
