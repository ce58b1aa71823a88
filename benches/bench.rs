use criterion::*;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use seeds_rust::arrays::RGBImage;
use seeds_rust::block_exchange::update_blocks;
use seeds_rust::common::{ColorSpace, Config};
use seeds_rust::connectivity::relabel_connected;
use seeds_rust::histogram::HistogramStore;
use seeds_rust::levels::LevelHierarchy;
use seeds_rust::quantize::QuantizedImage;
use seeds_rust::seeds::{segment, segment_batch, Seeds};
use std::time::Duration;

/// BSDS sized test image with gradients, stripes and a few sharp edges.
fn test_image(width: u32, height: u32) -> RGBImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let stripe = if (x / 23 + y / 17) % 3 == 0 { 80 } else { 0 };
        let disc = if (x as i64 - width as i64 / 2).pow(2) + (y as i64 - height as i64 / 3).pow(2)
            < (height as i64 / 4).pow(2)
        {
            120
        } else {
            0
        };
        image::Rgb([
            ((x * 255 / width) as u8).saturating_add(stripe),
            ((y * 255 / height) as u8).saturating_add(disc),
            (((x + 2 * y) * 3) % 256) as u8,
        ])
    });
    from_image(&DynamicImage::ImageRgb8(img))
}

fn from_image(dimg: &DynamicImage) -> RGBImage {
    let img = dimg.to_rgb8();
    RGBImage::from_rgb(
        img.as_raw().as_slice(),
        img.width() as usize,
        img.height() as usize,
    )
    .unwrap()
}

fn bench_quantize(c: &mut Criterion) {
    let image = test_image(481, 321);
    let mut group = c.benchmark_group("quantize");
    for color_space in [ColorSpace::Rgb, ColorSpace::Lab, ColorSpace::Hsv] {
        let config = Config {
            color_space,
            ..Config::default()
        };
        group.bench_with_input(
            BenchmarkId::new("quantize", format!("{:?}", color_space)),
            &config,
            |b, config| {
                b.iter(|| {
                    let _ = black_box(QuantizedImage::new(&image, config));
                });
            },
        );
    }
}

fn bench_histograms(c: &mut Criterion) {
    let image = test_image(481, 321);
    let config = Config::default();
    let quantized = QuantizedImage::new(&image, &config);
    let hierarchy = LevelHierarchy::new(image.width, image.height, &config).unwrap();
    c.bench_function("histogram_store", |b| {
        b.iter(|| {
            let _ = black_box(HistogramStore::new(&quantized, &hierarchy));
        });
    });
}

fn bench_update_blocks(c: &mut Criterion) {
    let image = test_image(481, 321);
    let config = Config::default();
    let seeds = Seeds::initialize(&image, &config).unwrap();
    let hierarchy = seeds.hierarchy().clone();
    let mut store = seeds.histograms().clone();
    let mut labels = seeds.labels().clone();
    store.descend_to(hierarchy.top() - 1);
    c.bench_function("update_blocks", |b| {
        b.iter(|| {
            let _ = black_box(update_blocks(
                hierarchy.top() - 1,
                &hierarchy,
                &mut store,
                &mut labels,
                config.min_confidence,
            ));
        });
    });
}

fn bench_seeds_image(c: &mut Criterion) {
    let image = test_image(481, 321);
    let mut group = c.benchmark_group("SEEDS iterate BSDS");
    for use_mean_refinement in [false, true] {
        for superpixels in [200, 400, 1200] {
            let config = Config {
                use_mean_refinement,
                ..Config::default()
            }
            .with_superpixels(image.width, image.height, superpixels);
            group.bench_with_input(
                BenchmarkId::new(
                    "bench_seeds_image",
                    format!("means={use_mean_refinement}-superpixels={superpixels}"),
                ),
                &config,
                |b, config| {
                    b.iter(|| {
                        let _ = black_box(segment(&image, config).unwrap());
                    });
                },
            );
        }
    }
}

fn bench_seeds_image_hd(c: &mut Criterion) {
    let dimg = DynamicImage::ImageRgb8(RgbImage::from_fn(640, 360, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
    .resize_exact(1280, 720, FilterType::CatmullRom);
    let image = from_image(&dimg);
    let config = Config::default().with_superpixels(image.width, image.height, 1000);
    c.bench_function("bench_seeds_image_hd", |b| {
        b.iter(|| {
            let _ = black_box(segment(&image, &config).unwrap());
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let images: Vec<RGBImage> = (0..8).map(|i| test_image(321 + i * 8, 241)).collect();
    let config = Config::default();
    c.bench_function("segment_batch", |b| {
        b.iter(|| {
            let _ = black_box(segment_batch(&images, &config));
        });
    });
}

fn bench_relabel_connected(c: &mut Criterion) {
    let image = test_image(481, 321);
    let labels = segment(&image, &Config::default()).unwrap();
    c.bench_function("relabel_connected", |b| {
        b.iter_batched(
            || labels.clone(),
            |mut labels| black_box(relabel_connected(&mut labels)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(name = benches;
config = Criterion::default().measurement_time(Duration::from_secs(10)).warm_up_time(Duration::from_secs(3));
targets = bench_quantize, bench_histograms, bench_update_blocks, bench_relabel_connected);
criterion_group!(name = benches1;
config = Criterion::default().measurement_time(Duration::from_secs(30)).warm_up_time(Duration::from_secs(10));
targets = bench_seeds_image, bench_seeds_image_hd, bench_batch);
criterion_main!(benches, benches1);
