//! End-to-end scenarios for the scale operator.

use proptest::prelude::*;
use std::sync::Arc;
use tilescale::prelude::*;
use tilescale::scale::dispatch::TileCase;
use tilescale::scale::splitter::TileSplitter;

fn source_u8(width: i64, height: i64, tile: i64) -> Arc<dyn ImageSource> {
    let raster = Raster::from_fn(Rect::new(0, 0, width, height), 1, |x, y, _| ((100 + x + 10 * y) % 256) as u8);
    Arc::new(MemoryImage::new(raster, tile, tile))
}

fn source_f64(rect: Rect, tile: i64, f: impl FnMut(i64, i64, usize) -> f64) -> Arc<dyn ImageSource> {
    Arc::new(MemoryImage::new(Raster::from_fn(rect, 1, f), tile, tile))
}

#[test]
fn test_identity_nearest_reproduces_source() {
    let source = source_u8(13, 9, 4);
    let expected = source.read_region(source.bounds()).unwrap();

    let op = ScaleOp::new(source, &ScaleConfig::new().with_tile_size(5, 5)).unwrap();
    assert_eq!(op.bounds(), Rect::new(0, 0, 13, 9));
    assert_eq!(op.computable_bounds(), op.bounds());
    assert_eq!(op.compute_image().unwrap(), expected);
}

#[test]
fn test_upscale_by_two_nearest() {
    let op = ScaleOp::new(source_u8(10, 10, 4), &ScaleConfig::new().with_scale(2.0, 2.0)).unwrap();
    assert_eq!(op.bounds(), Rect::new(0, 0, 20, 20));

    let image = op.compute_image().unwrap();
    assert_eq!(image.get(5, 5, 0), Some((100 + 2 + 20) as f64));
    for y in 0..20 {
        for x in 0..20 {
            let expected = (100 + x / 2 + 10 * (y / 2)) as f64;
            assert_eq!(image.get(x, y, 0), Some(expected), "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_upscale_with_roi_fills_outside_with_no_data() {
    let config = ScaleConfig::new()
        .with_scale(2.0, 2.0)
        .with_dest_no_data(vec![9.0])
        .with_tile_size(7, 7);
    let op = ScaleOp::new(source_u8(10, 10, 4), &config)
        .unwrap()
        .with_roi(Arc::new(RectRoi::new(Rect::new(0, 0, 5, 5))));

    let image = op.compute_image().unwrap();
    assert_eq!(image.get(5, 5, 0), Some(122.0));
    for y in 0..20 {
        for x in 0..20 {
            let inside = x / 2 < 5 && y / 2 < 5;
            let value = image.get(x, y, 0).unwrap();
            if inside {
                assert_eq!(value, (100 + x / 2 + 10 * (y / 2)) as f64);
            } else {
                assert_eq!(value, 9.0, "pixel ({}, {}) maps outside the ROI", x, y);
            }
        }
    }
}

#[test]
fn test_bilinear_one_excluded_sample_renormalizes() {
    // Translation 1/2 puts destination pixel 2 halfway between source 1 and 2.
    let source = source_f64(Rect::new(0, 0, 4, 4), 4, |x, y, _| match (x, y) {
        (1, 1) => -1.0,
        (2, 1) => 20.0,
        (1, 2) => 30.0,
        (2, 2) => 40.0,
        _ => 0.0,
    });
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bilinear)
        .with_translation(0.5, 0.5)
        .with_dest_no_data(vec![f64::NAN]);

    let plain = ScaleOp::new(source.clone(), &config).unwrap();
    assert_eq!(plain.compute_image().unwrap().get(2, 2, 0), Some(22.25));

    let masked = ScaleOp::new(source, &config)
        .unwrap()
        .with_no_data(NoDataRange::single(-1.0));
    let image = masked.compute_image().unwrap();
    // Top row collapses onto 20, bottom row averages to 35.
    assert_eq!(image.get(2, 2, 0), Some(27.5));
}

#[test]
fn test_bilinear_identity_no_data_hole_stays_no_data() {
    // Identity bilinear samples at whole positions; neighbours carry zero weight.
    let source = source_f64(Rect::new(0, 0, 4, 4), 4, |x, y, _| match (x, y) {
        (1, 1) => -1.0,
        _ => (10 * x + y) as f64,
    });
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bilinear)
        .with_border(BorderMode::Copy)
        .with_dest_no_data(vec![-555.0]);
    let op = ScaleOp::new(source, &config)
        .unwrap()
        .with_no_data(NoDataRange::single(-1.0));
    assert_eq!(op.bounds(), Rect::new(0, 0, 4, 4));

    let image = op.compute_image().unwrap();
    assert_eq!(image.get(1, 1, 0), Some(-555.0));
    assert_eq!(image.get(2, 1, 0), Some(21.0));
    assert_eq!(image.get(1, 2, 0), Some(12.0));
    assert_eq!(image.get(0, 0, 0), Some(0.0));
}

#[test]
fn test_bilinear_weights_stay_normalized_under_exclusion() {
    // A constant field with scattered no-data must stay constant.
    let source = source_f64(Rect::new(0, 0, 12, 12), 5, |x, y, _| {
        if (x * 7 + y * 3) % 5 == 0 {
            -999.0
        } else {
            50.0
        }
    });
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bilinear)
        .with_scale(1.7, 2.3)
        .with_translation(0.25, -0.5)
        .with_dest_no_data(vec![-1.0]);
    let op = ScaleOp::new(source, &config)
        .unwrap()
        .with_no_data(NoDataRange::single(-999.0));
    let image = op.compute_image().unwrap();
    for &v in image.as_slice::<f64>().unwrap() {
        assert!(v == -1.0 || (v - 50.0).abs() < 1e-12, "unexpected {}", v);
    }
}

#[test]
fn test_compute_tile_is_idempotent() {
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bicubic)
        .with_scale(1.5, 0.75)
        .with_tile_size(8, 8);
    let op = ScaleOp::new(source_u8(30, 30, 7), &config)
        .unwrap()
        .with_roi(Arc::new(MaskRoi::from_rects(&[Rect::new(0, 0, 12, 30), Rect::new(18, 5, 6, 6)])))
        .with_no_data(NoDataRange::single(150.0));

    let first = op.compute_tile(1, 1).unwrap();
    let second = op.compute_tile(1, 1).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bilinear)
        .with_scale(0.6, 1.4)
        .with_tile_size(6, 10);
    let source = source_u8(40, 25, 8);

    let sequential = ScaleOp::new(source.clone(), &config.clone().with_parallel(false))
        .unwrap()
        .compute_image()
        .unwrap();
    let pooled = ScaleOp::new(source, &config.with_threads(3)).unwrap().compute_image().unwrap();
    assert_eq!(sequential, pooled);
}

#[test]
fn test_source_tiling_does_not_change_results() {
    // Source tiles of one pixel make every split segment narrower than the
    // bicubic kernel; the rescued work items must still cover everything.
    let raster = Raster::from_fn(Rect::new(0, 0, 16, 16), 1, |x, y, _| ((x * 37 + y * 11) % 97) as f32);
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bicubic)
        .with_scale(2.5, 3.0)
        .with_tile_size(9, 9);

    let coarse = ScaleOp::new(Arc::new(MemoryImage::new(raster.clone(), 64, 64)), &config)
        .unwrap()
        .compute_image()
        .unwrap();
    let fine = ScaleOp::new(Arc::new(MemoryImage::new(raster, 1, 1)), &config)
        .unwrap()
        .compute_image()
        .unwrap();
    assert_eq!(coarse, fine);
}

#[test]
fn test_translation_shifts_bounds() {
    let op = ScaleOp::new(source_u8(6, 4, 4), &ScaleConfig::new().with_translation(3.0, -2.0)).unwrap();
    assert_eq!(op.bounds(), Rect::new(3, -2, 6, 4));
    let image = op.compute_image().unwrap();
    assert_eq!(image.get(3, -2, 0), Some(100.0));
    assert_eq!(image.get(8, 1, 0), Some(135.0));
}

#[test]
fn test_border_extension_computes_whole_destination() {
    let raster = Raster::from_fn(Rect::new(0, 0, 5, 5), 1, |x, _, _| x as i16 * 10 - 20);
    let source: Arc<dyn ImageSource> = Arc::new(MemoryImage::new(raster, 2, 2));
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bicubic)
        .with_scale(2.0, 2.0)
        .with_border(BorderMode::Copy)
        .with_dest_no_data(vec![i16::MIN as f64]);

    let op = ScaleOp::new(source, &config).unwrap();
    assert_eq!(op.bounds(), Rect::new(0, 0, 10, 10));
    assert_eq!(op.computable_bounds(), op.bounds());

    let image = op.compute_image().unwrap();
    let values = image.as_slice::<i16>().unwrap();
    assert!(values.iter().all(|&v| v != i16::MIN));
    // The gradient is constant along y, so every column is too.
    for x in 0..10 {
        let top = image.get(x, 0, 0);
        assert!((1..10).all(|y| image.get(x, y, 0) == top), "column {}", x);
    }
    assert!(image.get(0, 0, 0) < image.get(9, 0, 0));
}

#[test]
fn test_no_border_margin_stays_no_data() {
    let config = ScaleConfig::new()
        .with_interpolation(InterpolationKind::Bicubic)
        .with_scale(2.0, 2.0)
        .with_dest_no_data(vec![7.0]);
    let op = ScaleOp::new(source_u8(8, 8, 4), &config).unwrap();
    let bounds = op.bounds();
    let source = Rect::new(0, 0, 8, 8);
    assert!(source.contains_rect(&op.mapper().backward_map(&op.computable_bounds())));
    assert_eq!(op.compute_image().unwrap().rect(), bounds);
}

#[test]
fn test_multiband_no_data_is_per_band() {
    let raster = Raster::from_fn(Rect::new(0, 0, 4, 4), 2, |x, _, b| if b == 0 { x as u16 } else { 5 });
    let source: Arc<dyn ImageSource> = Arc::new(MemoryImage::new(raster, 4, 4));
    let config = ScaleConfig::new().with_dest_no_data(vec![100.0, 200.0]);
    let op = ScaleOp::new(source, &config)
        .unwrap()
        .with_no_data(NoDataRange::single(5.0));
    let image = op.compute_image().unwrap();
    assert_eq!(image.get(2, 0, 0), Some(2.0));
    assert_eq!(image.get(2, 0, 1), Some(200.0));
}

#[test]
fn test_too_many_no_data_values() {
    let config = ScaleConfig::new().with_dest_no_data(vec![1.0, 2.0]);
    let err = ScaleOp::new(source_u8(4, 4, 4), &config).unwrap_err();
    assert!(matches!(err, ConfigError::NoDataBands { bands: 1, got: 2 }));
}

#[test]
fn test_tile_case_for_covering_roi() {
    let roi = RectRoi::new(Rect::new(-10, -10, 100, 100));
    assert_eq!(TileCase::select(Some(&roi as &dyn Roi), None, &Rect::new(0, 0, 8, 8)), TileCase::NoMask);
}

#[test]
fn test_config_file_drives_operator() {
    let config = ScaleConfig::from_toml_str(
        r#"
        scale_x = 0.5
        scale_y = 0.5
        interpolation = "bilinear"
        tile_width = 3
        tile_height = 3
        parallel = false
        "#,
    )
    .unwrap();
    let op = ScaleOp::new(source_u8(12, 12, 4), &config).unwrap();
    // ceil(1/2 * 1/2 - 1/2) = 0, ceil((12 - 1 - 1/2) / 2 - 1/2) = 5
    assert_eq!(op.bounds(), Rect::new(0, 0, 5, 5));
    assert_eq!(op.tile_grid().tile_width, 3);
    let image = op.compute_image().unwrap();
    // Pixel 0 sits exactly between source 0 and 1 on both axes.
    assert_eq!(image.get(0, 0, 0), Some(106.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_splitter_covers_destination_once(
        num in 1i64..24, den in 1i64..24,
        tile in 1i64..9,
        kind in 0usize..3,
        w in 1i64..30, h in 1i64..30,
    ) {
        let interp = [Interpolation::nearest(), Interpolation::bilinear(), Interpolation::bicubic()][kind].clone();
        let params = ScaleParams::new(num as f64 / den as f64, den as f64 / num as f64, 0.0, 0.0).unwrap();
        let mapper = Mapper::new(&params, &interp);
        let splitter = TileSplitter::new(&mapper, TileGrid::new(0, 0, tile, tile));
        let dest = Rect::new(-2, 3, w, h);

        let mut hits = vec![0u8; dest.area() as usize];
        for item in splitter.split(&dest) {
            prop_assert_eq!(item.src, mapper.backward_map(&item.dst));
            for y in item.dst.y..item.dst.bottom() {
                for x in item.dst.x..item.dst.right() {
                    prop_assert!(dest.contains_point(x, y));
                    hits[((y - dest.y) * dest.width + (x - dest.x)) as usize] += 1;
                }
            }
        }
        prop_assert!(hits.iter().all(|&n| n == 1));
    }

    #[test]
    fn prop_forward_map_reads_only_its_source(
        x in -20i64..20, y in -20i64..20,
        w in 1i64..40, h in 1i64..40,
        num in 1i64..16, den in 1i64..16,
        kind in 0usize..3,
    ) {
        let interp = [Interpolation::nearest(), Interpolation::bilinear(), Interpolation::bicubic()][kind].clone();
        let params = ScaleParams::new(num as f64 / den as f64, den as f64 / num as f64, 0.5, -1.0).unwrap();
        let source = Rect::new(x, y, w, h);
        let dest = forward_map(&source, &params, &interp);
        if !dest.is_empty() {
            prop_assert!(source.contains_rect(&backward_map(&dest, &params, &interp)));
        }
    }
}
