//! Raster coarsening and file-backed raster sources

use exposure_resampler::core::config::ResamplerConfig;
use exposure_resampler::core::error::ResampleError;
use exposure_resampler::core::types::{Quantities, TaxonomyKey};
use exposure_resampler::exposure::ExposureAggregate;
use exposure_resampler::pipeline::Pipeline;
use exposure_resampler::raster::{Affine, RasterAggregator, RasterFile, RasterGrid, RasterSource};
use exposure_resampler::spatial::BoundaryPolygon;
use geo::polygon;

fn source() -> RasterGrid {
    let data = vec![
        1.0, 2.0, 3.0, 4.0, //
        5.0, 6.0, 7.0, 8.0, //
        -1.0, -1.0, 0.5, 1.5, //
        -1.0, -1.0, 2.5, 3.5,
    ];
    RasterGrid::new(4, 4, Affine::north_up(10.0, 50.0, 0.5, 0.5), Some(-1.0), data).unwrap()
}

#[test]
fn test_same_resolution_is_identity() {
    let config = ResamplerConfig {
        resolution: 0.5,
        ..Default::default()
    };
    let grid = source();
    let once = RasterAggregator::new(&config).aggregate(&grid).unwrap();
    let twice = RasterAggregator::new(&config).aggregate(&once).unwrap();

    assert_eq!(
        serde_json::to_string(&grid).unwrap(),
        serde_json::to_string(&once).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&twice).unwrap()
    );
}

#[test]
fn test_coarsening_means_and_nodata() {
    let config = ResamplerConfig {
        resolution: 1.0,
        ..Default::default()
    };
    let coarse = RasterAggregator::new(&config).aggregate(&source()).unwrap();

    assert_eq!((coarse.width, coarse.height), (2, 2));
    assert_eq!(coarse.resolution(), (1.0, 1.0));
    assert_eq!(coarse.valid(0, 0), Some(3.5));
    assert_eq!(coarse.valid(0, 1), Some(5.5));
    assert_eq!(coarse.valid(1, 0), None);
    assert_eq!(coarse.valid(1, 1), Some(2.0));
    assert_eq!(coarse.cell_center(0, 0), (10.5, 49.5));
}

#[test]
fn test_finer_resolution_rejected() {
    let config = ResamplerConfig {
        resolution: 0.25,
        ..Default::default()
    };
    assert!(matches!(
        RasterAggregator::new(&config).aggregate(&source()),
        Err(ResampleError::InvalidResolution { .. })
    ));
}

#[test]
fn test_raster_file_drives_pipeline() {
    let path = std::env::temp_dir().join(format!(
        "exposure_resampler_raster_{}.json",
        std::process::id()
    ));
    std::fs::write(&path, serde_json::to_string(&source()).unwrap()).unwrap();

    let raster = RasterFile::new(&path);
    assert_eq!(raster.open().unwrap().into_owned(), source());

    let boundary = BoundaryPolygon::new(
        "DE-1",
        polygon![
            (x: 10.0, y: 48.0),
            (x: 12.0, y: 48.0),
            (x: 12.0, y: 50.0),
            (x: 10.0, y: 50.0),
            (x: 10.0, y: 48.0),
        ],
    );
    let exposure = ExposureAggregate::new(
        "DE-1",
        TaxonomyKey::single("taxonomy", "CR"),
        Quantities::new(9.0, vec![90.0, 9.0]),
    );
    let config = ResamplerConfig {
        resolution: 1.0,
        ..Default::default()
    };
    let output = Pipeline::new(config)
        .unwrap()
        .run(&raster, &[boundary], &[exposure])
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert!((output.statistics.output_total - 9.0).abs() < 1e-9);
    // Cells with nodata never receive samples
    assert!(output.samples.iter().all(|s| !(s.x < 11.0 && s.y < 49.0)));
}

#[test]
fn test_missing_raster_file() {
    let raster = RasterFile::new("does/not/exist.json");
    assert!(matches!(
        raster.open(),
        Err(ResampleError::MissingInput { .. })
    ));
}
