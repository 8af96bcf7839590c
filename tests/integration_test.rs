use ndarray::{Array1, Array2};
use netcdf::{create, open, AttributeValue};
use std::path::Path;
use tempfile::tempdir;
use voxstack::{
    errors::VoxStackError, load_volume, pipeline::run, AggregationConfig, AggregationMode,
    VolumeWriter,
};

const FILL: f32 = -9999.0;

/// Write a 2x3 `f32` image with an `x` coordinate variable and a fill value
fn write_image(path: &Path, values: &[f32]) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("y", 2).expect("Failed to add dimension y");
    file.add_dimension("x", 3).expect("Failed to add dimension x");

    {
        let mut x = file
            .add_variable::<f64>("x", &["x"])
            .expect("Failed to add coordinate variable");
        let coords = Array1::from(vec![0.5, 1.5, 2.5]);
        x.put(coords.view(), ..).expect("Failed to write coordinates");
    }

    let mut var = file
        .add_variable::<f32>("intensity", &["y", "x"])
        .expect("Failed to add variable");
    var.put_attribute("_FillValue", FILL)
        .expect("Failed to add fill value");
    let data = Array2::from_shape_vec((2, 3), values.to_vec()).expect("Invalid test shape");
    var.put(data.view(), ..).expect("Failed to write data");
}

#[test]
fn test_load_volume_geometry_and_fill_values() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("a.nc");
    write_image(&path, &[1.0, 2.0, 3.0, 4.0, 5.0, FILL]);

    let volume = load_volume(&path, None).expect("Failed to load volume");
    let attributes = volume.attributes();
    assert_eq!(attributes.shape, vec![2, 3]);
    assert_eq!(attributes.dimension_names, vec!["y", "x"]);
    assert_eq!(attributes.coordinates[0], None);
    assert_eq!(attributes.coordinates[1], Some(vec![0.5, 1.5, 2.5]));

    assert_eq!(volume.get(0), 1.0);
    assert!(volume.get(5).is_nan());
    assert_eq!(volume.count_foreground(), 5);

    // Naming the variable explicitly gives the same data
    let named = load_volume(&path, Some("intensity")).expect("Failed to load named variable");
    assert_eq!(named.get(4), 5.0);
    assert!(named.attributes_equal(&volume));
}

#[test]
fn test_mean_aggregate_round_trip() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let a = temp_dir.path().join("a.nc");
    let b = temp_dir.path().join("b.nc");
    let out = temp_dir.path().join("mean.nc");
    write_image(&a, &[1.0, 2.0, 3.0, 4.0, 5.0, FILL]);
    write_image(&b, &[3.0, 2.0, 1.0, 4.0, 7.0, 9.0]);

    let volumes = vec![
        load_volume(&a, None).expect("Failed to load a"),
        load_volume(&b, None).expect("Failed to load b"),
    ];
    let config = AggregationConfig::new(AggregationMode::Mean);
    let output = run(&config, volumes, &None).expect("Aggregation failed");

    VolumeWriter::new(&out)
        .with_attribute("aggregation", config.mode.to_string())
        .write(&output)
        .expect("Failed to write output");

    let file = open(&out).expect("Failed to open output");
    let var = file.variable("aggregate").expect("Output variable not found");
    let values: Vec<f32> = var.get_values::<f32, _>(..).expect("Failed to read output");
    // The fill voxel of `a` is ignored, leaving the value of `b`
    assert_eq!(values, vec![2.0, 2.0, 2.0, 4.0, 6.0, 9.0]);

    // Mean output has a NaN background, so no fill value is declared
    assert!(var.attribute("_FillValue").is_none());
    match var.attribute("aggregation").map(|attr| attr.value()) {
        Some(Ok(AttributeValue::Str(s))) => assert_eq!(s, "mean"),
        other => panic!("Unexpected aggregation attribute: {other:?}"),
    }
    assert!(file.attribute("history").is_some());

    // The output carries the input geometry
    let x = file.variable("x").expect("Coordinate variable not found");
    assert_eq!(
        x.get_values::<f64, _>(..).expect("Failed to read coordinates"),
        vec![0.5, 1.5, 2.5]
    );
}

#[test]
fn test_median_output_declares_background() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let a = temp_dir.path().join("a.nc");
    let b = temp_dir.path().join("b.nc");
    let out = temp_dir.path().join("median.nc");
    write_image(&a, &[0.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    write_image(&b, &[0.0, 4.0, 1.0, 4.0, 7.0, 9.0]);

    let volumes = vec![
        load_volume(&a, None).expect("Failed to load a"),
        load_volume(&b, None).expect("Failed to load b"),
    ];
    let config = AggregationConfig::new(AggregationMode::Median).with_padding(Some(0.0));
    let output = run(&config, volumes, &None).expect("Aggregation failed");
    VolumeWriter::new(&out)
        .with_variable("median")
        .write(&output)
        .expect("Failed to write output");

    // Writing again replaces the existing file
    VolumeWriter::new(&out)
        .with_variable("median")
        .write(&output)
        .expect("Failed to overwrite output");

    let file = open(&out).expect("Failed to open output");
    let var = file.variable("median").expect("Output variable not found");
    let values: Vec<f32> = var.get_values::<f32, _>(..).expect("Failed to read output");
    assert_eq!(values[0], 1e-3);
    assert_eq!(&values[1..], &[3.0, 2.0, 4.0, 6.0, 7.5]);

    match var.attribute("_FillValue").map(|attr| attr.value()) {
        Some(Ok(AttributeValue::Float(v))) => assert_eq!(v, 1e-3),
        other => panic!("Unexpected fill value: {other:?}"),
    }
}

#[test]
fn test_load_errors_name_the_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing.nc");
    match load_volume(&missing, None) {
        Err(err @ VoxStackError::Load { .. }) => {
            assert!(err.to_string().contains("missing.nc"));
        }
        other => panic!("Expected load error, got {other:?}"),
    }

    let path = temp_dir.path().join("a.nc");
    write_image(&path, &[1.0; 6]);
    assert!(matches!(
        load_volume(&path, Some("temperature")),
        Err(VoxStackError::VariableNotFound { .. })
    ));
}
