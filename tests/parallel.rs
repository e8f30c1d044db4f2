use std::sync::atomic::{AtomicUsize, Ordering};

use dream_structure::prelude::*;

fn image_with_arrays(ds: &mut DataStructure) -> IdType {
    let g = ds.create_image_geometry("Image", None, [4, 4, 2], [1.0; 3], [0.0; 3]).unwrap();
    let am = ds
        .get_data_as::<ImageGeom>(g)
        .and_then(ImageGeom::cell_data_id)
        .unwrap();
    let n = 32i32;
    ds.insert(
        DataArray::from_vec(vec![2, 4, 4], vec![1], (0..n).collect()).unwrap(),
        "FeatureIds",
        Some(am),
    )
    .unwrap();
    ds.insert(
        DataArray::from_vec(
            vec![2, 4, 4],
            vec![3],
            (0..n * 3).map(|v| v as f32).collect(),
        )
        .unwrap(),
        "EulerAngles",
        Some(am),
    )
    .unwrap();
    ds.insert(
        DataArray::from_vec(vec![2, 4, 4], vec![1], (0..n).map(|v| v % 2 == 0).collect()).unwrap(),
        "Mask",
        Some(am),
    )
    .unwrap();
    g
}

fn cell_array<'a, T: ArrayElement>(ds: &'a DataStructure, geom: IdType, name: &str) -> &'a [T] {
    let path = ds.get_data_paths(geom)[0]
        .create_child_path("Cell Data")
        .and_then(|p| p.create_child_path(name))
        .unwrap();
    ds.get_data_as_by_path::<DataArray<T>>(&path)
        .unwrap()
        .as_slice()
        .unwrap()
}

#[test]
fn serial_and_parallel_crops_agree() {
    let region = CropRegion {
        min: [1, 0, 1],
        max: [3, 2, 1],
    };
    let mut results = Vec::new();
    for opts in [ParallelOptions::serial(), ParallelOptions::default().with_max_threads(3)] {
        let mut ds = DataStructure::new();
        let g = image_with_arrays(&mut ds);
        let c = crop_image_geometry(&mut ds, g, "Cropped", None, region, &opts, &CancelToken::new()).unwrap();
        let img = ds.get_data_as::<ImageGeom>(c).unwrap();
        assert_eq!(img.dimensions(), [3, 3, 1]);
        assert_eq!(img.origin(), [1.0, 0.0, 1.0]);
        results.push((
            cell_array::<i32>(&ds, c, "FeatureIds").to_vec(),
            cell_array::<f32>(&ds, c, "EulerAngles").to_vec(),
            cell_array::<bool>(&ds, c, "Mask").to_vec(),
        ));
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].0, vec![17, 18, 19, 21, 22, 23, 25, 26, 27]);
    assert_eq!(&results[0].1[..3], &[51.0, 52.0, 53.0]);
}

#[test]
fn resample_to_coarser_grid() {
    let mut ds = DataStructure::new();
    let g = image_with_arrays(&mut ds);
    let r = resample_image_geometry(
        &mut ds,
        g,
        "Coarse",
        None,
        [2, 2, 1],
        &ParallelOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    let img = ds.get_data_as::<ImageGeom>(r).unwrap();
    assert_eq!(img.spacing(), [2.0, 2.0, 2.0]);
    assert_eq!(cell_array::<i32>(&ds, r, "FeatureIds"), &[21, 23, 29, 31]);
}

#[test]
fn source_geometry_is_untouched() {
    let mut ds = DataStructure::new();
    let g = image_with_arrays(&mut ds);
    let before: Vec<i32> = cell_array::<i32>(&ds, g, "FeatureIds").to_vec();
    resample_image_geometry(
        &mut ds,
        g,
        "Fine",
        None,
        [8, 8, 4],
        &ParallelOptions::default(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(cell_array::<i32>(&ds, g, "FeatureIds"), before.as_slice());
    ds.validate_invariants().unwrap();
}

#[test]
fn zero_dimensions_are_rejected() {
    let mut ds = DataStructure::new();
    let g = image_with_arrays(&mut ds);
    let err = resample_image_geometry(
        &mut ds,
        g,
        "Bad",
        None,
        [0, 1, 1],
        &ParallelOptions::serial(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert_eq!(err, StructureError::InvalidDimensions([0, 1, 1]));
}

#[test]
fn run_tasks_stops_after_cancel() {
    let cancel = CancelToken::new();
    let started = AtomicUsize::new(0);
    let result = run_tasks(&ParallelOptions::serial(), (0..10).collect(), &cancel, |i: usize| {
        started.fetch_add(1, Ordering::SeqCst);
        if i == 3 {
            cancel.cancel();
        }
        Ok(i)
    });
    assert_eq!(result, Err(StructureError::Cancelled));
    assert_eq!(started.load(Ordering::SeqCst), 4);
}

#[test]
fn run_tasks_joins_before_returning() {
    let done = AtomicUsize::new(0);
    let out = run_tasks(
        &ParallelOptions::default(),
        (0..100).collect(),
        &CancelToken::new(),
        |i: u64| {
            done.fetch_add(1, Ordering::SeqCst);
            Ok(i * i)
        },
    )
    .unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 100);
    assert_eq!(out[99], 99 * 99);
}

#[test]
fn parallel_options_serde() {
    let opts = ParallelOptions::default().with_max_threads(0);
    assert_eq!(opts.max_threads, Some(1));
    let json = serde_json::to_string(&opts).unwrap();
    assert_eq!(serde_json::from_str::<ParallelOptions>(&json).unwrap(), opts);
    let region: CropRegion = serde_json::from_str(r#"{"min":[0,0,0],"max":[1,1,0]}"#).unwrap();
    assert_eq!(region.dimensions(), [2, 2, 1]);
}
