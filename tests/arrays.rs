use dream_structure::data::{ArrayComparison, StoreFormat};
use dream_structure::prelude::*;
use proptest::prelude::*;

#[test]
fn shrink_then_grow_keeps_prefix_and_fills_tail() {
    let values: Vec<f32> = (0..30).map(|v| v as f32 * 0.5).collect();
    let mut array = DataArray::from_vec(vec![10], vec![3], values.clone()).unwrap();

    array.resize_tuples(5).unwrap();
    assert_eq!(array.size(), 15);
    assert_eq!(array.as_slice().unwrap(), &values[..15]);

    array.resize_tuples(10).unwrap();
    assert_eq!(array.size(), 30);
    assert_eq!(&array.as_slice().unwrap()[..15], &values[..15]);
    assert!(array.as_slice().unwrap()[15..].iter().all(|&v| v == 0.0));
}

#[test]
fn grow_uses_last_fill_value() {
    let mut array = DataArray::<i16>::with_tuples(2, 2, 3).unwrap();
    array.fill(-4).unwrap();
    array.resize_tuples(3).unwrap();
    assert_eq!(array.tuple(2).unwrap(), &[-4, -4]);
}

#[test]
fn component_access_and_bounds() {
    let mut array = DataArray::<u32>::new(vec![2, 2], vec![3], 0).unwrap();
    assert_eq!(array.number_of_tuples(), 4);
    array.set_component(3, 2, 11).unwrap();
    assert_eq!(array.component(3, 2).unwrap(), 11);
    assert_eq!(array.at(11).unwrap(), 11);
    assert!(array.component(4, 0).is_err());
    assert!(array.set_tuple(0, &[1, 2]).is_err());
    assert_eq!(array.get(12), None);
}

#[test]
fn generation_counts_mutations() {
    let mut array = DataArray::<f64>::with_tuples(4, 1, 0.0).unwrap();
    let g0 = array.generation();
    let _ = array.as_slice().unwrap();
    assert_eq!(array.generation(), g0);
    array.set(1, 2.0).unwrap();
    assert!(array.generation() > g0);
}

#[test]
fn preflight_arrays_have_shape_but_no_values() {
    let array = DataArray::<u8>::empty(vec![5], vec![2]);
    assert_eq!(array.store_format(), StoreFormat::Empty);
    assert!(!array.is_materialized());
    assert_eq!(array.size(), 10);
    assert_eq!(array.as_slice(), Err(StructureError::NotMaterialized));
}

#[test]
fn untyped_arrays_dispatch_on_their_tag() {
    struct Sum;
    impl ArrayFunction for Sum {
        type Output = Result<f64, StructureError>;
        fn call<T: ArrayElement>(self, array: &DataArray<T>) -> Self::Output {
            let mut total = 0.0;
            for i in 0..array.size() {
                total += array.at(i)?.to_f64();
            }
            Ok(total)
        }
    }

    let ints: AnyDataArray = DataArray::from_vec(vec![3], vec![1], vec![1i8, 2, 3]).unwrap().into();
    let floats = AnyDataArray::new(DataType::Float64, vec![4], vec![1]).unwrap();
    assert_eq!(ints.data_type(), DataType::Int8);
    assert_eq!(dream_structure::data::execute_array_function(&ints, Sum).unwrap(), 6.0);
    assert_eq!(dream_structure::data::execute_array_function(&floats, Sum).unwrap(), 0.0);
    assert!(ints.as_typed::<u8>().is_none());
    assert!(ints.as_typed::<i8>().is_some());
}

#[test]
fn byte_image_round_trips() {
    let array: AnyDataArray =
        DataArray::from_vec(vec![2], vec![2], vec![1.5f32, -2.0, 3.25, 0.0]).unwrap().into();
    let bytes = array.to_bytes().unwrap();
    let back = AnyDataArray::from_bytes(DataType::Float32, vec![2], vec![2], &bytes).unwrap();
    let cmp = compare_arrays(&array, &back, &ComparisonOptions::default()).unwrap();
    assert!(cmp.is_equal());
}

#[test]
fn comparison_rejects_mixed_types_and_applies_tolerance() {
    let a: AnyDataArray = DataArray::from_vec(vec![3], vec![1], vec![1.0f32, 2.0, 3.0]).unwrap().into();
    let b: AnyDataArray = DataArray::from_vec(vec![3], vec![1], vec![1.0f32, 2.0005, 3.5]).unwrap().into();
    let c: AnyDataArray = DataArray::from_vec(vec![3], vec![1], vec![1i32, 2, 3]).unwrap().into();

    let loose = ComparisonOptions { tolerance: 1e-3 };
    let cmp: ArrayComparison = compare_arrays(&a, &b, &loose).unwrap();
    assert_eq!(cmp.mismatches, 1);
    assert_eq!(cmp.first_mismatch, Some(2));

    let err = compare_arrays(&a, &c, &loose).unwrap_err();
    assert_eq!(
        err,
        StructureError::MixedTypeComparison {
            left: DataType::Float32,
            right: DataType::Int32
        }
    );
}

#[test]
fn comparison_options_serde() {
    let opts = ComparisonOptions { tolerance: 0.25 };
    let json = serde_json::to_string(&opts).unwrap();
    assert_eq!(serde_json::from_str::<ComparisonOptions>(&json).unwrap(), opts);
}

proptest! {
    #[test]
    fn size_is_tuples_times_components(
        tuples in proptest::collection::vec(0usize..6, 1..3),
        components in proptest::collection::vec(1usize..4, 1..3),
        resized in 0usize..20,
    ) {
        let mut array = DataArray::<i32>::new(tuples.clone(), components.clone(), 1).unwrap();
        let nc: usize = components.iter().product();
        prop_assert_eq!(array.size(), tuples.iter().product::<usize>() * nc);
        array.resize_tuples(resized).unwrap();
        prop_assert_eq!(array.size(), resized * nc);
        prop_assert_eq!(array.number_of_tuples() * array.number_of_components(), array.size());
    }
}
