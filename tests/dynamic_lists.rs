use dream_structure::prelude::*;

#[test]
fn counts_then_entries() {
    let mut lists = DynamicListArray::<u64>::from_counts(&[1, 3, 0]).unwrap();
    assert_eq!(lists.number_of_lists(), 3);
    assert_eq!(lists.capacity(1), Some(3));
    for v in [4, 5, 6] {
        lists.push_entry(1, v).unwrap();
    }
    lists.push_entry(0, 9).unwrap();
    assert!(lists.is_complete());
    assert_eq!(lists.total_entries(), 4);

    let overflow = lists.push_entry(0, 1).unwrap_err();
    assert!(matches!(overflow, StructureError::IndexOutOfBounds { .. }));
    assert!(lists.push_entry(3, 1).is_err());

    let collected: Vec<Vec<u64>> = lists.iter().map(<[u64]>::to_vec).collect();
    assert_eq!(collected, vec![vec![9], vec![4, 5, 6], vec![]]);
}

#[test]
fn replacing_a_list_beyond_capacity_rebuilds() {
    let mut lists = DynamicListArray::<u64>::from_lists(&[vec![1u64], vec![2, 3]]).unwrap();
    lists.set_element_list(0, &[7, 8, 9]).unwrap();
    assert_eq!(lists.element_list(0), Some(&[7u64, 8, 9][..]));
    assert_eq!(lists.element_list(1), Some(&[2u64, 3][..]));

    lists.set_element_list(1, &[]).unwrap();
    assert_eq!(lists.number_of_elements(1), Some(0));
    assert!(lists.set_element_list(2, &[1]).is_err());
}

#[test]
fn csr_parts_compact_unfilled_slots() {
    let mut lists = DynamicListArray::<u64>::from_counts(&[2, 2]).unwrap();
    lists.push_entry(0, 1).unwrap();
    lists.push_entry(1, 2).unwrap();
    lists.push_entry(1, 3).unwrap();
    let (offsets, values) = lists.to_parts();
    assert_eq!(offsets, vec![0, 1, 3]);
    assert_eq!(values, vec![1, 2, 3]);

    let rebuilt = DynamicListArray::from_parts(offsets, values).unwrap();
    assert!(rebuilt.is_complete());
    assert_eq!(rebuilt.element_list(1), Some(&[2u64, 3][..]));

    assert!(DynamicListArray::<u64>::from_parts(vec![0, 3, 2], vec![1, 2]).is_err());
}

#[test]
fn lists_live_in_attribute_matrices() {
    let mut ds = DataStructure::new();
    let am = ds.create_attribute_matrix("Features", vec![3], None).unwrap();
    let lists = DynamicListArray::<u64>::from_lists(&[vec![1u64, 2], vec![], vec![0]]).unwrap();
    let id = ds.insert(lists, "Neighbor List", Some(am)).unwrap();

    ds.resize_attribute_matrix(am, vec![4]).unwrap();
    let resized = ds.get_data_as::<DynamicListArray<u64>>(id).unwrap();
    assert_eq!(resized.number_of_lists(), 4);
    assert_eq!(resized.element_list(0), Some(&[1u64, 2][..]));
    assert_eq!(resized.element_list(3), Some(&[][..]));

    let wrong = DynamicListArray::<u64>::from_counts(&[0; 2]).unwrap();
    assert!(ds.insert(wrong, "Short", Some(am)).is_err());
}
