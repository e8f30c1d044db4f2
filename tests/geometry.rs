use dream_structure::geometry::image::VOXEL_SIZES;
use dream_structure::prelude::*;

fn unit_cube() -> Vec<f32> {
    vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
    ]
}

fn two_tets(ds: &mut DataStructure) -> IdType {
    let vertices = vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 1.0, 1.0,
        1.0,
    ];
    ds.create_node_geometry(
        GeometryType::Tetrahedral,
        "Tets",
        None,
        vertices,
        vec![0, 1, 2, 3, 0, 2, 1, 4],
    )
    .unwrap()
}

#[test]
fn single_tet_sub_entities_are_all_unshared() {
    let mut ds = DataStructure::new();
    let g = ds.create_node_geometry(
        GeometryType::Tetrahedral,
        "Tet",
        None,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        vec![0, 1, 2, 3],
    )
    .unwrap();
    let opts = FindOptions::default();
    ds.find_edges(g, &opts).unwrap();
    ds.find_unshared_edges(g, &opts).unwrap();
    ds.find_faces(g, &opts).unwrap();
    ds.find_unshared_faces(g, &opts).unwrap();

    assert_eq!(ds.edges(g).unwrap().number_of_tuples(), 6);
    assert_eq!(ds.unshared_edges(g).unwrap().number_of_tuples(), 6);
    assert_eq!(ds.faces(g).unwrap().number_of_tuples(), 4);
    assert_eq!(ds.unshared_faces(g).unwrap().number_of_tuples(), 4);
    assert_eq!(ds.faces(g).unwrap().number_of_components(), 3);
}

#[test]
fn two_tets_share_one_face() {
    let mut ds = DataStructure::new();
    let g = two_tets(&mut ds);
    let opts = FindOptions::default();
    ds.find_faces(g, &opts).unwrap();
    ds.find_unshared_faces(g, &opts).unwrap();
    assert_eq!(ds.faces(g).unwrap().number_of_tuples(), 7);
    assert_eq!(ds.unshared_faces(g).unwrap().number_of_tuples(), 6);

    ds.find_element_neighbors(g, &opts).unwrap();
    let neighbors = ds.element_neighbors(g).unwrap();
    assert_eq!(neighbors.element_list(0), Some(&[1u64][..]));
    assert_eq!(neighbors.element_list(1), Some(&[0u64][..]));
    assert!(ds.elements_containing_vert(g).is_some());
}

#[test]
fn unit_cube_hex_volume() {
    let mut ds = DataStructure::new();
    let g = ds.create_node_geometry(
        GeometryType::Hexahedral,
        "Hex",
        None,
        unit_cube(),
        (0..8).collect(),
    )
    .unwrap();
    let id = ds.find_element_sizes(g, &FindOptions::default()).unwrap();
    assert_eq!(ds.get_data(id).unwrap().name(), "Hex Volumes");
    let volume = ds.element_sizes(g).unwrap().at(0).unwrap();
    assert!((volume - 1.0).abs() < 1e-5);
}

#[test]
fn unit_quad_area() {
    let mut ds = DataStructure::new();
    let g = ds.create_node_geometry(
        GeometryType::Quad,
        "Quad",
        None,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
        vec![0, 1, 2, 3],
    )
    .unwrap();
    ds.find_element_sizes(g, &FindOptions::default()).unwrap();
    let area = ds.element_sizes(g).unwrap().at(0).unwrap();
    assert!((area - 1.0).abs() < 1e-6);
}

#[test]
fn derived_arrays_are_reused_until_sources_change() {
    let mut ds = DataStructure::new();
    let g = ds.create_node_geometry(
        GeometryType::Triangle,
        "Tri",
        None,
        vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0],
        vec![0, 1, 2],
    )
    .unwrap();
    let opts = FindOptions::default();
    let first = ds.find_element_sizes(g, &opts).unwrap();
    let again = ds.find_element_sizes(g, &opts).unwrap();
    assert_eq!(first, again);
    assert!(ds.is_derived_current(g, DerivedArray::ElementSizes));
    assert_eq!(ds.element_sizes(g).unwrap().at(0).unwrap(), 2.0);

    ds.set_vertex(g, 1, [4.0, 0.0, 0.0]).unwrap();
    assert!(!ds.is_derived_current(g, DerivedArray::ElementSizes));
    let recomputed = ds.find_element_sizes(g, &opts).unwrap();
    assert_ne!(recomputed, first);
    assert!(!ds.contains(first));
    assert_eq!(ds.element_sizes(g).unwrap().at(0).unwrap(), 4.0);

    let forced = ds.find_element_sizes(g, &FindOptions::recalculate()).unwrap();
    assert_ne!(forced, recomputed);
    assert_eq!(ds.element_sizes(g).unwrap().at(0).unwrap(), 4.0);
}

#[test]
fn unsupported_operations_return_topology_errors() {
    let mut ds = DataStructure::new();
    let g = ds.create_node_geometry(
        GeometryType::Vertex,
        "Points",
        None,
        vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        Vec::new(),
    )
    .unwrap();
    let err = ds
        .find_element_neighbors(g, &FindOptions::default())
        .unwrap_err();
    assert!(matches!(err, StructureError::UnsupportedGeometry { .. }));
    assert_eq!(err.code(), -1);
    assert!(ds.element_neighbors(g).is_none());

    let e = ds.create_node_geometry(
        GeometryType::Edge,
        "Line",
        None,
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        vec![0, 1],
    )
    .unwrap();
    assert_eq!(ds.find_faces(e, &FindOptions::default()).unwrap_err().code(), -1);
}

#[test]
fn bad_connectivity_inserts_nothing() {
    let mut ds = DataStructure::new();
    let err = ds
        .create_node_geometry(
            GeometryType::Triangle,
            "Tri",
            None,
            vec![0.0; 9],
            vec![0, 1, 3],
        )
        .unwrap_err();
    assert!(matches!(err, StructureError::VertexIndexOutOfRange { .. }));
    assert!(ds.is_empty());
}

#[test]
fn removing_vertices_clears_geometry_reference() {
    let mut ds = DataStructure::new();
    let g = two_tets(&mut ds);
    let vertices = ds.node_geometry(g).unwrap().vertices_id().unwrap();
    ds.remove_data(vertices).unwrap();
    assert_eq!(ds.node_geometry(g).unwrap().vertices_id(), None);
    let err = ds.find_element_centroids(g, &FindOptions::default()).unwrap_err();
    assert_eq!(err, StructureError::MissingVertices(g));
    assert!(ds.element_centroids(g).is_none());
    ds.validate_invariants().unwrap();
}

#[test]
fn cancelled_find_leaves_no_array() {
    let mut ds = DataStructure::new();
    let g = two_tets(&mut ds);
    let before = ds.len();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = ds
        .find_elements_containing_vert(g, &FindOptions::default().with_cancel(cancel))
        .unwrap_err();
    assert_eq!(err, StructureError::Cancelled);
    assert_eq!(ds.len(), before);
    assert!(ds.elements_containing_vert(g).is_none());
}

#[test]
fn image_geometry_lookup_and_sizes() {
    let mut ds = DataStructure::new();
    let g = ds.create_image_geometry("Image", None, [3, 2, 2], [0.5, 1.0, 2.0], [1.0, 0.0, 0.0]).unwrap();
    let image = ds.get_data_as::<ImageGeom>(g).unwrap();
    assert_eq!(image.number_of_cells(), 12);
    assert_eq!(image.cell_index(2, 1, 1), Some(11));
    assert_eq!(image.cell_ijk(4), Some([1, 1, 0]));
    assert_eq!(image.cell_center(0), Some([1.25, 0.5, 1.0]));
    assert_eq!(image.index_of_point([2.4, 1.5, 3.9]), Some(11));
    assert_eq!(image.index_of_point([0.9, 0.0, 0.0]), None);
    assert_eq!(image.bounding_box(), ([1.0, 0.0, 0.0], [2.5, 2.0, 4.0]));

    let sizes = ds.find_element_sizes(g, &FindOptions::default()).unwrap();
    assert_eq!(ds.get_data(sizes).unwrap().name(), VOXEL_SIZES);
    assert!(ds.element_sizes(g).unwrap().as_slice().unwrap().iter().all(|&v| v == 1.0));

    assert!(matches!(
        ds.create_image_geometry("Flat", None, [1, 1, 1], [1.0, 0.0, 1.0], [0.0; 3]),
        Err(StructureError::InvalidSpacing(_))
    ));
}

#[test]
fn image_dimensions_resize_cell_data() {
    let mut ds = DataStructure::new();
    let g = ds.create_image_geometry("Image", None, [2, 2, 1], [1.0; 3], [0.0; 3]).unwrap();
    let am = ds.get_data_as::<ImageGeom>(g).unwrap().cell_data_id().unwrap();
    let ids = ds.create_array::<i32>("FeatureIds", vec![1, 2, 2], vec![1], 1, Some(am)).unwrap();
    ds.set_image_dimensions(g, [3, 2, 1]).unwrap();
    assert_eq!(ds.get_data_as::<DataArray<i32>>(ids).unwrap().number_of_tuples(), 6);
    assert_eq!(
        ds.get_data_as::<AttributeMatrix>(am).unwrap().tuple_shape(),
        &[1, 2, 3]
    );
}

#[test]
fn rect_grid_cells_follow_bounds() {
    let mut ds = DataStructure::new();
    let g = ds.create_rect_grid_geometry(
        "Grid",
        None,
        vec![0.0, 1.0, 4.0],
        vec![0.0, 1.0],
        vec![0.0, 2.0],
    )
    .unwrap();
    assert_eq!(ds.number_of_cells(g), 2);
    assert_eq!(ds.rect_grid_index_of_point(g, [1.0, 0.5, 0.5]), Some(1));
    assert_eq!(ds.rect_grid_cell_center(g, 1), Some([2.5, 0.5, 1.0]));
    ds.find_element_sizes(g, &FindOptions::default()).unwrap();
    assert_eq!(ds.element_sizes(g).unwrap().as_slice().unwrap(), &[2.0, 6.0]);
}

#[test]
fn length_units_parse_their_names() {
    for unit in LengthUnit::ALL {
        assert_eq!(LengthUnit::parse(unit.as_str()), Some(unit));
    }
    assert_eq!(GeometryType::parse("TetrahedralGeom"), Some(GeometryType::Tetrahedral));
}
