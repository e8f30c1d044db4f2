//! Triangle surface meshes.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Three-vertex surface cells.
    TriangleGeom,
    crate::geometry::topology::TRIANGLE
);

#[cfg(test)]
mod tests {
    use crate::geometry::{FindOptions, GeometryType};
    use crate::structure::DataStructure;

    #[test]
    fn area_and_centroid_of_a_tilted_triangle() {
        let mut ds = DataStructure::new();
        let g = ds
            .create_node_geometry(
                GeometryType::Triangle,
                "Tri",
                None,
                vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0],
                vec![0, 1, 2],
            )
            .unwrap();
        let opts = FindOptions::default();
        ds.find_element_sizes(g, &opts).unwrap();
        ds.find_element_centroids(g, &opts).unwrap();
        let area = ds.element_sizes(g).unwrap().as_slice().unwrap()[0];
        assert!((area - 2.0).abs() < 1e-6);
        let c = ds.element_centroids(g).unwrap().as_slice().unwrap();
        assert!((c[0] - 2.0 / 3.0).abs() < 1e-6 && c[1] == 0.0 && (c[2] - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn single_triangle_edges_are_all_boundary() {
        let mut ds = DataStructure::new();
        let g = ds
            .create_node_geometry(
                GeometryType::Triangle,
                "Tri",
                None,
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                vec![0, 1, 2],
            )
            .unwrap();
        ds.find_edges(g, &FindOptions::default()).unwrap();
        ds.find_unshared_edges(g, &FindOptions::default()).unwrap();
        assert_eq!(
            ds.edges(g).unwrap().as_slice().unwrap(),
            &[0, 1, 0, 2, 1, 2]
        );
        assert_eq!(ds.unshared_edges(g).unwrap().number_of_tuples(), 3);
    }
}
