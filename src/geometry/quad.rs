//! Quadrilateral surface meshes.

use crate::geometry::node_geometry::declare_node_geometry;

declare_node_geometry!(
    /// Four-vertex surface cells, vertices in loop order.
    QuadGeom,
    crate::geometry::topology::QUAD
);

#[cfg(test)]
mod tests {
    use crate::geometry::{FindOptions, GeometryType};
    use crate::structure::DataStructure;

    #[test]
    fn unit_square_area() {
        let mut ds = DataStructure::new();
        let g = ds
            .create_node_geometry(
                GeometryType::Quad,
                "Quad",
                None,
                vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
                vec![0, 1, 2, 3],
            )
            .unwrap();
        ds.find_element_sizes(g, &FindOptions::default()).unwrap();
        let area = ds.element_sizes(g).unwrap().as_slice().unwrap()[0];
        assert!((area - 1.0).abs() < 1e-6);
        ds.find_element_centroids(g, &FindOptions::default()).unwrap();
        assert_eq!(
            ds.element_centroids(g).unwrap().as_slice().unwrap(),
            &[0.5, 0.5, 0.0]
        );
    }

    #[test]
    fn strip_of_two_quads() {
        let mut ds = DataStructure::new();
        let g = ds
            .create_node_geometry(
                GeometryType::Quad,
                "Strip",
                None,
                vec![
                    0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0,
                    2.0, 1.0, 0.0,
                ],
                vec![0, 1, 4, 3, 1, 2, 5, 4],
            )
            .unwrap();
        let opts = FindOptions::default();
        ds.find_edges(g, &opts).unwrap();
        ds.find_unshared_edges(g, &opts).unwrap();
        ds.find_element_neighbors(g, &opts).unwrap();
        assert_eq!(ds.edges(g).unwrap().number_of_tuples(), 7);
        assert_eq!(ds.unshared_edges(g).unwrap().number_of_tuples(), 6);
        assert_eq!(
            ds.element_neighbors(g).unwrap().element_list(0),
            Some(&[1u64][..])
        );
    }
}
