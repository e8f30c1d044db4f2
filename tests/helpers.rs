use std::collections::BTreeMap;

use dream_structure::geometry::helpers::{
    find_2d_element_areas, find_element_centroids, find_element_neighbors,
    find_elements_containing_vert, find_sub_entities, find_tet_volumes,
    find_unshared_sub_entities,
};
use dream_structure::geometry::topology::{CellTopology, HEXAHEDRAL, TETRAHEDRAL};
use dream_structure::prelude::*;
use proptest::prelude::*;

/// Structured `n × n × n` hex grid, corners in bottom-loop/top-loop order.
fn hex_grid(n: u64) -> (usize, Vec<u64>) {
    let v = |i: u64, j: u64, k: u64| (k * (n + 1) + j) * (n + 1) + i;
    let mut cells = Vec::new();
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                cells.extend([
                    v(i, j, k),
                    v(i + 1, j, k),
                    v(i + 1, j + 1, k),
                    v(i, j + 1, k),
                    v(i, j, k + 1),
                    v(i + 1, j, k + 1),
                    v(i + 1, j + 1, k + 1),
                    v(i, j + 1, k + 1),
                ]);
            }
        }
    }
    (((n + 1) * (n + 1) * (n + 1)) as usize, cells)
}

fn edge_groups(topology: &CellTopology) -> Vec<&[usize]> {
    topology.edges.iter().map(|e| &e[..]).collect()
}

/// Occurrences of every sorted sub-entity across all cells.
fn occurrences(cells: &[u64], k: usize, local: &[&[usize]]) -> BTreeMap<Vec<u64>, usize> {
    let mut counts = BTreeMap::new();
    for cell in cells.chunks_exact(k) {
        for group in local {
            let mut key: Vec<u64> = group.iter().map(|&i| cell[i]).collect();
            key.sort_unstable();
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

fn sorted_entities(list: &dream_structure::geometry::helpers::SubEntityList) -> Vec<Vec<u64>> {
    list.iter()
        .map(|e| {
            let mut e = e.to_vec();
            e.sort_unstable();
            e
        })
        .collect()
}

#[test]
fn hex_grid_counts() {
    let cancel = CancelToken::new();
    let (nv, cells) = hex_grid(2);
    let containing = find_elements_containing_vert(&cells, 8, nv, &cancel).unwrap();
    let neighbors = find_element_neighbors(&cells, &HEXAHEDRAL, &containing, &cancel).unwrap();
    assert!(neighbors.iter().all(|n| n.len() == 3));

    let faces = find_sub_entities(&cells, 8, HEXAHEDRAL.faces, nv, &cancel).unwrap();
    let outer = find_unshared_sub_entities(&cells, 8, HEXAHEDRAL.faces, nv, &cancel).unwrap();
    assert_eq!(faces.len(), 36);
    assert_eq!(outer.len(), 24);

    let local = edge_groups(&HEXAHEDRAL);
    let edges = find_sub_entities(&cells, 8, &local, nv, &cancel).unwrap();
    let outer_edges = find_unshared_sub_entities(&cells, 8, &local, nv, &cancel).unwrap();
    assert_eq!(edges.len(), 54);
    assert_eq!(outer_edges.len(), 24);
    assert!(edges.iter().all(|e| e[0] < e[1]));
}

#[test]
fn tet_volume_sign_follows_winding() {
    let vertices = [0.0f64, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    let volumes = find_tet_volumes(&vertices, &[0, 1, 2, 3, 0, 2, 1, 3], &CancelToken::new())
        .unwrap();
    assert!((volumes[0] - 1.0 / 6.0).abs() < 1e-12);
    assert!((volumes[1] + 1.0 / 6.0).abs() < 1e-12);
}

#[test]
fn areas_are_absolute_and_centroids_average() {
    let vertices = [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0];
    let cancel = CancelToken::new();
    let areas = find_2d_element_areas(&vertices, &[0, 1, 2, 0, 2, 1], 3, &cancel).unwrap();
    assert_eq!(areas, vec![2.0, 2.0]);
    let centroids = find_element_centroids(&vertices, &[0, 1, 2], 3, &cancel).unwrap();
    let expected = [2.0f32 / 3.0, 2.0 / 3.0, 0.0];
    for (c, e) in centroids.iter().zip(expected) {
        assert!((c - e).abs() < 1e-6);
    }
}

#[test]
fn results_are_repeatable() {
    let (nv, cells) = hex_grid(3);
    let cancel = CancelToken::new();
    let a = find_sub_entities(&cells, 8, HEXAHEDRAL.faces, nv, &cancel).unwrap();
    let b = find_sub_entities(&cells, 8, HEXAHEDRAL.faces, nv, &cancel).unwrap();
    assert_eq!(a, b);
}

fn tet_mesh() -> impl Strategy<Value = (usize, Vec<u64>)> {
    (5usize..12).prop_flat_map(|nv| {
        let cell = proptest::sample::subsequence((0..nv as u64).collect::<Vec<_>>(), 4)
            .prop_shuffle();
        (Just(nv), proptest::collection::vec(cell, 1..10))
            .prop_map(|(nv, cells)| (nv, cells.concat()))
    })
}

proptest! {
    #[test]
    fn containing_lists_cover_every_reference((nv, cells) in tet_mesh()) {
        let lists = find_elements_containing_vert(&cells, 4, nv, &CancelToken::new()).unwrap();
        prop_assert_eq!(lists.number_of_lists(), nv);
        prop_assert_eq!(lists.total_entries(), cells.len());
        for (v, list) in lists.iter().enumerate() {
            for &c in list {
                let cell = &cells[c as usize * 4..c as usize * 4 + 4];
                prop_assert!(cell.contains(&(v as u64)));
            }
        }
    }

    #[test]
    fn neighbors_are_symmetric((nv, cells) in tet_mesh()) {
        let cancel = CancelToken::new();
        let containing = find_elements_containing_vert(&cells, 4, nv, &cancel).unwrap();
        let neighbors = find_element_neighbors(&cells, &TETRAHEDRAL, &containing, &cancel).unwrap();
        for a in 0..neighbors.number_of_lists() {
            for &b in neighbors.element_list(a).unwrap() {
                prop_assert!(neighbors.element_list(b as usize).unwrap().contains(&(a as u64)));
            }
        }
    }

    #[test]
    fn unshared_faces_occur_once((nv, cells) in tet_mesh()) {
        let cancel = CancelToken::new();
        let counts = occurrences(&cells, 4, TETRAHEDRAL.faces);
        let all = sorted_entities(&find_sub_entities(&cells, 4, TETRAHEDRAL.faces, nv, &cancel).unwrap());
        let unshared = sorted_entities(
            &find_unshared_sub_entities(&cells, 4, TETRAHEDRAL.faces, nv, &cancel).unwrap(),
        );
        prop_assert_eq!(all.len(), counts.len());
        for f in &unshared {
            prop_assert!(all.contains(f));
            prop_assert_eq!(counts[f], 1);
        }
        let shared = all.iter().filter(|f| !unshared.contains(f)).count();
        prop_assert_eq!(shared, counts.values().filter(|&&c| c >= 2).count());
    }

    #[test]
    fn unshared_edges_are_a_subset((nv, cells) in tet_mesh()) {
        let cancel = CancelToken::new();
        let local = edge_groups(&TETRAHEDRAL);
        let all = find_sub_entities(&cells, 4, &local, nv, &cancel).unwrap();
        let unshared = find_unshared_sub_entities(&cells, 4, &local, nv, &cancel).unwrap();
        let all: Vec<&[u64]> = all.iter().collect();
        for e in unshared.iter() {
            prop_assert!(all.contains(&e));
        }
    }
}
