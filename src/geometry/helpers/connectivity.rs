//! Elements-containing-vertex lists and element neighbours.

use crate::algs::cancel::CancelToken;
use crate::data::dynamic_list::DynamicListArray;
use crate::geometry::MeshIndexType;
use crate::geometry::helpers::validate_connectivity;
use crate::geometry::topology::CellTopology;
use crate::structure_error::StructureError;

/// For each vertex, the cells referencing it, in cell order.
///
/// Built in two passes: per-vertex counts size one bulk allocation, then a
/// second walk writes each cell index at the vertex's next free slot. A cell
/// that repeats a vertex is listed once per occurrence.
pub fn find_elements_containing_vert(
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    num_vertices: usize,
    cancel: &CancelToken,
) -> Result<DynamicListArray<MeshIndexType>, StructureError> {
    let num_cells = validate_connectivity(connectivity, vertices_per_cell, num_vertices)?;

    let mut counts = vec![0usize; num_vertices];
    for &v in connectivity {
        counts[v as usize] += 1;
    }

    let mut lists = DynamicListArray::from_counts(&counts)?;
    for cell in 0..num_cells {
        cancel.check()?;
        let verts = &connectivity[cell * vertices_per_cell..(cell + 1) * vertices_per_cell];
        for &v in verts {
            lists.push_entry(v as usize, cell as MeshIndexType)?;
        }
    }
    debug_assert!(lists.is_complete());
    Ok(lists)
}

/// For each cell, the cells sharing exactly `topology.shared_vertices` of its vertices.
///
/// Candidates come from the vertex lists in `containing`. A visited flag per
/// cell suppresses duplicates; only the flags touched while scanning one cell
/// are reset afterwards.
pub fn find_element_neighbors(
    connectivity: &[MeshIndexType],
    topology: &CellTopology,
    containing: &DynamicListArray<MeshIndexType>,
    cancel: &CancelToken,
) -> Result<DynamicListArray<MeshIndexType>, StructureError> {
    if topology.shared_vertices == 0 {
        return Err(StructureError::UnsupportedGeometry {
            geometry: topology.geometry_type.type_name(),
            operation: "find_element_neighbors",
        });
    }
    let k = topology.vertices_per_cell;
    let num_cells =
        validate_connectivity(connectivity, k, containing.number_of_lists())?;

    let mut visited = vec![false; num_cells];
    let mut touched: Vec<usize> = Vec::new();
    let mut neighbors: Vec<Vec<MeshIndexType>> = Vec::with_capacity(num_cells);

    for cell in 0..num_cells {
        cancel.check()?;
        let verts = &connectivity[cell * k..(cell + 1) * k];
        let mut found = Vec::new();
        for &v in verts {
            let Some(candidates) = containing.element_list(v as usize) else {
                continue;
            };
            for &c in candidates {
                let c = c as usize;
                if c == cell || c >= num_cells || visited[c] {
                    continue;
                }
                visited[c] = true;
                touched.push(c);
                let other = &connectivity[c * k..(c + 1) * k];
                let shared = other.iter().filter(|o| verts.contains(o)).count();
                if shared == topology.shared_vertices {
                    found.push(c as MeshIndexType);
                }
            }
        }
        for &t in &touched {
            visited[t] = false;
        }
        touched.clear();
        neighbors.push(found);
    }
    DynamicListArray::from_lists(&neighbors)
}
