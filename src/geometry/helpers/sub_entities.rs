//! Shared and unshared edge/face extraction.
//!
//! Each cell contributes its fixed local sub-entities. A sub-entity's key is
//! its sorted vertex tuple, so identity is purely combinatorial: coincident
//! vertices with different indices are never merged. Output follows key order.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::algs::cancel::CancelToken;
use crate::geometry::MeshIndexType;
use crate::geometry::helpers::validate_connectivity;
use crate::structure_error::StructureError;

/// Flat list of fixed-width sub-entities.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubEntityList {
    pub vertices_per_entity: usize,
    pub values: Vec<MeshIndexType>,
}

impl SubEntityList {
    pub fn len(&self) -> usize {
        if self.vertices_per_entity == 0 {
            0
        } else {
            self.values.len() / self.vertices_per_entity
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[MeshIndexType]> + '_ {
        self.values.chunks_exact(self.vertices_per_entity.max(1))
    }
}

struct Tally {
    /// Vertex loop as first encountered.
    winding: Vec<MeshIndexType>,
    count: usize,
}

fn tally(
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    local: &[&[usize]],
    num_vertices: usize,
    cancel: &CancelToken,
) -> Result<BTreeMap<Vec<MeshIndexType>, Tally>, StructureError> {
    validate_connectivity(connectivity, vertices_per_cell, num_vertices)?;
    let mut map: BTreeMap<Vec<MeshIndexType>, Tally> = BTreeMap::new();
    for cell in connectivity.chunks_exact(vertices_per_cell) {
        cancel.check()?;
        for entity in local {
            let winding: Vec<MeshIndexType> = entity.iter().map(|&i| cell[i]).collect();
            let key: Vec<MeshIndexType> = winding.iter().copied().sorted_unstable().collect();
            map.entry(key)
                .or_insert_with(|| Tally { winding, count: 0 })
                .count += 1;
        }
    }
    Ok(map)
}

fn emit(
    map: BTreeMap<Vec<MeshIndexType>, Tally>,
    width: usize,
    keep_winding: bool,
    unshared_only: bool,
) -> SubEntityList {
    let mut values = Vec::with_capacity(map.len() * width);
    for (key, t) in map {
        if unshared_only && t.count != 1 {
            continue;
        }
        if keep_winding {
            values.extend(t.winding);
        } else {
            values.extend(key);
        }
    }
    SubEntityList {
        vertices_per_entity: width,
        values,
    }
}

/// Deduplicated sub-entities of all cells.
///
/// Two-vertex entities (edges) are written sorted; wider ones (faces) keep
/// the winding of the first cell that produced them.
pub fn find_sub_entities(
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    local: &[&[usize]],
    num_vertices: usize,
    cancel: &CancelToken,
) -> Result<SubEntityList, StructureError> {
    let width = local.first().map_or(0, |e| e.len());
    let map = tally(connectivity, vertices_per_cell, local, num_vertices, cancel)?;
    Ok(emit(map, width, width > 2, false))
}

/// Sub-entities that occur in exactly one cell.
pub fn find_unshared_sub_entities(
    connectivity: &[MeshIndexType],
    vertices_per_cell: usize,
    local: &[&[usize]],
    num_vertices: usize,
    cancel: &CancelToken,
) -> Result<SubEntityList, StructureError> {
    let width = local.first().map_or(0, |e| e.len());
    let map = tally(connectivity, vertices_per_cell, local, num_vertices, cancel)?;
    Ok(emit(map, width, width > 2, true))
}
