//! Deep copy of a subtree with id remapping.

use std::collections::BTreeMap;

use crate::structure::data_object::{DataObject, ObjectData};
use crate::structure::data_path::{DataPath, validate_name};
use crate::structure::data_structure::DataStructure;
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

impl DataStructure {
    /// Copies the subtree at `source` to the new path `target`.
    ///
    /// Every object reachable from `source` is cloned once, even when it is
    /// reachable along several routes. Child links and geometry array
    /// references that point inside the subtree are rewritten to the copies;
    /// references that leave the subtree are kept as they are. Parent links
    /// of copied objects are restricted to the copied subtree.
    ///
    /// Returns the id of the copied root.
    pub fn deep_copy(
        &mut self,
        source: &DataPath,
        target: &DataPath,
    ) -> Result<IdType, StructureError> {
        let src = self
            .get_id(source)
            .ok_or_else(|| StructureError::PathNotFound(source.to_string()))?;
        if self.get_id(target).is_some() {
            return Err(StructureError::PathExists(target.to_string()));
        }
        let name = target
            .target_name()
            .ok_or_else(|| StructureError::InvalidName(String::new()))?
            .to_string();
        validate_name(&name)?;
        let parent = self.resolve_parent(target)?;
        if let Some(p) = parent {
            let root = self
                .get_data(src)
                .ok_or(StructureError::MissingObject(src))?;
            self.check_can_adopt(p, root.data())?;
        }

        let mut subtree = vec![src];
        subtree.extend(self.descendants(src));
        let mut remap = BTreeMap::new();
        for &old in &subtree {
            let new = self.allocate_id();
            remap.insert(old, new);
        }

        let mut copies: Vec<DataObject> = Vec::with_capacity(subtree.len());
        for &old in &subtree {
            let Some(original) = self.get_data(old) else {
                continue;
            };
            let mut copy = original.clone();
            copy.id = remap[&old];
            copy.children = original
                .children
                .iter()
                .filter_map(|c| remap.get(c).copied())
                .collect();
            if old == src {
                copy.name = name.clone();
                copy.parents = parent.into_iter().collect();
            } else {
                copy.parents = original
                    .parents
                    .iter()
                    .filter_map(|p| remap.get(p).copied())
                    .collect();
            }
            if let ObjectData::Geometry(g) = &mut copy.data {
                g.remap_ids(&remap);
            }
            copies.push(copy);
        }

        let new_root = remap[&src];
        for copy in copies {
            let top = copy.id == new_root && parent.is_none();
            self.insert_raw(copy, top);
        }
        if let Some(p) = parent {
            if let Some(po) = self.get_data_mut(p) {
                po.children.push(new_root);
            }
        }
        log::debug!(
            "deep copied `{source}` ({} objects) to `{target}`",
            subtree.len()
        );
        Ok(new_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_array::DataArray;

    fn path(s: &str) -> DataPath {
        DataPath::from_string(s).unwrap()
    }

    #[test]
    fn copy_is_independent() {
        let mut ds = DataStructure::new();
        let g = ds.create_group("G", None).unwrap();
        let a = ds
            .create_array::<f32>("A", vec![3], vec![1], 1.5, Some(g))
            .unwrap();
        let copy = ds.deep_copy(&path("G"), &path("H")).unwrap();
        assert_ne!(copy, g);
        let a2 = ds.get_id(&path("H/A")).unwrap();
        assert_ne!(a2, a);

        ds.get_data_as_mut::<DataArray<f32>>(a2)
            .unwrap()
            .set(0, 9.0)
            .unwrap();
        assert_eq!(ds.get_data_as::<DataArray<f32>>(a).unwrap().at(0).unwrap(), 1.5);
        assert_eq!(ds.get_data_as::<DataArray<f32>>(a2).unwrap().at(0).unwrap(), 9.0);
    }

    #[test]
    fn copy_fails_when_target_exists() {
        let mut ds = DataStructure::new();
        ds.create_group("G", None).unwrap();
        ds.create_group("H", None).unwrap();
        assert_eq!(
            ds.deep_copy(&path("G"), &path("H")),
            Err(StructureError::PathExists("H".into()))
        );
        assert!(matches!(
            ds.deep_copy(&path("Missing"), &path("X")),
            Err(StructureError::PathNotFound(_))
        ));
    }

    #[test]
    fn diamond_is_copied_once() {
        let mut ds = DataStructure::new();
        let root = ds.create_group("Root", None).unwrap();
        let l = ds.create_group("L", Some(root)).unwrap();
        let r = ds.create_group("R", Some(root)).unwrap();
        let shared = ds.create_group("Shared", Some(l)).unwrap();
        ds.set_additional_parent(shared, r).unwrap();
        let before = ds.len();

        ds.deep_copy(&path("Root"), &path("Copy")).unwrap();
        assert_eq!(ds.len(), before * 2);
        let s1 = ds.get_id(&path("Copy/L/Shared")).unwrap();
        let s2 = ds.get_id(&path("Copy/R/Shared")).unwrap();
        assert_eq!(s1, s2);
        assert_eq!(ds.get_data(s1).unwrap().parents().len(), 2);
    }

    #[test]
    fn copy_under_nested_parent() {
        let mut ds = DataStructure::new();
        let g = ds.create_group("G", None).unwrap();
        ds.create_group("Inner", Some(g)).unwrap();
        let copied = ds
            .deep_copy(&path("G/Inner"), &path("G/Inner2"))
            .unwrap();
        assert_eq!(ds.get_id(&path("G/Inner2")), Some(copied));
        assert!(!ds.top_level_ids().contains(&copied));
    }
}
