//! `DataStructure`: arena owning every data object by id.
//!
//! Objects form a DAG: a node may have several parents, and top-level nodes
//! have none. Ownership is presence in the arena; an object is dropped only
//! by explicit removal. When a removal leaves a child without any parent,
//! that child is removed too, through an explicit worklist traversal rather
//! than reference counting.
//!
//! Structural mutation is single-threaded. All mutating operations return
//! `Result` and never leave a dangling id in a surviving node.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::data_array::DataArray;
use crate::data::dynamic_list::DynamicListArray;
use crate::data::element::ArrayElement;
use crate::data::store::checked_len;
use crate::debug_invariants::DebugInvariants;
use crate::structure::data_object::{
    AttributeMatrix, DataGroup, DataObject, FromDataObject, ObjectData, StringArray,
};
use crate::structure::data_path::{DataPath, validate_name};
use crate::structure::id::IdType;
use crate::structure_error::StructureError;

/// Owner of all data objects.
#[derive(Clone, Debug, Default)]
pub struct DataStructure {
    objects: BTreeMap<IdType, DataObject>,
    top_level: Vec<IdType>,
    next_id: u64,
}

impl DataStructure {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: IdType) -> bool {
        self.objects.contains_key(&id)
    }

    /// Ids of objects without a parent, in insertion order.
    pub fn top_level_ids(&self) -> &[IdType] {
        &self.top_level
    }

    /// All live objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DataObject> {
        self.objects.values()
    }

    /// Child ids of `id`, empty for leaves and unknown ids.
    pub fn children(&self, id: IdType) -> &[IdType] {
        self.objects
            .get(&id)
            .map(|o| o.children.as_slice())
            .unwrap_or(&[])
    }

    /// Id the next insertion will receive.
    pub fn peek_next_id(&self) -> IdType {
        IdType::nth(self.next_id)
    }

    // ------------------------------------------------------------------
    // insertion
    // ------------------------------------------------------------------

    /// Inserts `data` named `name` under `parent` (top level when `None`).
    ///
    /// Fails if the parent does not resolve or cannot hold children, if a
    /// sibling with the same name exists, or if an attribute matrix parent
    /// has a different tuple count.
    pub fn insert(
        &mut self,
        data: impl Into<ObjectData>,
        name: &str,
        parent: Option<IdType>,
    ) -> Result<IdType, StructureError> {
        let data = data.into();
        validate_name(name)?;
        if let Some(p) = parent {
            self.check_can_adopt(p, &data)?;
        }
        if self.child_named(parent, name).is_some() {
            return Err(StructureError::NameCollision {
                name: name.to_string(),
                parent,
            });
        }

        let id = IdType::nth(self.next_id);
        self.next_id += 1;
        let mut parents = BTreeSet::new();
        match parent {
            Some(p) => {
                parents.insert(p);
                if let Some(po) = self.objects.get_mut(&p) {
                    po.children.push(id);
                }
            }
            None => self.top_level.push(id),
        }
        log::trace!("insert {} `{name}` as {id}", data.type_name());
        self.objects.insert(
            id,
            DataObject {
                id,
                name: name.to_string(),
                parents,
                children: Vec::new(),
                data,
            },
        );
        Ok(id)
    }

    /// Inserts at `path`; the path's parent must already exist.
    pub fn insert_at(
        &mut self,
        data: impl Into<ObjectData>,
        path: &DataPath,
    ) -> Result<IdType, StructureError> {
        let name = path
            .target_name()
            .ok_or_else(|| StructureError::InvalidName(String::new()))?;
        let parent = self.resolve_parent(path)?;
        self.insert(data, name, parent)
    }

    pub fn create_group(
        &mut self,
        name: &str,
        parent: Option<IdType>,
    ) -> Result<IdType, StructureError> {
        self.insert(DataGroup, name, parent)
    }

    pub fn create_attribute_matrix(
        &mut self,
        name: &str,
        tuple_shape: Vec<usize>,
        parent: Option<IdType>,
    ) -> Result<IdType, StructureError> {
        self.insert(AttributeMatrix::new(tuple_shape), name, parent)
    }

    /// Allocates a fill-initialised array and inserts it.
    pub fn create_array<T: ArrayElement>(
        &mut self,
        name: &str,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        fill: T,
        parent: Option<IdType>,
    ) -> Result<IdType, StructureError> {
        let array = DataArray::new(tuple_shape, component_shape, fill)?;
        self.insert(array, name, parent)
    }

    pub fn create_string_array(
        &mut self,
        name: &str,
        values: Vec<String>,
        parent: Option<IdType>,
    ) -> Result<IdType, StructureError> {
        self.insert(StringArray::new(values), name, parent)
    }

    // ------------------------------------------------------------------
    // lookup
    // ------------------------------------------------------------------

    pub fn get_data(&self, id: IdType) -> Option<&DataObject> {
        self.objects.get(&id)
    }

    pub(crate) fn get_data_mut(&mut self, id: IdType) -> Option<&mut DataObject> {
        self.objects.get_mut(&id)
    }

    /// Resolves `path` top-down; `None` on any missing segment.
    pub fn get_id(&self, path: &DataPath) -> Option<IdType> {
        let mut current: Option<IdType> = None;
        for name in path.segments() {
            current = Some(self.child_named(current, name)?);
        }
        current
    }

    pub fn get_data_by_path(&self, path: &DataPath) -> Option<&DataObject> {
        self.get_id(path).and_then(|id| self.get_data(id))
    }

    pub(crate) fn get_data_by_path_mut(&mut self, path: &DataPath) -> Option<&mut DataObject> {
        let id = self.get_id(path)?;
        self.get_data_mut(id)
    }

    /// Typed borrow; `None` when absent or of another type.
    pub fn get_data_as<T: FromDataObject + ?Sized>(&self, id: IdType) -> Option<&T> {
        self.get_data(id)?.as_type::<T>()
    }

    pub(crate) fn get_data_as_mut<T: FromDataObject + ?Sized>(&mut self, id: IdType) -> Option<&mut T> {
        self.get_data_mut(id)?.as_type_mut::<T>()
    }

    pub fn get_data_as_by_path<T: FromDataObject + ?Sized>(&self, path: &DataPath) -> Option<&T> {
        self.get_data_by_path(path)?.as_type::<T>()
    }

    /// Mutable values of an array; its shape cannot change through this.
    pub fn array_values_mut<T: ArrayElement>(
        &mut self,
        id: IdType,
    ) -> Result<&mut [T], StructureError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(StructureError::MissingObject(id))?;
        let found = obj.type_name();
        obj.as_type_mut::<DataArray<T>>()
            .ok_or(StructureError::TypeMismatch {
                id,
                expected: "DataArray",
                found,
            })?
            .as_mut_slice()
    }

    /// Reshapes an array that is not a member of an attribute matrix;
    /// matrix members follow [`resize_attribute_matrix`](Self::resize_attribute_matrix).
    pub fn resize_array(&mut self, id: IdType, tuple_shape: &[usize]) -> Result<(), StructureError> {
        let obj = self
            .objects
            .get(&id)
            .ok_or(StructureError::MissingObject(id))?;
        if let Some(&matrix) = obj.parents.iter().find(|p| {
            self.objects
                .get(p)
                .is_some_and(|o| matches!(o.data, ObjectData::AttributeMatrix(_)))
        }) {
            let expected = self
                .try_get_data_as::<AttributeMatrix>(matrix)?
                .number_of_tuples();
            return Err(StructureError::TupleCountMismatch {
                expected,
                found: checked_len(tuple_shape, &[]).unwrap_or(usize::MAX),
            });
        }
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(StructureError::MissingObject(id))?;
        let found = obj.type_name();
        match &mut obj.data {
            ObjectData::Array(a) => a.reshape_tuples(tuple_shape),
            _ => Err(StructureError::TypeMismatch {
                id,
                expected: "DataArray",
                found,
            }),
        }
    }

    /// Typed borrow reporting why it failed.
    pub fn try_get_data_as<T: FromDataObject + ?Sized>(
        &self,
        id: IdType,
    ) -> Result<&T, StructureError> {
        self.get_data(id)
            .ok_or(StructureError::MissingObject(id))?
            .try_as::<T>()
    }

    /// Every path that reaches `id`, one per distinct route from the top level.
    pub fn get_data_paths(&self, id: IdType) -> Vec<DataPath> {
        let mut out = Vec::new();
        let mut visiting = BTreeSet::new();
        self.collect_paths(id, &mut Vec::new(), &mut visiting, &mut out);
        out.sort();
        out
    }

    fn collect_paths(
        &self,
        id: IdType,
        suffix: &mut Vec<String>,
        visiting: &mut BTreeSet<IdType>,
        out: &mut Vec<DataPath>,
    ) {
        let Some(obj) = self.objects.get(&id) else {
            return;
        };
        if !visiting.insert(id) {
            return;
        }
        suffix.push(obj.name.clone());
        if self.top_level.contains(&id) {
            let segments: Vec<String> = suffix.iter().rev().cloned().collect();
            if let Ok(p) = DataPath::new(segments) {
                out.push(p);
            }
        }
        for &p in &obj.parents {
            self.collect_paths(p, suffix, visiting, out);
        }
        suffix.pop();
        visiting.remove(&id);
    }

    /// All ids reachable below `id` (excluding `id`), each once, breadth-first.
    pub fn descendants(&self, id: IdType) -> Vec<IdType> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::from(self.children(id).to_vec());
        while let Some(c) = queue.pop_front() {
            if c == id || !seen.insert(c) {
                continue;
            }
            order.push(c);
            queue.extend(self.children(c).iter().copied());
        }
        order
    }

    // ------------------------------------------------------------------
    // parenting
    // ------------------------------------------------------------------

    /// Links `target` under an additional `parent`.
    pub fn set_additional_parent(
        &mut self,
        target: IdType,
        parent: IdType,
    ) -> Result<(), StructureError> {
        let obj = self
            .objects
            .get(&target)
            .ok_or(StructureError::MissingObject(target))?;
        if obj.parents.contains(&parent) {
            return Ok(());
        }
        self.check_can_adopt(parent, &obj.data)?;
        if parent == target || self.descendants(target).contains(&parent) {
            return Err(StructureError::CycleDetected {
                parent,
                child: target,
            });
        }
        let name = obj.name.clone();
        if self.child_named(Some(parent), &name).is_some() {
            return Err(StructureError::NameCollision {
                name,
                parent: Some(parent),
            });
        }
        if let Some(p) = self.objects.get_mut(&parent) {
            p.children.push(target);
        }
        if let Some(t) = self.objects.get_mut(&target) {
            t.parents.insert(parent);
        }
        Ok(())
    }

    /// Unlinks `target` from `parent` (`None` = top level).
    ///
    /// Once the last link is gone the object and its now-orphaned
    /// descendants are removed. Returns `true` when the object was removed.
    pub fn remove_parent(
        &mut self,
        target: IdType,
        parent: Option<IdType>,
    ) -> Result<bool, StructureError> {
        let obj = self
            .objects
            .get(&target)
            .ok_or(StructureError::MissingObject(target))?;
        match parent {
            Some(p) => {
                if !obj.parents.contains(&p) {
                    return Err(StructureError::NotAChild {
                        parent: p,
                        child: target,
                    });
                }
                if let Some(t) = self.objects.get_mut(&target) {
                    t.parents.remove(&p);
                }
                if let Some(po) = self.objects.get_mut(&p) {
                    po.children.retain(|&c| c != target);
                }
            }
            None => {
                let before = self.top_level.len();
                self.top_level.retain(|&c| c != target);
                if self.top_level.len() == before {
                    return Err(StructureError::PathNotFound(obj.name.clone()));
                }
            }
        }
        if self.is_orphan(target) {
            self.remove_data(target)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Moves `target` from `from` to `to`, keeping any other parents.
    ///
    /// Moving onto the current parent is a no-op; `from` must be a current
    /// parent (`None` = top level) before anything is linked.
    pub fn reparent(
        &mut self,
        target: IdType,
        from: Option<IdType>,
        to: Option<IdType>,
    ) -> Result<(), StructureError> {
        let obj = self
            .objects
            .get(&target)
            .ok_or(StructureError::MissingObject(target))?;
        match from {
            Some(p) if !obj.parents.contains(&p) => {
                return Err(StructureError::NotAChild {
                    parent: p,
                    child: target,
                });
            }
            None if !self.top_level.contains(&target) => {
                return Err(StructureError::PathNotFound(obj.name.clone()));
            }
            _ => {}
        }
        if from == to {
            return Ok(());
        }
        match to {
            Some(p) => self.set_additional_parent(target, p)?,
            None => {
                let name = self
                    .objects
                    .get(&target)
                    .ok_or(StructureError::MissingObject(target))?
                    .name
                    .clone();
                if !self.top_level.contains(&target) {
                    if self.child_named(None, &name).is_some() {
                        return Err(StructureError::NameCollision { name, parent: None });
                    }
                    self.top_level.push(target);
                }
            }
        }
        self.remove_parent(target, from).map(|_| ())
    }

    // ------------------------------------------------------------------
    // removal
    // ------------------------------------------------------------------

    /// Removes `id` from every parent, then removes it and any descendant
    /// left without a parent. Geometry references to removed ids are cleared.
    pub fn remove_data(&mut self, id: IdType) -> Result<(), StructureError> {
        let obj = self
            .objects
            .get(&id)
            .ok_or(StructureError::MissingObject(id))?;
        let parents: Vec<IdType> = obj.parents.iter().copied().collect();
        for p in parents {
            if let Some(po) = self.objects.get_mut(&p) {
                po.children.retain(|&c| c != id);
            }
        }
        self.top_level.retain(|&c| c != id);

        let mut removed = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !removed.insert(current) {
                continue;
            }
            let Some(obj) = self.objects.remove(&current) else {
                continue;
            };
            log::trace!("remove {} `{}` ({current})", obj.type_name(), obj.name);
            for child in obj.children {
                let Some(c) = self.objects.get_mut(&child) else {
                    continue;
                };
                c.parents.remove(&current);
                if c.parents.is_empty() && !self.top_level.contains(&child) {
                    stack.push(child);
                }
            }
        }

        for obj in self.objects.values_mut() {
            obj.parents.retain(|p| !removed.contains(p));
            obj.children.retain(|c| !removed.contains(c));
            if let ObjectData::Geometry(g) = &mut obj.data {
                for r in &removed {
                    g.clear_reference(*r);
                }
            }
        }
        self.debug_assert_invariants();
        Ok(())
    }

    pub fn remove_data_by_path(&mut self, path: &DataPath) -> Result<(), StructureError> {
        let id = self
            .get_id(path)
            .ok_or_else(|| StructureError::PathNotFound(path.to_string()))?;
        self.remove_data(id)
    }

    // ------------------------------------------------------------------
    // renaming and resizing
    // ------------------------------------------------------------------

    /// Renames `id`, refusing names already used by a sibling under any parent.
    pub fn rename(&mut self, id: IdType, new_name: &str) -> Result<(), StructureError> {
        validate_name(new_name)?;
        let obj = self
            .objects
            .get(&id)
            .ok_or(StructureError::MissingObject(id))?;
        if obj.name == new_name {
            return Ok(());
        }
        let mut scopes: Vec<Option<IdType>> = obj.parents.iter().copied().map(Some).collect();
        if self.top_level.contains(&id) {
            scopes.push(None);
        }
        for scope in scopes {
            if self.child_named(scope, new_name).is_some() {
                return Err(StructureError::NameCollision {
                    name: new_name.to_string(),
                    parent: scope,
                });
            }
        }
        if let Some(o) = self.objects.get_mut(&id) {
            o.name = new_name.to_string();
        }
        Ok(())
    }

    /// Changes an attribute matrix's tuple shape and resizes every member.
    ///
    /// Every member is prepared before any is changed, so on error the
    /// matrix and all of its members keep the old shape.
    pub fn resize_attribute_matrix(
        &mut self,
        id: IdType,
        tuple_shape: Vec<usize>,
    ) -> Result<(), StructureError> {
        self.try_get_data_as::<AttributeMatrix>(id)?;
        let n = checked_len(&tuple_shape, &[])?;
        let children = self.children(id).to_vec();

        let mut lists = Vec::new();
        for &child in &children {
            let Some(obj) = self.objects.get_mut(&child) else {
                continue;
            };
            match &mut obj.data {
                ObjectData::Array(a) => a.reserve_tuples(&tuple_shape)?,
                ObjectData::StringArray(s) => {
                    let values = s.values_mut();
                    values
                        .try_reserve_exact(n.saturating_sub(values.len()))
                        .map_err(|_| StructureError::AllocationFailed(n))?;
                }
                ObjectData::DynamicList(d) => {
                    let mut rows: Vec<Vec<u64>> = d.iter().map(<[u64]>::to_vec).collect();
                    rows.resize(n, Vec::new());
                    lists.push((child, DynamicListArray::from_lists(&rows)?));
                }
                _ => {}
            }
        }

        for &child in &children {
            let Some(obj) = self.objects.get_mut(&child) else {
                continue;
            };
            match &mut obj.data {
                ObjectData::Array(a) => a.reshape_tuples(&tuple_shape)?,
                ObjectData::StringArray(s) => s.values_mut().resize(n, String::new()),
                _ => {}
            }
        }
        for (child, list) in lists {
            if let Some(ObjectData::DynamicList(d)) =
                self.objects.get_mut(&child).map(|o| &mut o.data)
            {
                *d = list;
            }
        }
        if let Some(ObjectData::AttributeMatrix(am)) =
            self.objects.get_mut(&id).map(|o| &mut o.data)
        {
            am.set_tuple_shape(tuple_shape);
        }
        self.debug_assert_invariants();
        Ok(())
    }

    // ------------------------------------------------------------------
    // crate-internal helpers
    // ------------------------------------------------------------------

    /// Child of `parent` (or top-level object) named `name`.
    pub(crate) fn child_named(&self, parent: Option<IdType>, name: &str) -> Option<IdType> {
        let ids: &[IdType] = match parent {
            Some(p) => self.children(p),
            None => &self.top_level,
        };
        ids.iter()
            .copied()
            .find(|c| self.objects.get(c).is_some_and(|o| o.name == name))
    }

    pub(crate) fn resolve_parent(&self, path: &DataPath) -> Result<Option<IdType>, StructureError> {
        match path.parent() {
            Some(pp) if !pp.is_empty() => self
                .get_id(&pp)
                .map(Some)
                .ok_or_else(|| StructureError::PathNotFound(pp.to_string())),
            _ => Ok(None),
        }
    }

    fn is_orphan(&self, id: IdType) -> bool {
        self.objects
            .get(&id)
            .is_some_and(|o| o.parents.is_empty() && !self.top_level.contains(&id))
    }

    pub(crate) fn check_can_adopt(&self, parent: IdType, child: &ObjectData) -> Result<(), StructureError> {
        let p = self
            .objects
            .get(&parent)
            .ok_or(StructureError::MissingParent(parent))?;
        if !p.data.is_container() {
            return Err(StructureError::NotAContainer(parent));
        }
        if let ObjectData::AttributeMatrix(am) = &p.data {
            let found = child.tuple_count().ok_or_else(|| {
                StructureError::InsertionError(format!(
                    "an attribute matrix cannot hold a {}",
                    child.type_name()
                ))
            })?;
            let expected = am.number_of_tuples();
            if found != expected {
                return Err(StructureError::TupleCountMismatch { expected, found });
            }
        }
        Ok(())
    }

    /// Inserts a fully formed object under a preassigned id (deep copy, reads).
    pub(crate) fn insert_raw(&mut self, object: DataObject, top_level: bool) {
        let id = object.id;
        self.next_id = self.next_id.max(id.get());
        if top_level {
            self.top_level.push(id);
        }
        self.objects.insert(id, object);
    }

    /// Links an existing object under `parent` (or at top level); idempotent.
    pub(crate) fn attach(&mut self, parent: Option<IdType>, child: IdType) -> Result<(), StructureError> {
        if !self.objects.contains_key(&child) {
            return Err(StructureError::MissingObject(child));
        }
        match parent {
            Some(p) => {
                let po = self
                    .objects
                    .get_mut(&p)
                    .ok_or(StructureError::MissingParent(p))?;
                if !po.children.contains(&child) {
                    po.children.push(child);
                }
                if let Some(c) = self.objects.get_mut(&child) {
                    c.parents.insert(p);
                }
            }
            None => {
                if !self.top_level.contains(&child) {
                    self.top_level.push(child);
                }
            }
        }
        Ok(())
    }

    /// Ensures ids below `next` are never handed out.
    pub(crate) fn reserve_ids(&mut self, next: u64) {
        self.next_id = self.next_id.max(next);
    }

    /// Reserves a fresh id without inserting anything.
    pub(crate) fn allocate_id(&mut self) -> IdType {
        let id = IdType::nth(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn objects(&self) -> &BTreeMap<IdType, DataObject> {
        &self.objects
    }

    pub(crate) fn is_top_level(&self, id: IdType) -> bool {
        self.top_level.contains(&id)
    }
}

impl DebugInvariants for DataStructure {
    fn invariant_scope(&self) -> &'static str {
        "DataStructure"
    }

    /// Links resolve and are symmetric, every object is reachable, sibling
    /// names are unique, attribute matrix members match its tuple count and
    /// geometries reference only live ids. Arrays and lists are checked
    /// individually as well.
    fn validate_invariants(&self) -> Result<(), StructureError> {
        for &t in &self.top_level {
            if !self.objects.contains_key(&t) {
                return Err(StructureError::MissingObject(t));
            }
        }
        for (&id, obj) in &self.objects {
            if obj.parents.is_empty() && !self.top_level.contains(&id) {
                return Err(StructureError::InsertionError(format!(
                    "object {id} `{}` is unreachable",
                    obj.name
                )));
            }
            for &p in &obj.parents {
                let parent = self.objects.get(&p).ok_or(StructureError::MissingParent(p))?;
                if !parent.children.contains(&id) {
                    return Err(StructureError::NotAChild { parent: p, child: id });
                }
            }
            let mut names = BTreeSet::new();
            for &c in &obj.children {
                let child = self.objects.get(&c).ok_or(StructureError::MissingObject(c))?;
                if !child.parents.contains(&id) {
                    return Err(StructureError::NotAChild { parent: id, child: c });
                }
                if !names.insert(child.name.as_str()) {
                    return Err(StructureError::NameCollision {
                        name: child.name.clone(),
                        parent: Some(id),
                    });
                }
                if let ObjectData::AttributeMatrix(am) = &obj.data {
                    let found = child.data.tuple_count().unwrap_or(usize::MAX);
                    if found != am.number_of_tuples() {
                        return Err(StructureError::TupleCountMismatch {
                            expected: am.number_of_tuples(),
                            found,
                        });
                    }
                }
            }
            match &obj.data {
                ObjectData::Geometry(g) => {
                    for r in g.referenced_ids() {
                        if !self.objects.contains_key(&r) {
                            return Err(StructureError::MissingObject(r));
                        }
                    }
                }
                ObjectData::Array(a) => a.validate_invariants()?,
                ObjectData::DynamicList(d) => d.validate_invariants()?,
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::any_array::AnyDataArray;

    fn path(s: &str) -> DataPath {
        DataPath::from_string(s).unwrap()
    }

    #[test]
    fn insert_and_resolve() {
        let mut ds = DataStructure::new();
        let g = ds.create_group("Group", None).unwrap();
        let a = ds
            .create_array::<i32>("Array", vec![4], vec![1], 0, Some(g))
            .unwrap();
        assert_eq!(ds.get_id(&path("Group/Array")), Some(a));
        assert!(ds.get_data_by_path(&path("Group/Missing")).is_none());
        assert!(ds.get_data_as::<DataArray<i32>>(a).is_some());
        assert!(ds.get_data_as::<DataArray<f32>>(a).is_none());
        assert!(ds.get_data_as::<AnyDataArray>(a).is_some());
        assert!(ds.get_data_as::<DataGroup>(a).is_none());
    }

    #[test]
    fn insert_failures() {
        let mut ds = DataStructure::new();
        let g = ds.create_group("G", None).unwrap();
        let a = ds.create_array::<u8>("A", vec![2], vec![1], 0, Some(g)).unwrap();
        assert!(matches!(
            ds.create_group("G", None),
            Err(StructureError::NameCollision { .. })
        ));
        assert_eq!(
            ds.create_group("X", Some(IdType::new(999))),
            Err(StructureError::MissingParent(IdType::new(999)))
        );
        assert_eq!(
            ds.create_group("X", Some(a)),
            Err(StructureError::NotAContainer(a))
        );
        assert!(matches!(
            ds.create_group("bad/name", None),
            Err(StructureError::InvalidName(_))
        ));
    }

    #[test]
    fn attribute_matrix_checks_tuple_count() {
        let mut ds = DataStructure::new();
        let am = ds.create_attribute_matrix("CellData", vec![2, 3], None).unwrap();
        ds.create_array::<f32>("Ok", vec![6], vec![3], 0.0, Some(am))
            .unwrap();
        assert_eq!(
            ds.create_array::<f32>("Bad", vec![5], vec![1], 0.0, Some(am)),
            Err(StructureError::TupleCountMismatch {
                expected: 6,
                found: 5
            })
        );
        assert!(ds.create_group("Nope", Some(am)).is_err());
    }

    #[test]
    fn remove_cascades_to_orphans_only() {
        let mut ds = DataStructure::new();
        let a = ds.create_group("A", None).unwrap();
        let b = ds.create_group("B", None).unwrap();
        let shared = ds.create_group("Shared", Some(a)).unwrap();
        ds.set_additional_parent(shared, b).unwrap();
        let only_a = ds.create_group("OnlyA", Some(a)).unwrap();
        let leaf = ds.create_array::<i8>("Leaf", vec![1], vec![1], 0, Some(shared)).unwrap();

        ds.remove_data(a).unwrap();
        assert!(!ds.contains(a));
        assert!(!ds.contains(only_a));
        assert!(ds.contains(shared));
        assert!(ds.contains(leaf));
        assert_eq!(ds.get_id(&path("B/Shared/Leaf")), Some(leaf));
        assert!(ds.get_data(shared).unwrap().parents().iter().eq([b].iter()));
    }

    #[test]
    fn multi_parent_object_survives_first_unlink() {
        let mut ds = DataStructure::new();
        let p1 = ds.create_group("P1", None).unwrap();
        let p2 = ds.create_group("P2", None).unwrap();
        let x = ds.create_array::<u32>("X", vec![3], vec![1], 1, Some(p1)).unwrap();
        ds.set_additional_parent(x, p2).unwrap();

        assert!(!ds.remove_parent(x, Some(p1)).unwrap());
        assert!(ds.contains(x));
        assert_eq!(ds.get_id(&path("P2/X")), Some(x));
        assert!(ds.get_id(&path("P1/X")).is_none());

        assert!(ds.remove_parent(x, Some(p2)).unwrap());
        assert!(!ds.contains(x));
        assert!(ds.children(p2).is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut ds = DataStructure::new();
        let a = ds.create_group("A", None).unwrap();
        let b = ds.create_group("B", Some(a)).unwrap();
        let c = ds.create_group("C", Some(b)).unwrap();
        assert!(matches!(
            ds.set_additional_parent(a, c),
            Err(StructureError::CycleDetected { .. })
        ));
        assert!(matches!(
            ds.set_additional_parent(a, a),
            Err(StructureError::CycleDetected { .. })
        ));
    }

    #[test]
    fn rename_checks_every_scope() {
        let mut ds = DataStructure::new();
        let p1 = ds.create_group("P1", None).unwrap();
        let p2 = ds.create_group("P2", None).unwrap();
        let x = ds.create_group("X", Some(p1)).unwrap();
        ds.create_group("Taken", Some(p2)).unwrap();
        ds.set_additional_parent(x, p2).unwrap();
        assert!(ds.rename(x, "Taken").is_err());
        ds.rename(x, "Y").unwrap();
        assert_eq!(ds.get_id(&path("P1/Y")), Some(x));
        assert_eq!(ds.get_id(&path("P2/Y")), Some(x));
    }

    #[test]
    fn data_paths_cover_every_parent() {
        let mut ds = DataStructure::new();
        let p1 = ds.create_group("P1", None).unwrap();
        let p2 = ds.create_group("P2", None).unwrap();
        let x = ds.create_group("X", Some(p1)).unwrap();
        ds.set_additional_parent(x, p2).unwrap();
        assert_eq!(ds.get_data_paths(x), vec![path("P1/X"), path("P2/X")]);
    }

    #[test]
    fn reparent_moves_between_scopes() {
        let mut ds = DataStructure::new();
        let p1 = ds.create_group("P1", None).unwrap();
        let x = ds.create_group("X", Some(p1)).unwrap();
        ds.reparent(x, Some(p1), None).unwrap();
        assert_eq!(ds.get_id(&path("X")), Some(x));
        assert!(ds.children(p1).is_empty());
        ds.reparent(x, None, Some(p1)).unwrap();
        assert_eq!(ds.get_id(&path("P1/X")), Some(x));
        assert!(!ds.top_level_ids().contains(&x));
    }

    #[test]
    fn invariants_hold_after_mutation() {
        let mut ds = DataStructure::new();
        let a = ds.create_group("A", None).unwrap();
        let b = ds.create_group("B", Some(a)).unwrap();
        ds.create_group("C", Some(b)).unwrap();
        let d = ds.create_group("D", None).unwrap();
        ds.set_additional_parent(b, d).unwrap();
        ds.remove_data(a).unwrap();
        assert!(ds.validate_invariants().is_ok());
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn resize_attribute_matrix_resizes_members() {
        let mut ds = DataStructure::new();
        let am = ds.create_attribute_matrix("AM", vec![4], None).unwrap();
        let a = ds.create_array::<i32>("A", vec![4], vec![2], 3, Some(am)).unwrap();
        let s = ds
            .create_string_array("S", vec!["a".into(); 4], Some(am))
            .unwrap();
        ds.resize_attribute_matrix(am, vec![2, 3]).unwrap();
        assert_eq!(ds.get_data_as::<DataArray<i32>>(a).unwrap().size(), 12);
        assert_eq!(ds.get_data_as::<StringArray>(s).unwrap().len(), 6);
        assert_eq!(
            ds.get_data_as::<AttributeMatrix>(am).unwrap().number_of_tuples(),
            6
        );
    }
}
