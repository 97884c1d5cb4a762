//! Work breakdown tree
//!
//! An arena of work items keyed by ID plus an incrementally maintained
//! parent -> children index. Items never hold references to each other, so
//! the parent link on each record is the single source of truth for shape.
//! Loading a snapshot validates parent links with petgraph.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use super::id::{ProjectId, WorkItemId};
use super::item::{ItemStatus, WorkItem, MAX_LEVEL};

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("Work item not found: {0}")]
    NotFound(WorkItemId),

    #[error("Placing {item} under {target} would make it its own ancestor")]
    CycleDetected { item: WorkItemId, target: WorkItemId },

    #[error("Depth limit exceeded at {item}: level {level} is deeper than {max}", max = MAX_LEVEL)]
    DepthExceeded { item: WorkItemId, level: usize },

    #[error("Invalid status: '{0}'")]
    InvalidStatus(String),

    #[error("Work item {item} belongs to project {actual}, expected {expected}")]
    ProjectMismatch {
        item: WorkItemId,
        expected: ProjectId,
        actual: ProjectId,
    },

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Parent {parent} of work item {item} does not exist")]
    DanglingParent { item: WorkItemId, parent: WorkItemId },

    #[error("Duplicate work item ID: {0}")]
    DuplicateId(WorkItemId),
}

/// The work breakdown tree of a single project
#[derive(Debug, Clone)]
pub struct TreeStore {
    project_id: ProjectId,

    /// All items by ID
    items: HashMap<WorkItemId, WorkItem>,

    /// Root item IDs in position order
    roots: Vec<WorkItemId>,

    /// Child IDs per parent, in position order
    children: HashMap<WorkItemId, Vec<WorkItemId>>,
}

impl TreeStore {
    /// Creates an empty tree for a project
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            items: HashMap::new(),
            roots: Vec::new(),
            children: HashMap::new(),
        }
    }

    /// Builds a tree from persisted records.
    ///
    /// Structure comes from `parent_id` links regardless of input order.
    /// Siblings are ordered by position, falling back to input order on
    /// ties. Stored levels that disagree with the structure are recomputed.
    pub fn from_items(
        project_id: ProjectId,
        records: impl IntoIterator<Item = WorkItem>,
    ) -> Result<Self, TreeError> {
        let mut store = Self::new(project_id);
        let mut input_order = Vec::new();

        for item in records {
            if item.project_id != store.project_id {
                return Err(TreeError::ProjectMismatch {
                    item: item.id,
                    expected: store.project_id.clone(),
                    actual: item.project_id,
                });
            }
            if store.items.contains_key(&item.id) {
                return Err(TreeError::DuplicateId(item.id));
            }
            input_order.push(item.id.clone());
            store.items.insert(item.id.clone(), item);
        }

        store.check_parent_links(&input_order)?;

        // Input order is the tiebreak, so build lists in that order and rely
        // on the stable sort below.
        for id in &input_order {
            let parent = store.items[id].parent_id.clone();
            store.siblings_mut(parent.as_ref()).push(id.clone());
        }

        let mut roots = std::mem::take(&mut store.roots);
        store.sort_group(&mut roots);
        store.roots = roots;

        let parents: Vec<WorkItemId> = store.children.keys().cloned().collect();
        for parent in parents {
            if let Some(mut group) = store.children.remove(&parent) {
                store.sort_group(&mut group);
                store.children.insert(parent, group);
            }
        }

        store.normalize_levels()?;

        tracing::debug!(
            project = %store.project_id,
            items = store.items.len(),
            "loaded work breakdown tree"
        );
        Ok(store)
    }

    /// Rejects dangling and cyclic parent links
    fn check_parent_links(&self, order: &[WorkItemId]) -> Result<(), TreeError> {
        let mut graph: DiGraph<WorkItemId, ()> = DiGraph::new();
        let mut node_map: HashMap<&WorkItemId, NodeIndex> = HashMap::new();

        for id in order {
            node_map.insert(id, graph.add_node(id.clone()));
        }

        for id in order {
            let Some(parent) = self.items[id].parent_id.as_ref() else {
                continue;
            };
            if parent == id {
                return Err(TreeError::CycleDetected {
                    item: id.clone(),
                    target: parent.clone(),
                });
            }
            let parent_idx = node_map.get(parent).ok_or_else(|| TreeError::DanglingParent {
                item: id.clone(),
                parent: parent.clone(),
            })?;
            graph.add_edge(*parent_idx, node_map[id], ());
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            let item = graph[cycle.node_id()].clone();
            let target = self.items[&item]
                .parent_id
                .clone()
                .unwrap_or_else(|| item.clone());
            TreeError::CycleDetected { item, target }
        })
    }

    /// Sorts a sibling group by position and makes positions strictly increasing
    fn sort_group(&mut self, group: &mut [WorkItemId]) {
        group.sort_by_key(|id| self.items[id].position);

        let mut previous: Option<i64> = None;
        for id in group.iter() {
            let Some(item) = self.items.get_mut(id) else {
                continue;
            };
            if let Some(prev) = previous {
                if item.position <= prev {
                    tracing::warn!(
                        item = %item.id,
                        position = item.position,
                        "duplicate sibling position, shifting after {}",
                        prev
                    );
                    item.position = prev + 1;
                }
            }
            previous = Some(item.position);
        }
    }

    /// Recomputes every level from the structure
    fn normalize_levels(&mut self) -> Result<(), TreeError> {
        let mut stack: Vec<(WorkItemId, usize)> =
            self.roots.iter().map(|id| (id.clone(), 1)).collect();

        while let Some((id, level)) = stack.pop() {
            if level > MAX_LEVEL as usize {
                return Err(TreeError::DepthExceeded { item: id, level });
            }
            if let Some(item) = self.items.get_mut(&id) {
                if item.level as usize != level {
                    tracing::warn!(
                        item = %id,
                        stored = item.level,
                        actual = level,
                        "stored level disagrees with tree structure, recomputing"
                    );
                    item.level = level as u8;
                }
            }
            for child in self.child_ids(Some(&id)) {
                stack.push((child.clone(), level + 1));
            }
        }

        Ok(())
    }

    /// Returns the owning project
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the number of items in the tree
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the tree has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if the tree contains the item
    pub fn contains(&self, id: &WorkItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Gets an item by ID
    pub fn get(&self, id: &WorkItemId) -> Option<&WorkItem> {
        self.items.get(id)
    }

    /// Gets an item by ID, failing with `NotFound`
    pub fn require(&self, id: &WorkItemId) -> Result<&WorkItem, TreeError> {
        self.items
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    pub(crate) fn require_mut(&mut self, id: &WorkItemId) -> Result<&mut WorkItem, TreeError> {
        self.items
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    /// Child IDs of a parent (None = roots) in position order
    pub fn child_ids(&self, parent: Option<&WorkItemId>) -> &[WorkItemId] {
        match parent {
            None => &self.roots,
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    pub(crate) fn siblings_mut(&mut self, parent: Option<&WorkItemId>) -> &mut Vec<WorkItemId> {
        match parent {
            None => &mut self.roots,
            Some(id) => self.children.entry(id.clone()).or_default(),
        }
    }

    /// Returns true if the item has at least one child
    pub fn has_children(&self, id: &WorkItemId) -> bool {
        !self.child_ids(Some(id)).is_empty()
    }

    /// Root items in position order
    pub fn roots(&self) -> Vec<&WorkItem> {
        self.roots.iter().filter_map(|id| self.items.get(id)).collect()
    }

    /// Direct children of an item in position order
    pub fn children(&self, id: &WorkItemId) -> Result<Vec<&WorkItem>, TreeError> {
        self.require(id)?;
        Ok(self
            .child_ids(Some(id))
            .iter()
            .filter_map(|child| self.items.get(child))
            .collect())
    }

    /// Walks from the item's parent up to its root.
    ///
    /// The item itself is not yielded, so the count equals `level - 1`.
    /// The iterator is cheap to clone and can be restarted by calling this
    /// again.
    pub fn ancestors(&self, id: &WorkItemId) -> Result<Ancestors<'_>, TreeError> {
        let item = self.require(id)?;
        Ok(Ancestors {
            store: self,
            next: item.parent_id.as_ref(),
            remaining: MAX_LEVEL,
        })
    }

    /// IDs of every item below `id`, in pre-order
    pub fn descendants(&self, id: &WorkItemId) -> Result<Vec<WorkItemId>, TreeError> {
        self.require(id)?;

        let mut result = Vec::new();
        let mut stack: Vec<&WorkItemId> = self.child_ids(Some(id)).iter().rev().collect();
        while let Some(current) = stack.pop() {
            result.push(current.clone());
            stack.extend(self.child_ids(Some(current)).iter().rev());
        }
        Ok(result)
    }

    /// Every item in tree pre-order (roots first, siblings by position)
    pub fn items(&self) -> Vec<&WorkItem> {
        let mut result = Vec::with_capacity(self.items.len());
        let mut stack: Vec<&WorkItemId> = self.roots.iter().rev().collect();
        while let Some(current) = stack.pop() {
            if let Some(item) = self.items.get(current) {
                result.push(item);
            }
            stack.extend(self.child_ids(Some(current)).iter().rev());
        }
        result
    }

    /// Names from the root down to the item
    pub fn path_names(&self, id: &WorkItemId) -> Result<Vec<&str>, TreeError> {
        let item = self.require(id)?;
        let mut names: Vec<&str> = self.ancestors(id)?.map(|a| a.name.as_str()).collect();
        names.reverse();
        names.push(item.name.as_str());
        Ok(names)
    }

    /// Position one past the last sibling under `parent`, ignoring `exclude`
    pub(crate) fn next_position(
        &self,
        parent: Option<&WorkItemId>,
        exclude: Option<&WorkItemId>,
    ) -> i64 {
        self.child_ids(parent)
            .iter()
            .filter(|id| Some(*id) != exclude)
            .filter_map(|id| self.items.get(id))
            .map(|item| item.position)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Generates an ID not yet used in this tree
    fn fresh_id(&self, name: &str) -> WorkItemId {
        let now = Utc::now();
        let mut salt = 0;
        loop {
            let id = WorkItemId::salted(name, now, salt);
            if !self.items.contains_key(&id) {
                return id;
            }
            salt += 1;
        }
    }

    /// Inserts a new root item at the end of the root group
    pub fn insert_root(&mut self, name: impl Into<String>) -> WorkItemId {
        let name = name.into();
        let id = self.fresh_id(&name);

        let mut item = WorkItem::new(id.clone(), self.project_id.clone(), name);
        item.position = self.next_position(None, None);

        tracing::debug!(item = %id, position = item.position, "inserted root item");
        self.items.insert(id.clone(), item);
        self.roots.push(id.clone());
        id
    }

    /// Inserts a new item at the end of `parent_id`'s children
    pub fn insert_child(
        &mut self,
        parent_id: &WorkItemId,
        name: impl Into<String>,
    ) -> Result<WorkItemId, TreeError> {
        let parent = self.require(parent_id)?;
        if parent.at_max_depth() {
            return Err(TreeError::DepthExceeded {
                item: parent_id.clone(),
                level: parent.level as usize + 1,
            });
        }
        let level = parent.level + 1;

        let name = name.into();
        let id = self.fresh_id(&name);

        let mut item = WorkItem::new(id.clone(), self.project_id.clone(), name);
        item.parent_id = Some(parent_id.clone());
        item.level = level;
        item.position = self.next_position(Some(parent_id), None);

        tracing::debug!(
            item = %id,
            parent = %parent_id,
            level,
            position = item.position,
            "inserted child item"
        );
        self.items.insert(id.clone(), item);
        self.siblings_mut(Some(parent_id)).push(id.clone());
        Ok(id)
    }

    /// Renames an item
    pub fn rename(&mut self, id: &WorkItemId, name: impl Into<String>) -> Result<(), TreeError> {
        let item = self.require_mut(id)?;
        item.name = name.into();
        item.touch();
        Ok(())
    }

    /// Sets or clears an item's description
    pub fn describe(
        &mut self,
        id: &WorkItemId,
        description: Option<String>,
    ) -> Result<(), TreeError> {
        let item = self.require_mut(id)?;
        item.description = description;
        item.touch();
        Ok(())
    }

    /// Changes an item's status. Progress is not recomputed here.
    pub fn set_status(&mut self, id: &WorkItemId, status: ItemStatus) -> Result<(), TreeError> {
        let item = self.require_mut(id)?;
        if item.status != status {
            tracing::debug!(item = %id, from = %item.status, to = %status, "status changed");
            item.status = status;
            item.touch();
        }
        Ok(())
    }

    /// Replaces an item's planned interval
    pub fn set_planned_dates(
        &mut self,
        id: &WorkItemId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), TreeError> {
        let item = self.require_mut(id)?;
        item.planned_start = start;
        item.planned_end = end;
        item.touch();
        Ok(())
    }

    /// Replaces an item's actual interval
    pub fn set_actual_dates(
        &mut self,
        id: &WorkItemId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), TreeError> {
        let item = self.require_mut(id)?;
        item.actual_start = start;
        item.actual_end = end;
        item.touch();
        Ok(())
    }

    /// Removes an item and its whole subtree, returning the removed records
    /// in pre-order
    pub fn remove(&mut self, id: &WorkItemId) -> Result<Vec<WorkItem>, TreeError> {
        let parent = self.require(id)?.parent_id.clone();
        let mut doomed = vec![id.clone()];
        doomed.extend(self.descendants(id)?);

        self.siblings_mut(parent.as_ref()).retain(|sibling| sibling != id);

        let removed: Vec<WorkItem> = doomed
            .iter()
            .filter_map(|doomed_id| {
                self.children.remove(doomed_id);
                self.items.remove(doomed_id)
            })
            .collect();

        tracing::debug!(item = %id, removed = removed.len(), "removed subtree");
        Ok(removed)
    }
}

/// Iterator over an item's ancestors, nearest first
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    store: &'a TreeStore,
    next: Option<&'a WorkItemId>,
    /// Levels are capped, so the walk is bounded by the same limit
    remaining: u8,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a WorkItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.store.items.get(self.next?)?;
        self.remaining -= 1;
        self.next = item.parent_id.as_ref();
        Some(item)
    }
}
