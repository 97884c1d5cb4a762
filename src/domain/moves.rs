//! Reparenting work items
//!
//! A move relocates an item together with its subtree. Every check runs
//! before the first mutation, so a rejected move leaves the tree untouched.

use std::collections::HashSet;

use serde::Serialize;

use super::id::WorkItemId;
use super::item::MAX_LEVEL;
use super::tree::{TreeError, TreeStore};

/// Level change of one item caused by a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelChange {
    pub id: WorkItemId,
    pub from: u8,
    pub to: u8,
}

/// Result of a successful move, for the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub item_id: WorkItemId,
    pub new_parent_id: Option<WorkItemId>,
    pub position: i64,
    /// New level of the moved item followed by each descendant, pre-order
    pub levels: Vec<LevelChange>,
}

/// An item that may receive `exclude` as a child
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentCandidate {
    pub id: WorkItemId,
    /// Names from the root down to the candidate, joined with " / "
    pub path: String,
    pub level: u8,
}

/// Moves `item_id` under `new_parent_id`, or to the root group when `None`.
///
/// The item is appended after its new siblings. The old sibling group keeps
/// its positions, gaps included.
pub fn move_item(
    store: &mut TreeStore,
    item_id: &WorkItemId,
    new_parent_id: Option<&WorkItemId>,
) -> Result<MoveOutcome, TreeError> {
    let item = store.require(item_id)?;
    let old_level = item.level;
    let old_parent = item.parent_id.clone();

    let new_level = match new_parent_id {
        None => 1,
        Some(parent_id) => {
            let parent = store.require(parent_id)?;
            let creates_cycle = parent_id == item_id
                || store.ancestors(parent_id)?.any(|a| &a.id == item_id);
            if creates_cycle {
                return Err(TreeError::CycleDetected {
                    item: item_id.clone(),
                    target: parent_id.clone(),
                });
            }
            parent.level as usize + 1
        }
    };

    // Deepest relative level inside the moved subtree
    let subtree = store.descendants(item_id)?;
    let height = subtree
        .iter()
        .filter_map(|id| store.get(id))
        .map(|d| (d.level - old_level) as usize)
        .max()
        .unwrap_or(0);

    if new_level + height > MAX_LEVEL as usize {
        return Err(TreeError::DepthExceeded {
            item: item_id.clone(),
            level: new_level + height,
        });
    }

    let position = store.next_position(new_parent_id, Some(item_id));

    // Validation done, mutate.
    store
        .siblings_mut(old_parent.as_ref())
        .retain(|sibling| sibling != item_id);
    store.siblings_mut(new_parent_id).push(item_id.clone());

    let moved = store.require_mut(item_id)?;
    moved.parent_id = new_parent_id.cloned();
    moved.position = position;
    moved.touch();

    let delta = new_level as i16 - old_level as i16;
    let mut levels = Vec::with_capacity(subtree.len() + 1);
    for id in std::iter::once(item_id).chain(subtree.iter()) {
        let node = store.require_mut(id)?;
        let from = node.level;
        node.level = (from as i16 + delta) as u8;
        levels.push(LevelChange {
            id: id.clone(),
            from,
            to: node.level,
        });
    }

    tracing::debug!(
        item = %item_id,
        parent = ?new_parent_id.map(ToString::to_string),
        position,
        level = new_level,
        subtree = subtree.len(),
        "moved item"
    );

    Ok(MoveOutcome {
        item_id: item_id.clone(),
        new_parent_id: new_parent_id.cloned(),
        position,
        levels,
    })
}

/// Lists every item `exclude` could be moved under, in tree pre-order.
///
/// The item itself and its descendants are left out. Depth is not checked
/// here; a candidate that is too deep is rejected by [`move_item`].
pub fn potential_parents(
    store: &TreeStore,
    exclude: &WorkItemId,
) -> Result<Vec<ParentCandidate>, TreeError> {
    let mut excluded: HashSet<WorkItemId> = store.descendants(exclude)?.into_iter().collect();
    excluded.insert(exclude.clone());

    store
        .items()
        .into_iter()
        .filter(|item| !excluded.contains(&item.id))
        .map(|item| {
            Ok::<_, TreeError>(ParentCandidate {
                id: item.id.clone(),
                path: store.path_names(&item.id)?.join(" / "),
                level: item.level,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::ProjectId;
    use chrono::Utc;

    struct Fixture {
        store: TreeStore,
        a: WorkItemId,
        a1: WorkItemId,
        a1x: WorkItemId,
        b: WorkItemId,
        b1: WorkItemId,
    }

    /// A
    /// ├── A1
    /// │   └── A1x
    /// B
    /// └── B1
    fn fixture() -> Fixture {
        let mut store = TreeStore::new(ProjectId::new("Moves", Utc::now()));
        let a = store.insert_root("A");
        let a1 = store.insert_child(&a, "A1").unwrap();
        let a1x = store.insert_child(&a1, "A1x").unwrap();
        let b = store.insert_root("B");
        let b1 = store.insert_child(&b, "B1").unwrap();
        Fixture {
            store,
            a,
            a1,
            a1x,
            b,
            b1,
        }
    }

    fn level(store: &TreeStore, id: &WorkItemId) -> u8 {
        store.get(id).unwrap().level
    }

    #[test]
    fn move_under_new_parent_appends_and_relevels() {
        let mut f = fixture();
        let outcome = move_item(&mut f.store, &f.a1, Some(&f.b1)).unwrap();

        assert_eq!(outcome.new_parent_id, Some(f.b1.clone()));
        assert_eq!(outcome.position, 0);
        assert_eq!(level(&f.store, &f.a1), 3);
        assert_eq!(level(&f.store, &f.a1x), 4);
        assert_eq!(
            outcome.levels,
            vec![
                LevelChange { id: f.a1.clone(), from: 2, to: 3 },
                LevelChange { id: f.a1x.clone(), from: 3, to: 4 },
            ]
        );

        assert!(f.store.children(&f.a).unwrap().is_empty());
        let under_b1: Vec<_> = f.store.children(&f.b1).unwrap().iter().map(|c| c.id.clone()).collect();
        assert_eq!(under_b1, vec![f.a1.clone()]);
    }

    #[test]
    fn move_appends_after_existing_siblings() {
        let mut f = fixture();
        let outcome = move_item(&mut f.store, &f.a1x, Some(&f.b)).unwrap();
        assert_eq!(outcome.position, 1);

        let under_b: Vec<_> = f.store.children(&f.b).unwrap().iter().map(|c| c.id.clone()).collect();
        assert_eq!(under_b, vec![f.b1.clone(), f.a1x.clone()]);
    }

    #[test]
    fn move_to_root_sets_level_one() {
        let mut f = fixture();
        let outcome = move_item(&mut f.store, &f.a1, None).unwrap();

        assert_eq!(outcome.new_parent_id, None);
        assert_eq!(outcome.position, 2);
        assert_eq!(level(&f.store, &f.a1), 1);
        assert_eq!(level(&f.store, &f.a1x), 2);
        assert_eq!(f.store.roots().len(), 3);
    }

    #[test]
    fn move_to_same_parent_keeps_levels() {
        let mut f = fixture();
        let before: Vec<_> = f.store.items().iter().map(|i| (i.id.clone(), i.level)).collect();

        let outcome = move_item(&mut f.store, &f.a1, Some(&f.a)).unwrap();
        // Sole child: max of the other siblings is empty
        assert_eq!(outcome.position, 0);
        assert!(outcome.levels.iter().all(|c| c.from == c.to));

        let after: Vec<_> = f.store.items().iter().map(|i| (i.id.clone(), i.level)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn old_siblings_keep_their_gaps() {
        let mut store = TreeStore::new(ProjectId::new("Gaps", Utc::now()));
        let root = store.insert_root("Root");
        let x = store.insert_child(&root, "X").unwrap();
        let y = store.insert_child(&root, "Y").unwrap();
        let z = store.insert_child(&root, "Z").unwrap();

        move_item(&mut store, &y, None).unwrap();

        let positions: Vec<_> = store.children(&root).unwrap().iter().map(|c| (c.id.clone(), c.position)).collect();
        assert_eq!(positions, vec![(x, 0), (z, 2)]);
    }

    #[test]
    fn move_under_self_is_a_cycle() {
        let mut f = fixture();
        let result = move_item(&mut f.store, &f.a, Some(&f.a));
        assert_eq!(
            result,
            Err(TreeError::CycleDetected {
                item: f.a.clone(),
                target: f.a.clone()
            })
        );
    }

    #[test]
    fn move_under_descendant_is_a_cycle() {
        let mut f = fixture();
        let before: Vec<_> = f.store.items().into_iter().cloned().collect();

        let result = move_item(&mut f.store, &f.a, Some(&f.a1x));
        assert!(matches!(result, Err(TreeError::CycleDetected { .. })));

        let after: Vec<_> = f.store.items().into_iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn move_with_unknown_ids_is_not_found() {
        let mut f = fixture();
        let ghost = WorkItemId::new("ghost", Utc::now());

        assert_eq!(
            move_item(&mut f.store, &ghost, None),
            Err(TreeError::NotFound(ghost.clone()))
        );
        assert_eq!(
            move_item(&mut f.store, &f.a, Some(&ghost)),
            Err(TreeError::NotFound(ghost.clone()))
        );
    }

    #[test]
    fn move_rejects_descendants_past_max_depth() {
        let mut store = TreeStore::new(ProjectId::new("Deep", Utc::now()));
        // Chain of four: L1 > L2 > L3 > L4
        let l1 = store.insert_root("L1");
        let l2 = store.insert_child(&l1, "L2").unwrap();
        let l3 = store.insert_child(&l2, "L3").unwrap();
        let l4 = store.insert_child(&l3, "L4").unwrap();

        // Subtree of height two: S > S1 > S2
        let s = store.insert_root("S");
        let s1 = store.insert_child(&s, "S1").unwrap();
        store.insert_child(&s1, "S2").unwrap();

        let before: Vec<_> = store.items().into_iter().cloned().collect();

        // S would land at 4 and S2 at 6
        let result = move_item(&mut store, &s, Some(&l3));
        assert_eq!(
            result,
            Err(TreeError::DepthExceeded {
                item: s.clone(),
                level: 6
            })
        );

        // S itself would land at 6
        let result = move_item(&mut store, &s, Some(&l4));
        assert!(matches!(result, Err(TreeError::DepthExceeded { .. })));

        let after: Vec<_> = store.items().into_iter().cloned().collect();
        assert_eq!(before, after);

        // S landing at 3 keeps S2 at 5, which is allowed
        move_item(&mut store, &s, Some(&l2)).unwrap();
        assert_eq!(level(&store, &s), 3);
    }

    #[test]
    fn potential_parents_skip_item_and_descendants() {
        let f = fixture();
        let candidates = potential_parents(&f.store, &f.a).unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.id.clone()).collect();

        assert_eq!(ids, vec![f.b.clone(), f.b1.clone()]);
        assert!(!ids.contains(&f.a));
        assert!(!ids.contains(&f.a1));
        assert!(!ids.contains(&f.a1x));
    }

    #[test]
    fn potential_parents_skip_a_wide_subtree() {
        let mut f = fixture();
        let children: Vec<_> = (0..200)
            .map(|i| f.store.insert_child(&f.a1, format!("Task {i}")).unwrap())
            .collect();

        let ids: Vec<_> = potential_parents(&f.store, &f.a)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![f.b.clone(), f.b1.clone()]);

        let ids: Vec<_> = potential_parents(&f.store, &f.a1x)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids.len(), 4 + children.len());
        assert!(children.iter().all(|child| ids.contains(child)));
    }

    #[test]
    fn potential_parents_carry_path_and_level() {
        let f = fixture();
        let candidates = potential_parents(&f.store, &f.b1).unwrap();

        let a1x = candidates.iter().find(|c| c.id == f.a1x).unwrap();
        assert_eq!(a1x.path, "A / A1 / A1x");
        assert_eq!(a1x.level, 3);

        let b = candidates.iter().find(|c| c.id == f.b).unwrap();
        assert_eq!(b.path, "B");
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn potential_parents_for_unknown_item_fails() {
        let f = fixture();
        let ghost = WorkItemId::new("ghost", Utc::now());
        assert!(matches!(
            potential_parents(&f.store, &ghost),
            Err(TreeError::NotFound(_))
        ));
    }
}
