//! Property tests for tree structure, moves, progress and timeline rows

use std::collections::HashSet;

use chrono::Utc;
use proptest::prelude::*;
use wbs_engine::domain::progress::{progress, progress_all};
use wbs_engine::domain::timeline::{visible_rows, ExpandState};
use wbs_engine::domain::{
    move_item, potential_parents, ItemStatus, ProjectId, TreeStore, WorkItem, WorkItemId, MAX_LEVEL,
};

/// One insert step: pick a parent by index, or insert a root
type InsertOp = (usize, bool, u8);

/// One move step: item index, target index, move to root
type MoveOp = (usize, usize, bool);

fn arb_inserts() -> impl Strategy<Value = Vec<InsertOp>> {
    prop::collection::vec((any::<usize>(), prop::bool::weighted(0.2), 0u8..4), 1..40)
}

fn arb_moves() -> impl Strategy<Value = Vec<MoveOp>> {
    prop::collection::vec((any::<usize>(), any::<usize>(), prop::bool::weighted(0.2)), 0..30)
}

fn build(ops: &[InsertOp]) -> TreeStore {
    let mut tree = TreeStore::new(ProjectId::new("Props", Utc::now()));
    for (i, &(pick, as_root, status)) in ops.iter().enumerate() {
        let parents: Vec<WorkItemId> = tree
            .items()
            .into_iter()
            .filter(|item| !item.at_max_depth())
            .map(|item| item.id.clone())
            .collect();

        let name = format!("item {}", i);
        let id = if as_root || parents.is_empty() {
            tree.insert_root(name)
        } else {
            tree.insert_child(&parents[pick % parents.len()], name).unwrap()
        };
        tree.set_status(&id, ItemStatus::ALL[status as usize]).unwrap();
    }
    tree
}

fn ids(tree: &TreeStore) -> Vec<WorkItemId> {
    tree.items().into_iter().map(|item| item.id.clone()).collect()
}

fn snapshot(tree: &TreeStore) -> Vec<WorkItem> {
    tree.items().into_iter().cloned().collect()
}

fn check_invariants(tree: &TreeStore) -> Result<(), TestCaseError> {
    let items = tree.items();
    prop_assert_eq!(items.len(), tree.len());

    for item in &items {
        let ancestors: Vec<_> = tree.ancestors(&item.id).unwrap().map(|a| a.id.clone()).collect();
        prop_assert!(!ancestors.contains(&item.id));
        prop_assert_eq!(item.level as usize, ancestors.len() + 1);
        prop_assert!(item.level >= 1 && item.level <= MAX_LEVEL);

        if let Some(parent) = &item.parent_id {
            prop_assert_eq!(tree.get(parent).unwrap().level + 1, item.level);
        }

        let positions: Vec<i64> = tree
            .children(&item.id)
            .unwrap()
            .iter()
            .map(|c| c.position)
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    let root_positions: Vec<i64> = tree.roots().iter().map(|r| r.position).collect();
    prop_assert!(root_positions.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_moves_preserve_invariants(inserts in arb_inserts(), moves in arb_moves()) {
        let mut tree = build(&inserts);
        check_invariants(&tree)?;

        for (item, target, to_root) in moves {
            let all = ids(&tree);
            let item = &all[item % all.len()];
            let target = (!to_root).then(|| &all[target % all.len()]);

            let before = snapshot(&tree);
            if move_item(&mut tree, item, target).is_err() {
                // Failed moves leave the tree unchanged
                prop_assert_eq!(before, snapshot(&tree));
            }
            check_invariants(&tree)?;
        }
    }

    #[test]
    fn move_to_root_shifts_subtree_uniformly(inserts in arb_inserts(), pick in any::<usize>()) {
        let mut tree = build(&inserts);
        let all = ids(&tree);
        let item = &all[pick % all.len()];

        let old_level = tree.get(item).unwrap().level;
        let subtree = tree.descendants(item).unwrap();
        let old_levels: Vec<u8> = subtree.iter().map(|d| tree.get(d).unwrap().level).collect();

        move_item(&mut tree, item, None).unwrap();

        prop_assert_eq!(tree.get(item).unwrap().level, 1);
        let delta = old_level - 1;
        for (id, old) in subtree.iter().zip(old_levels) {
            prop_assert_eq!(tree.get(id).unwrap().level, old - delta);
        }
    }

    #[test]
    fn move_to_same_parent_keeps_levels(inserts in arb_inserts(), pick in any::<usize>()) {
        let mut tree = build(&inserts);
        let all = ids(&tree);
        let item = &all[pick % all.len()];
        let parent = tree.get(item).unwrap().parent_id.clone();

        let levels_before: Vec<_> = tree.items().iter().map(|i| (i.id.clone(), i.level)).collect();
        move_item(&mut tree, item, parent.as_ref()).unwrap();

        let mut levels_after: Vec<_> = tree.items().iter().map(|i| (i.id.clone(), i.level)).collect();
        let mut levels_before = levels_before;
        levels_before.sort();
        levels_after.sort();
        prop_assert_eq!(levels_before, levels_after);
    }

    #[test]
    fn potential_parents_exclude_subtree(inserts in arb_inserts(), pick in any::<usize>()) {
        let tree = build(&inserts);
        let all = ids(&tree);
        let item = &all[pick % all.len()];

        let mut excluded: HashSet<WorkItemId> = tree.descendants(item).unwrap().into_iter().collect();
        excluded.insert(item.clone());

        let candidates = potential_parents(&tree, item).unwrap();
        prop_assert_eq!(candidates.len() + excluded.len(), tree.len());
        for candidate in candidates {
            prop_assert!(!excluded.contains(&candidate.id));
        }
    }

    #[test]
    fn progress_respects_rollup_rules(inserts in arb_inserts()) {
        let tree = build(&inserts);
        let values = progress_all(&tree);

        for item in tree.items() {
            let value = values[&item.id];
            let own = f64::from(item.status.progress_weight());
            prop_assert!((0.0..=100.0).contains(&value));
            prop_assert!(value >= own);
            prop_assert_eq!(value, progress(&tree, &item.id));

            let children = tree.children(&item.id).unwrap();
            if children.is_empty() {
                prop_assert_eq!(value, own);
            } else {
                let mean = children.iter().map(|c| values[&c.id]).sum::<f64>() / children.len() as f64;
                prop_assert_eq!(value, own.max(mean));
            }
        }
    }

    #[test]
    fn snapshot_order_does_not_matter(inserts in arb_inserts(), rotate in any::<usize>(), reverse in any::<bool>()) {
        let tree = build(&inserts);
        let mut records = snapshot(&tree);
        let len = records.len();
        records.rotate_left(rotate % len);
        if reverse {
            records.reverse();
        }

        let loaded = TreeStore::from_items(tree.project_id().clone(), records).unwrap();
        prop_assert_eq!(snapshot(&tree), snapshot(&loaded));
    }

    #[test]
    fn collapse_hides_exactly_the_descendants(inserts in arb_inserts(), pick in any::<usize>()) {
        let tree = build(&inserts);
        let all = ids(&tree);
        let item = &all[pick % all.len()];

        let mut expand = ExpandState::new();
        let full: Vec<WorkItemId> = visible_rows(&tree, &expand).into_iter().map(|r| r.id).collect();
        prop_assert_eq!(&full, &all);

        expand.collapse(item.clone());
        let hidden: HashSet<WorkItemId> = tree.descendants(item).unwrap().into_iter().collect();
        let collapsed: Vec<WorkItemId> = visible_rows(&tree, &expand).into_iter().map(|r| r.id).collect();
        let expected: Vec<WorkItemId> = full.iter().filter(|id| !hidden.contains(*id)).cloned().collect();
        prop_assert_eq!(&collapsed, &expected);

        expand.expand(item.clone());
        let restored: Vec<WorkItemId> = visible_rows(&tree, &expand).into_iter().map(|r| r.id).collect();
        prop_assert_eq!(restored, full);
    }
}
