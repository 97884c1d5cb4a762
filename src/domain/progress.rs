//! Status-driven progress rollup
//!
//! Progress is derived, never stored. Each call recomputes from the current
//! tree, so after a mutation a caller refreshes the changed item and its
//! ancestors (see [`rollup_path`]).
//!
//! For a tree like:
//! ```text
//! Design (not_started)
//!   ├── Wireframes (completed)      100
//!   └── Review (not_started)
//!         └── Sign-off (paused)      25
//! ```
//! `Review` is `max(0, 25) = 25` and `Design` is `max(0, (100 + 25) / 2) = 62.5`.
//! Children are averaged without regard to subtree size.

use std::collections::HashMap;

use super::id::WorkItemId;
use super::item::ItemStatus;
use super::tree::TreeStore;

/// Progress of an item and its whole subtree, in percent (`0.0..=100.0`).
///
/// Returns `0.0` for an ID the tree does not contain.
pub fn progress(store: &TreeStore, id: &WorkItemId) -> f64 {
    if !store.contains(id) {
        return 0.0;
    }
    rollup(store, std::slice::from_ref(id))
        .get(id)
        .copied()
        .unwrap_or(0.0)
}

/// Progress of every item in the tree, computed in a single pass
pub fn progress_all(store: &TreeStore) -> HashMap<WorkItemId, f64> {
    rollup(store, store.child_ids(None))
}

/// Progress of `id` followed by each of its ancestors up to the root.
///
/// These are exactly the values that change when `id` is mutated. Empty for
/// an unknown ID.
pub fn rollup_path(store: &TreeStore, id: &WorkItemId) -> Vec<(WorkItemId, f64)> {
    let Ok(ancestors) = store.ancestors(id) else {
        return Vec::new();
    };
    let chain: Vec<WorkItemId> = std::iter::once(id.clone())
        .chain(ancestors.map(|a| a.id.clone()))
        .collect();

    // The top of the chain covers every value on the path.
    let top = chain.last().cloned().unwrap_or_else(|| id.clone());
    let values = rollup(store, std::slice::from_ref(&top));

    chain
        .into_iter()
        .map(|item| {
            let value = values.get(&item).copied().unwrap_or(0.0);
            (item, value)
        })
        .collect()
}

/// Combines an item's own status with its children's progress
fn combine(status: ItemStatus, children: &[f64]) -> f64 {
    let own = f64::from(status.progress_weight());
    if children.is_empty() {
        return own;
    }
    let average = children.iter().sum::<f64>() / children.len() as f64;
    own.max(average)
}

/// Post-order rollup of the subtrees under `tops`, using an explicit stack
fn rollup(store: &TreeStore, tops: &[WorkItemId]) -> HashMap<WorkItemId, f64> {
    let mut values: HashMap<WorkItemId, f64> = HashMap::new();
    // (id, children already pushed)
    let mut stack: Vec<(&WorkItemId, bool)> = tops.iter().map(|id| (id, false)).collect();

    while let Some((id, expanded)) = stack.pop() {
        let children = store.child_ids(Some(id));

        if !expanded && !children.is_empty() {
            stack.push((id, true));
            stack.extend(children.iter().map(|child| (child, false)));
            continue;
        }

        let Some(item) = store.get(id) else {
            continue;
        };
        let child_values: Vec<f64> = children
            .iter()
            .map(|child| values.get(child).copied().unwrap_or(0.0))
            .collect();
        values.insert(id.clone(), combine(item.status, &child_values));
    }

    values
}
