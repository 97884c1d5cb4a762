//! Registry of project trees
//!
//! Work item IDs are globally unique, so a move can be addressed by item ID
//! alone. The portfolio finds the owning tree and refuses moves that would
//! cross a project boundary.

use std::collections::BTreeMap;

use super::id::{ProjectId, WorkItemId};
use super::moves::{self, MoveOutcome, ParentCandidate};
use super::tree::{TreeError, TreeStore};

#[derive(Debug, Default)]
pub struct Portfolio {
    projects: BTreeMap<ProjectId, TreeStore>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project tree, replacing any tree with the same project ID
    pub fn add_project(&mut self, store: TreeStore) -> Option<TreeStore> {
        self.projects.insert(store.project_id().clone(), store)
    }

    /// Unregisters a project and hands its tree back
    pub fn remove_project(&mut self, id: &ProjectId) -> Result<TreeStore, TreeError> {
        self.projects
            .remove(id)
            .ok_or_else(|| TreeError::ProjectNotFound(id.clone()))
    }

    pub fn project(&self, id: &ProjectId) -> Result<&TreeStore, TreeError> {
        self.projects
            .get(id)
            .ok_or_else(|| TreeError::ProjectNotFound(id.clone()))
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Result<&mut TreeStore, TreeError> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| TreeError::ProjectNotFound(id.clone()))
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.keys()
    }

    /// Finds the project that owns an item
    pub fn project_of(&self, item: &WorkItemId) -> Result<&ProjectId, TreeError> {
        self.projects
            .iter()
            .find(|(_, store)| store.contains(item))
            .map(|(id, _)| id)
            .ok_or_else(|| TreeError::NotFound(item.clone()))
    }

    /// Moves an item within its own project
    pub fn move_item(
        &mut self,
        item_id: &WorkItemId,
        new_parent_id: Option<&WorkItemId>,
    ) -> Result<MoveOutcome, TreeError> {
        let owner = self.project_of(item_id)?.clone();

        if let Some(parent_id) = new_parent_id {
            let target = self.project_of(parent_id)?;
            if *target != owner {
                return Err(TreeError::ProjectMismatch {
                    item: parent_id.clone(),
                    expected: owner,
                    actual: target.clone(),
                });
            }
        }

        moves::move_item(self.project_mut(&owner)?, item_id, new_parent_id)
    }

    /// Candidate parents for `exclude` inside `project_id`
    pub fn potential_parents(
        &self,
        project_id: &ProjectId,
        exclude: &WorkItemId,
    ) -> Result<Vec<ParentCandidate>, TreeError> {
        moves::potential_parents(self.project(project_id)?, exclude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn two_projects() -> (Portfolio, ProjectId, ProjectId, WorkItemId, WorkItemId) {
        let alpha = ProjectId::new("Alpha", Utc::now());
        let beta = ProjectId::new("Beta", Utc::now());

        let mut a = TreeStore::new(alpha.clone());
        let a_root = a.insert_root("Alpha root");
        let mut b = TreeStore::new(beta.clone());
        let b_root = b.insert_root("Beta root");

        let mut portfolio = Portfolio::new();
        portfolio.add_project(a);
        portfolio.add_project(b);
        (portfolio, alpha, beta, a_root, b_root)
    }

    #[test]
    fn finds_owning_project() {
        let (portfolio, alpha, beta, a_root, b_root) = two_projects();
        assert_eq!(portfolio.project_of(&a_root).unwrap(), &alpha);
        assert_eq!(portfolio.project_of(&b_root).unwrap(), &beta);
        assert_eq!(portfolio.project_ids().count(), 2);
    }

    #[test]
    fn cross_project_move_is_rejected() {
        let (mut portfolio, alpha, beta, a_root, b_root) = two_projects();

        let result = portfolio.move_item(&a_root, Some(&b_root));
        assert_eq!(
            result,
            Err(TreeError::ProjectMismatch {
                item: b_root.clone(),
                expected: alpha.clone(),
                actual: beta.clone()
            })
        );
        assert!(portfolio.project(&alpha).unwrap().contains(&a_root));
        assert!(portfolio.project(&beta).unwrap().children(&b_root).unwrap().is_empty());
    }

    #[test]
    fn same_project_move_is_routed() {
        let (mut portfolio, alpha, _, a_root, _) = two_projects();
        let child = portfolio
            .project_mut(&alpha)
            .unwrap()
            .insert_root("Second root");

        let outcome = portfolio.move_item(&child, Some(&a_root)).unwrap();
        assert_eq!(outcome.new_parent_id, Some(a_root.clone()));
        assert_eq!(portfolio.project(&alpha).unwrap().get(&child).unwrap().level, 2);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let (mut portfolio, _, _, a_root, _) = two_projects();
        let ghost = WorkItemId::new("ghost", Utc::now());
        let missing = ProjectId::new("Missing", Utc::now());

        assert_eq!(
            portfolio.move_item(&ghost, None),
            Err(TreeError::NotFound(ghost.clone()))
        );
        assert_eq!(
            portfolio.move_item(&a_root, Some(&ghost)),
            Err(TreeError::NotFound(ghost.clone()))
        );
        assert!(matches!(
            portfolio.potential_parents(&missing, &a_root),
            Err(TreeError::ProjectNotFound(_))
        ));
        assert!(matches!(
            portfolio.remove_project(&missing),
            Err(TreeError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn potential_parents_stay_inside_project() {
        let (portfolio, alpha, _, a_root, _) = two_projects();
        let candidates = portfolio.potential_parents(&alpha, &a_root).unwrap();
        assert!(candidates.is_empty());
    }
}
