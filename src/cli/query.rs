//! Query commands (tree, progress, timeline)

use anyhow::Result;
use chrono::{Local, NaiveDate};

use super::output::Output;
use super::render;
use crate::domain::progress;
use crate::domain::timeline::{self, ExpandState};
use crate::domain::WorkItemId;
use crate::storage::Project;

/// Show the work breakdown as a tree
pub fn tree(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let tree = project.load_tree()?;
    let values = progress::progress_all(&tree);

    if output.is_json() {
        let items: Vec<_> = tree
            .items()
            .into_iter()
            .map(|item| {
                serde_json::json!({
                    "id": item.id,
                    "parent_id": item.parent_id,
                    "name": item.name,
                    "level": item.level,
                    "position": item.position,
                    "status": item.status,
                    "progress": values.get(&item.id).copied().unwrap_or(0.0),
                })
            })
            .collect();
        output.data(&items)?;
    } else if tree.is_empty() {
        println!("No work items yet. Add one with 'wbs item add <NAME>'.");
    } else {
        println!("{} ({})", project.name(), project.id());
        print!("{}", render::render_tree(&tree, &values));
    }

    Ok(())
}

/// Show progress of one item or of every item
pub fn progress(output: &Output, id: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let tree = project.load_tree()?;

    if let Some(id) = id {
        let id: WorkItemId = id.parse()?;
        let item = tree.require(&id)?;
        let value = progress::progress(&tree, &id);

        if output.is_json() {
            output.data(&serde_json::json!({ "id": id, "progress": value }))?;
        } else {
            println!("{} {}: {:.1}%", item.id, item.name, value);
        }
        return Ok(());
    }

    let values = progress::progress_all(&tree);
    let roots = tree.roots();
    let overall = if roots.is_empty() {
        0.0
    } else {
        roots
            .iter()
            .map(|r| values.get(&r.id).copied().unwrap_or(0.0))
            .sum::<f64>()
            / roots.len() as f64
    };

    if output.is_json() {
        let items: Vec<_> = tree
            .items()
            .into_iter()
            .map(|item| {
                serde_json::json!({
                    "id": item.id,
                    "progress": values.get(&item.id).copied().unwrap_or(0.0),
                })
            })
            .collect();
        output.data(&serde_json::json!({ "overall": overall, "items": items }))?;
    } else {
        println!("{:<12} {:>7}  NAME", "ID", "DONE");
        println!("{}", "-".repeat(60));
        for item in tree.items() {
            let value = values.get(&item.id).copied().unwrap_or(0.0);
            println!(
                "{:<12} {:>6.1}%  {}{}",
                item.id,
                value,
                "  ".repeat(item.level as usize - 1),
                item.name
            );
        }
        println!("{}", "-".repeat(60));
        println!("{:<12} {:>6.1}%", "overall", overall);
    }

    Ok(())
}

/// Show the timeline layout
pub fn timeline(output: &Output, collapse: &[String], today: Option<NaiveDate>) -> Result<()> {
    let project = Project::open_current()?;
    let tree = project.load_tree()?;
    let options = project.timeline_options()?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let mut expand = ExpandState::new();
    for id in collapse {
        let id: WorkItemId = id.parse()?;
        tree.require(&id)?;
        expand.collapse(id);
    }

    let layout = timeline::layout(&tree, &expand, today, &options);
    tracing::debug!(
        rows = layout.rows.len(),
        days = layout.columns.len(),
        "computed timeline layout"
    );

    if output.is_json() {
        output.data(&layout)?;
    } else {
        print!("{}", render::render_timeline(&layout));
    }

    Ok(())
}
