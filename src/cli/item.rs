//! Work item CLI commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::output::Output;
use crate::domain::{moves, progress, ItemStatus, TreeStore, WorkItemId};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add a work item at the root or under a parent
    ///
    /// Examples:
    ///   wbs item add "Design"                    # Root item
    ///   wbs item add "Wireframes" --parent w-1a2b3c4
    Add {
        /// Item name
        name: String,

        /// Parent item ID (omit for a root item)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Rename a work item
    Rename {
        /// Work item ID
        id: String,

        /// New name
        name: String,
    },

    /// Set or clear a work item's description
    Describe {
        /// Work item ID
        id: String,

        /// Description text (omit to clear)
        text: Option<String>,
    },

    /// Set a work item's status
    ///
    /// One of: not_started, in_progress, paused, completed
    Status {
        /// Work item ID
        id: String,

        /// New status
        status: String,
    },

    /// Set planned and actual dates (YYYY-MM-DD)
    Dates {
        /// Work item ID
        id: String,

        #[arg(long)]
        planned_start: Option<NaiveDate>,

        #[arg(long)]
        planned_end: Option<NaiveDate>,

        #[arg(long)]
        actual_start: Option<NaiveDate>,

        #[arg(long)]
        actual_end: Option<NaiveDate>,

        /// Clear both planned dates
        #[arg(long, conflicts_with_all = ["planned_start", "planned_end"])]
        clear_planned: bool,

        /// Clear both actual dates
        #[arg(long, conflicts_with_all = ["actual_start", "actual_end"])]
        clear_actual: bool,
    },

    /// Remove a work item and everything below it
    Rm {
        /// Work item ID
        id: String,
    },

    /// Move a work item (with its subtree) under another parent
    Mv {
        /// Work item ID
        id: String,

        /// New parent ID
        #[arg(long, required_unless_present = "root", conflicts_with = "root")]
        parent: Option<String>,

        /// Move to the top level
        #[arg(long)]
        root: bool,
    },

    /// List items this item could be moved under
    Parents {
        /// Work item ID
        id: String,
    },

    /// Show work item details
    Show {
        /// Work item ID
        id: String,
    },
}

/// New planned/actual dates requested on the command line
struct DateEdit {
    planned_start: Option<NaiveDate>,
    planned_end: Option<NaiveDate>,
    actual_start: Option<NaiveDate>,
    actual_end: Option<NaiveDate>,
    clear_planned: bool,
    clear_actual: bool,
}

pub fn run(cmd: ItemCommands, output: &Output) -> Result<()> {
    match cmd {
        ItemCommands::Add { name, parent } => add_item(output, &name, parent.as_deref()),
        ItemCommands::Rename { id, name } => rename_item(output, &id, &name),
        ItemCommands::Describe { id, text } => describe_item(output, &id, text),
        ItemCommands::Status { id, status } => set_status(output, &id, &status),
        ItemCommands::Dates {
            id,
            planned_start,
            planned_end,
            actual_start,
            actual_end,
            clear_planned,
            clear_actual,
        } => set_dates(
            output,
            &id,
            DateEdit {
                planned_start,
                planned_end,
                actual_start,
                actual_end,
                clear_planned,
                clear_actual,
            },
        ),
        ItemCommands::Rm { id } => remove_item(output, &id),
        ItemCommands::Mv { id, parent, root: _ } => move_item(output, &id, parent.as_deref()),
        ItemCommands::Parents { id } => list_parents(output, &id),
        ItemCommands::Show { id } => show_item(output, &id),
    }
}

fn parse_id(id: &str) -> Result<WorkItemId> {
    id.parse()
        .with_context(|| format!("'{}' is not a work item ID", id))
}

fn open() -> Result<(Project, TreeStore)> {
    let project = Project::open_current()?;
    let tree = project.load_tree()?;
    Ok((project, tree))
}

fn add_item(output: &Output, name: &str, parent: Option<&str>) -> Result<()> {
    let (project, mut tree) = open()?;

    let id = match parent {
        None => tree.insert_root(name),
        Some(parent) => tree.insert_child(&parse_id(parent)?, name)?,
    };
    project.save_tree(&tree)?;

    let item = tree.require(&id)?;
    tracing::info!(item = %id, level = item.level, "added work item");

    if output.is_json() {
        output.data(item)?;
    } else {
        output.success(&format!(
            "Created item: {} - {} (level {})",
            item.id, item.name, item.level
        ));
    }

    Ok(())
}

fn rename_item(output: &Output, id: &str, name: &str) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;

    tree.rename(&id, name)?;
    project.save_tree(&tree)?;

    if output.is_json() {
        output.data(tree.require(&id)?)?;
    } else {
        output.success(&format!("Renamed {} to {}", id, name));
    }

    Ok(())
}

fn describe_item(output: &Output, id: &str, text: Option<String>) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;

    let cleared = text.is_none();
    tree.describe(&id, text)?;
    project.save_tree(&tree)?;

    if output.is_json() {
        output.data(tree.require(&id)?)?;
    } else if cleared {
        output.success(&format!("Cleared description of {}", id));
    } else {
        output.success(&format!("Updated description of {}", id));
    }

    Ok(())
}

fn set_status(output: &Output, id: &str, status: &str) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;
    let status: ItemStatus = status.parse()?;

    tree.set_status(&id, status)?;
    project.save_tree(&tree)?;

    // Everything on the path to the root may have changed
    let rollup = progress::rollup_path(&tree, &id);

    if output.is_json() {
        let rollup: Vec<_> = rollup
            .iter()
            .map(|(id, value)| serde_json::json!({ "id": id, "progress": value }))
            .collect();
        output.data(&serde_json::json!({
            "id": id,
            "status": status,
            "rollup": rollup,
        }))?;
    } else {
        output.success(&format!("Set {} to {}", id, status));
        for (ancestor, value) in &rollup {
            let name = tree.get(ancestor).map(|i| i.name.as_str()).unwrap_or("");
            let ancestor = ancestor.to_string();
            let percent = format!("{:>5.1}%", value);
            output.row(&[ancestor.as_str(), percent.as_str(), name]);
        }
    }

    Ok(())
}

fn set_dates(output: &Output, id: &str, edit: DateEdit) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;
    let item = tree.require(&id)?;

    let (planned_start, planned_end) = if edit.clear_planned {
        (None, None)
    } else {
        (
            edit.planned_start.or(item.planned_start),
            edit.planned_end.or(item.planned_end),
        )
    };
    let (actual_start, actual_end) = if edit.clear_actual {
        (None, None)
    } else {
        (
            edit.actual_start.or(item.actual_start),
            edit.actual_end.or(item.actual_end),
        )
    };

    tree.set_planned_dates(&id, planned_start, planned_end)?;
    tree.set_actual_dates(&id, actual_start, actual_end)?;
    project.save_tree(&tree)?;

    let item = tree.require(&id)?;
    if output.is_json() {
        output.data(item)?;
    } else {
        output.success(&format!(
            "Dates of {}: planned {} .. {}, actual {} .. {}",
            id,
            fmt_date(item.planned_start),
            fmt_date(item.planned_end),
            fmt_date(item.actual_start),
            fmt_date(item.actual_end),
        ));
    }

    Ok(())
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn remove_item(output: &Output, id: &str) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;

    let removed = tree.remove(&id)?;
    project.save_tree(&tree)?;
    tracing::info!(item = %id, count = removed.len(), "removed work items");

    if output.is_json() {
        let ids: Vec<_> = removed.iter().map(|i| &i.id).collect();
        output.data(&serde_json::json!({ "removed": ids }))?;
    } else {
        output.success(&format!("Removed {} item(s) under {}", removed.len(), id));
    }

    Ok(())
}

fn move_item(output: &Output, id: &str, parent: Option<&str>) -> Result<()> {
    let (project, mut tree) = open()?;
    let id = parse_id(id)?;
    let parent = parent.map(parse_id).transpose()?;

    let outcome = moves::move_item(&mut tree, &id, parent.as_ref())?;
    project.save_tree(&tree)?;
    tracing::info!(item = %id, position = outcome.position, "moved work item");

    if output.is_json() {
        output.data(&outcome)?;
    } else {
        let target = outcome
            .new_parent_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "the root".to_string());
        let level = outcome.levels.first().map(|c| c.to).unwrap_or(1);
        output.success(&format!(
            "Moved {} under {} (position {}, level {}, {} item(s) relevelled)",
            id,
            target,
            outcome.position,
            level,
            outcome.levels.len()
        ));
    }

    Ok(())
}

fn list_parents(output: &Output, id: &str) -> Result<()> {
    let (_, tree) = open()?;
    let id = parse_id(id)?;

    let candidates = moves::potential_parents(&tree, &id)?;

    if output.is_json() {
        output.data(&candidates)?;
    } else if candidates.is_empty() {
        println!("No other items to move under.");
    } else {
        println!("{:<12} {:<6} PATH", "ID", "LEVEL");
        println!("{}", "-".repeat(60));
        for candidate in candidates {
            println!("{:<12} {:<6} {}", candidate.id, candidate.level, candidate.path);
        }
    }

    Ok(())
}

fn show_item(output: &Output, id: &str) -> Result<()> {
    let (_, tree) = open()?;
    let id = parse_id(id)?;

    let item = tree.require(&id)?;
    let value = progress::progress(&tree, &id);
    let path = tree.path_names(&id)?.join(" / ");
    let children: Vec<_> = tree.children(&id)?.into_iter().map(|c| &c.id).collect();

    if output.is_json() {
        let mut json = serde_json::to_value(item)?;
        if let Some(obj) = json.as_object_mut() {
            obj.insert("progress".to_string(), serde_json::json!(value));
            obj.insert("path".to_string(), serde_json::json!(path));
            obj.insert("children".to_string(), serde_json::json!(children));
        }
        output.data(&json)?;
    } else {
        println!("ID:       {}", item.id);
        println!("Name:     {}", item.name);
        println!("Path:     {}", path);
        println!("Level:    {}", item.level);
        println!("Status:   {}", item.status);
        println!("Progress: {:.1}%", value);
        if let Some(desc) = &item.description {
            println!("About:    {}", desc);
        }
        if item.planned_start.is_some() || item.planned_end.is_some() {
            println!(
                "Planned:  {} .. {}",
                fmt_date(item.planned_start),
                fmt_date(item.planned_end)
            );
        }
        if item.actual_start.is_some() || item.actual_end.is_some() {
            println!(
                "Actual:   {} .. {}",
                fmt_date(item.actual_start),
                fmt_date(item.actual_end)
            );
        }
        if !children.is_empty() {
            println!("Children:");
            for child in children {
                if let Some(c) = tree.get(child) {
                    println!("  {} {}", c.id, c.name);
                }
            }
        }
    }

    Ok(())
}
