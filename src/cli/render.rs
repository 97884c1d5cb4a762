//! ASCII rendering for work breakdown trees and timelines.

use std::collections::HashMap;

use crate::domain::timeline::{Bar, Timeline};
use crate::domain::{ItemStatus, TreeStore, WorkItemId};

const NOT_STARTED: char = '○';
const PAUSED: char = '◌';
const IN_PROGRESS: char = '◐';
const COMPLETED: char = '●';

const NAME_WIDTH: usize = 28;

/// Get the status symbol for an item status.
fn status_symbol(status: ItemStatus) -> char {
    match status {
        ItemStatus::NotStarted => NOT_STARTED,
        ItemStatus::Paused => PAUSED,
        ItemStatus::InProgress => IN_PROGRESS,
        ItemStatus::Completed => COMPLETED,
    }
}

struct TreeRenderer<'a> {
    tree: &'a TreeStore,
    progress: &'a HashMap<WorkItemId, f64>,
}

/// Render a work breakdown as ASCII art with status symbols and progress.
///
/// Example output:
/// ```text
/// ○ Design [62%] w-1a2b3c4
/// ├── ● Wireframes [100%] w-5d6e7f8
/// └── ○ Review [25%] w-9a8b7c6
///     └── ◌ Sign-off [25%] w-3f2e1d0
/// ```
pub fn render_tree(tree: &TreeStore, progress: &HashMap<WorkItemId, f64>) -> String {
    let renderer = TreeRenderer { tree, progress };
    let mut output = String::new();
    for root in tree.child_ids(None) {
        renderer.render_node(&mut output, root, "", true, true);
    }
    output
}

impl TreeRenderer<'_> {
    /// Render a node and its children. Depth is capped, so recursion is shallow.
    fn render_node(
        &self,
        output: &mut String,
        id: &WorkItemId,
        prefix: &str,
        is_last: bool,
        is_root: bool,
    ) {
        let Some(item) = self.tree.get(id) else {
            return;
        };
        let percent = self.progress.get(id).copied().unwrap_or(0.0);

        if !is_root {
            output.push_str(prefix);
            output.push_str(if is_last { "└── " } else { "├── " });
        }
        output.push(status_symbol(item.status));
        output.push_str(&format!(" {} [{:.0}%] {}\n", item.name, percent, item.id));

        let child_prefix = if is_root {
            String::new()
        } else {
            let continuation = if is_last { "    " } else { "│   " };
            format!("{}{}", prefix, continuation)
        };

        let children = self.tree.child_ids(Some(id));
        for (i, child) in children.iter().enumerate() {
            let child_is_last = i == children.len() - 1;
            self.render_node(output, child, &child_prefix, child_is_last, false);
        }
    }
}

/// Columns of `bar` clipped to the scale
fn covered(bar: &Bar, days: usize) -> std::ops::Range<usize> {
    let start = bar.start_column.clamp(0, days as i64) as usize;
    let end = (bar.start_column + bar.columns).clamp(0, days as i64) as usize;
    start..end
}

/// Render a timeline as one text line per visible row.
///
/// `#` marks actual work, `=` planned work, `|` today and `·` weekends.
/// ```text
/// Timeline 2024-02-01 .. 2024-03-02 (31 days)
///                                   Feb 2024                     Mar 2024
/// Kickoff                          ===··    |
/// ```
pub fn render_timeline(timeline: &Timeline) -> String {
    let days = timeline.columns.len();
    let mut output = format!(
        "Timeline {} .. {} ({} days)\n",
        timeline.range.start, timeline.range.end, days
    );

    let mut header = vec![' '; days];
    for span in &timeline.months {
        let label = chrono::NaiveDate::from_ymd_opt(span.year, span.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_default();
        for (offset, ch) in label.chars().take(span.columns).enumerate() {
            if let Some(cell) = header.get_mut(span.start_column + offset) {
                *cell = ch;
            }
        }
    }
    output.push_str(&format!("{:width$}  ", "", width = NAME_WIDTH));
    output.extend(header.iter());
    output.push('\n');

    let background: Vec<char> = timeline
        .columns
        .iter()
        .map(|c| {
            if c.is_today {
                '|'
            } else if c.is_weekend {
                '·'
            } else {
                ' '
            }
        })
        .collect();

    for row in &timeline.rows {
        let mut cells = background.clone();
        if let Some(bar) = &row.planned {
            for cell in &mut cells[covered(bar, days)] {
                *cell = '=';
            }
        }
        if let Some(bar) = &row.actual {
            for cell in &mut cells[covered(bar, days)] {
                *cell = '#';
            }
        }

        let marker = match (row.row.has_children, row.row.expanded) {
            (false, _) => ' ',
            (true, true) => '▾',
            (true, false) => '▸',
        };
        let label = format!(
            "{}{} {}",
            "  ".repeat(row.row.indent as usize),
            marker,
            row.row.name
        );
        let label: String = label.chars().take(NAME_WIDTH).collect();
        let padding = NAME_WIDTH.saturating_sub(label.chars().count());

        output.push_str(&label);
        output.push_str(&" ".repeat(padding + 2));
        output.push_str(cells.iter().collect::<String>().trim_end());
        output.push('\n');
    }

    output
}
