//! Timeline (Gantt) layout
//!
//! Turns a tree plus caller-owned expand/collapse state into rows, a day
//! scale and bar geometry. Layout is a pure function of the tree, the expand
//! state, the reference date and the options; nothing here reads the clock.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use super::id::WorkItemId;
use super::item::{ItemStatus, WorkItem};
use super::tree::TreeStore;

/// Geometry settings for a timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineOptions {
    /// Width of one day column, in rendering units
    pub column_width: f64,
    /// Minimum number of days between the first and last date of the scale
    pub min_span_days: i64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            column_width: 30.0,
            min_span_days: 30,
        }
    }
}

/// Per-item expand/collapse flags. Items without a flag are expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    flags: HashMap<WorkItemId, bool>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &WorkItemId) -> bool {
        self.flags.get(id).copied().unwrap_or(true)
    }

    pub fn set(&mut self, id: WorkItemId, expanded: bool) {
        self.flags.insert(id, expanded);
    }

    pub fn collapse(&mut self, id: WorkItemId) {
        self.set(id, false);
    }

    pub fn expand(&mut self, id: WorkItemId) {
        self.set(id, true);
    }

    /// Flips the flag and returns the new value
    pub fn toggle(&mut self, id: &WorkItemId) -> bool {
        let expanded = !self.is_expanded(id);
        self.flags.insert(id.clone(), expanded);
        expanded
    }
}

/// Inclusive range of days covered by the scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of day columns, endpoints included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Column index of `date`, which may fall outside the range
    pub fn column_of(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }
}

/// One calendar day on the scale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub index: usize,
    pub is_weekend: bool,
    pub is_today: bool,
}

/// Consecutive columns that share a calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSpan {
    pub year: i32,
    pub month: u32,
    pub start_column: usize,
    pub columns: usize,
}

/// Horizontal placement of an interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    pub left: f64,
    pub width: f64,
    pub start_column: i64,
    /// Number of day columns covered, 0 for an inverted interval
    pub columns: i64,
    /// True when the end date was filled in with the reference date
    pub open_ended: bool,
}

impl Bar {
    fn between(range: &DateRange, start: NaiveDate, end: NaiveDate, options: &TimelineOptions) -> Self {
        let start_column = range.column_of(start);
        let columns = ((end - start).num_days() + 1).max(0);
        Self {
            left: start_column as f64 * options.column_width,
            width: columns as f64 * options.column_width,
            start_column,
            columns,
            open_ended: false,
        }
    }
}

/// An item that is currently shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleRow {
    pub id: WorkItemId,
    pub name: String,
    pub level: u8,
    pub indent: u8,
    pub status: ItemStatus,
    pub has_children: bool,
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    #[serde(flatten)]
    pub row: VisibleRow,
    pub planned: Option<Bar>,
    pub actual: Option<Bar>,
}

/// Complete layout for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub range: DateRange,
    pub column_width: f64,
    pub columns: Vec<DayColumn>,
    pub months: Vec<MonthSpan>,
    pub today_column: Option<usize>,
    pub rows: Vec<TimelineRow>,
}

/// Finds the scale for all items in the tree.
///
/// Starts at the earliest planned or actual start (today when there is
/// none) and ends at the latest planned or actual end (tomorrow when there
/// is none), then stretches the end to at least `min_span_days` past the
/// start.
pub fn date_range(store: &TreeStore, today: NaiveDate, options: &TimelineOptions) -> DateRange {
    let items = store.items();

    let start = items
        .iter()
        .flat_map(|item| [item.planned_start, item.actual_start])
        .flatten()
        .min()
        .unwrap_or(today);

    let mut end = items
        .iter()
        .flat_map(|item| [item.planned_end, item.actual_end])
        .flatten()
        .max()
        .unwrap_or_else(|| days_after(today, 1));

    if (end - start).num_days() < options.min_span_days {
        end = days_after(start, options.min_span_days);
    }

    DateRange { start, end }
}

/// Adds `days` to `date`, saturating at the calendar bounds
fn days_after(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// Depth-first rows from the roots, skipping children of collapsed items
pub fn visible_rows(store: &TreeStore, expand: &ExpandState) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<&WorkItemId> = store.child_ids(None).iter().rev().collect();

    while let Some(id) = stack.pop() {
        let Some(item) = store.get(id) else {
            continue;
        };
        let children = store.child_ids(Some(id));
        let expanded = expand.is_expanded(id);

        rows.push(VisibleRow {
            id: id.clone(),
            name: item.name.clone(),
            level: item.level,
            indent: item.level.saturating_sub(1),
            status: item.status,
            has_children: !children.is_empty(),
            expanded,
        });

        if expanded {
            stack.extend(children.iter().rev());
        }
    }

    rows
}

fn planned_bar(range: &DateRange, item: &WorkItem, options: &TimelineOptions) -> Option<Bar> {
    let (start, end) = (item.planned_start?, item.planned_end?);
    Some(Bar::between(range, start, end, options))
}

fn actual_bar(
    range: &DateRange,
    item: &WorkItem,
    today: NaiveDate,
    options: &TimelineOptions,
) -> Option<Bar> {
    let start = item.actual_start?;
    let end = item.actual_end.unwrap_or(today);
    Some(Bar {
        open_ended: item.actual_end.is_none(),
        ..Bar::between(range, start, end, options)
    })
}

fn day_columns(range: &DateRange, today: NaiveDate) -> Vec<DayColumn> {
    range
        .start
        .iter_days()
        .take(range.days().max(0) as usize)
        .enumerate()
        .map(|(index, date)| DayColumn {
            date,
            index,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            is_today: date == today,
        })
        .collect()
}

fn month_spans(columns: &[DayColumn]) -> Vec<MonthSpan> {
    let mut spans: Vec<MonthSpan> = Vec::new();
    for column in columns {
        let (year, month) = (column.date.year(), column.date.month());
        match spans.last_mut() {
            Some(span) if span.year == year && span.month == month => span.columns += 1,
            _ => spans.push(MonthSpan {
                year,
                month,
                start_column: column.index,
                columns: 1,
            }),
        }
    }
    spans
}

/// Lays out the whole timeline
pub fn layout(
    store: &TreeStore,
    expand: &ExpandState,
    today: NaiveDate,
    options: &TimelineOptions,
) -> Timeline {
    let range = date_range(store, today, options);
    let columns = day_columns(&range, today);
    let months = month_spans(&columns);
    let today_column = range
        .contains(today)
        .then(|| range.column_of(today) as usize);

    let rows = visible_rows(store, expand)
        .into_iter()
        .filter_map(|row| {
            let item = store.get(&row.id)?;
            Some(TimelineRow {
                planned: planned_bar(&range, item, options),
                actual: actual_bar(&range, item, today, options),
                row,
            })
        })
        .collect();

    Timeline {
        range,
        column_width: options.column_width,
        columns,
        months,
        today_column,
        rows,
    }
}
