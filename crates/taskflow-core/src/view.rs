use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum StatusFilter {
  #[default]
  All,
  Active,
  Completed
}

impl StatusFilter {
  pub fn admits(
    self,
    task: &Task
  ) -> bool {
    match self {
      | StatusFilter::All => true,
      | StatusFilter::Active => {
        !task.completed
      }
      | StatusFilter::Completed => {
        task.completed
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | StatusFilter::All => "all",
      | StatusFilter::Active => "active",
      | StatusFilter::Completed => {
        "completed"
      }
    }
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StatusFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(StatusFilter::All),
      | "active" | "pending" | "open" => {
        Ok(StatusFilter::Active)
      }
      | "completed" | "done" => {
        Ok(StatusFilter::Completed)
      }
      | other => Err(anyhow!(
        "invalid filter: {other} \
         (expected all, active or \
         completed)"
      ))
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum SortBy {
  #[default]
  Priority,
  DueDate
}

impl SortBy {
  pub fn as_str(self) -> &'static str {
    match self {
      | SortBy::Priority => "priority",
      | SortBy::DueDate => "due-date"
    }
  }
}

impl fmt::Display for SortBy {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortBy {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "priority" => {
        Ok(SortBy::Priority)
      }
      | "due-date" | "duedate"
      | "due_date" | "due" => {
        Ok(SortBy::DueDate)
      }
      | other => Err(anyhow!(
        "invalid sort: {other} \
         (expected priority or \
         due-date)"
      ))
    }
  }
}

/// Everything the displayed list depends on besides the tasks.
#[derive(
  Debug, Clone, Default, PartialEq, Eq,
)]
pub struct ViewQuery {
  pub filter:  StatusFilter,
  pub search:  String,
  pub sort_by: SortBy
}

/// Case-insensitive substring test. The
/// empty needle matches every task.
pub fn matches_search(
  task: &Task,
  search: &str
) -> bool {
  contains_folded(
    &task.text,
    &search.to_lowercase()
  )
}

fn contains_folded(
  text: &str,
  needle: &str
) -> bool {
  needle.is_empty()
    || text
      .to_lowercase()
      .contains(needle)
}

pub fn compare_for_sort(
  a: &Task,
  b: &Task,
  sort_by: SortBy
) -> Ordering {
  match sort_by {
    | SortBy::Priority => {
      a.priority
        .index()
        .cmp(&b.priority.index())
    }
    | SortBy::DueDate => {
      cmp_optional(
        a.due_date.as_ref(),
        b.due_date.as_ref()
      )
    }
  }
}

/// Filter, then search, then stable
/// sort. The input slice is left as is.
#[tracing::instrument(skip(
  tasks, query
))]
pub fn visible_tasks(
  tasks: &[Task],
  query: &ViewQuery
) -> Vec<Task> {
  let needle =
    query.search.to_lowercase();

  let mut rows: Vec<Task> = tasks
    .iter()
    .filter(|task| {
      query.filter.admits(task)
    })
    .filter(|task| {
      contains_folded(
        &task.text, &needle
      )
    })
    .cloned()
    .collect();

  rows.sort_by(|a, b| {
    compare_for_sort(
      a,
      b,
      query.sort_by
    )
  });

  trace!(
    total = tasks.len(),
    visible = rows.len(),
    filter = %query.filter,
    sort = %query.sort_by,
    "computed visible tasks"
  );
  rows
}

// Present values first; two absent
// values compare equal so the stable
// sort keeps their relative order.
fn cmp_optional<T: Ord>(
  left: Option<&T>,
  right: Option<&T>
) -> Ordering {
  match (left, right) {
    | (Some(a), Some(b)) => a.cmp(b),
    | (Some(_), None) => Ordering::Less,
    | (None, Some(_)) => {
      Ordering::Greater
    }
    | (None, None) => Ordering::Equal
  }
}
