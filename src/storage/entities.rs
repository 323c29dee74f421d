use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Identifier of a [Project]. Assigned by the storage and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(i64);

impl ProjectId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a [Work] interval. Grows monotonically with insertion order, which makes it
/// usable as a tie-break between intervals that started at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WorkId(i64);

impl WorkId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

/// A single tracked interval. `stop == None` means the work is still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Work {
    pub id: WorkId,
    pub project: Project,
    pub comment: String,
    pub start: DateTime<Utc>,
    pub stop: Option<DateTime<Utc>>,
}

impl Work {
    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    /// Length of a closed interval. Open intervals have no duration yet.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.stop.map(|stop| stop - self.start)
    }

    /// Time spent so far: the full duration when closed, otherwise the time passed until `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        self.stop.unwrap_or(now) - self.start
    }
}

/// Values needed to insert a new [Work] row. A missing `start` is filled in by the storage
/// clock.
#[derive(Debug, Clone)]
pub struct NewWork<'a> {
    pub project: &'a Project,
    pub comment: &'a str,
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

/// Restricts which closed intervals [Store::query_closed_work](super::store::Store::query_closed_work)
/// returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkFilter {
    pub project: Option<ProjectId>,
    /// Only intervals whose start is strictly after this instant.
    pub started_after: Option<DateTime<Utc>>,
}

impl WorkFilter {
    pub fn for_project(self, project: ProjectId) -> Self {
        Self {
            project: Some(project),
            ..self
        }
    }

    pub fn started_after(self, bound: Option<DateTime<Utc>>) -> Self {
        Self {
            started_after: bound,
            ..self
        }
    }
}
