use crate::{
    storage::{
        entities::{NewWork, Project, Work},
        store::Store,
    },
    utils::{
        clock::Clock,
        time::{local_time_today, parse_time_of_day},
    },
};

use super::error::TrackerError;

/// Result of [SessionController::start].
#[derive(Debug)]
pub struct Started {
    /// Work that was in progress and got stopped to make room for the new one.
    pub stopped: Option<Work>,
    pub started: Work,
    pub created_project: bool,
}

/// Result of [SessionController::log].
#[derive(Debug)]
pub struct Logged {
    pub work: Work,
    pub created_project: bool,
}

/// Result of [SessionController::drop_project].
#[derive(Debug)]
pub struct Dropped {
    pub project: Project,
    pub removed_work: usize,
}

/// Owns the idle/active state of tracking. There is no stored state: the tracker is active
/// exactly when the store holds an open work interval.
///
/// Every mutating operation runs as one unit of work on the store.
pub struct SessionController<'a, S: Store> {
    store: &'a mut S,
    clock: &'a dyn Clock,
}

impl<'a, S: Store> SessionController<'a, S> {
    pub fn new(store: &'a mut S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &*self.store
    }

    /// Work that is currently in progress.
    pub fn current(&self) -> Result<Option<Work>, TrackerError> {
        Ok(self.store.find_open_work()?)
    }

    /// The most recently started work that has been finished.
    pub fn last_closed(&self) -> Result<Option<Work>, TrackerError> {
        Ok(self.store.find_last_closed_work()?)
    }

    pub fn projects(&self) -> Result<Vec<Project>, TrackerError> {
        Ok(self.store.list_projects()?)
    }

    /// Starts work on `project`, stopping whatever is in progress first. Without a project name
    /// the project of the last finished work is continued.
    pub fn start(&mut self, project: Option<&str>, comment: &str) -> Result<Started, TrackerError> {
        let now = self.clock.time();
        self.store.atomically(|store| {
            let stopped = match store.find_open_work()? {
                Some(open) => Some(store.update_work_stop(&open, now)?),
                None => None,
            };

            let (project, created_project) = match project {
                Some(name) => store.find_or_create_project(name)?,
                None => store
                    .find_last_closed_work()?
                    .map(|work| (work.project, false))
                    .ok_or(TrackerError::ProjectResolutionFailed)?,
            };

            let started = store.create_work(NewWork {
                project: &project,
                comment,
                start: Some(now),
                stop: None,
            })?;

            Ok(Started {
                stopped,
                started,
                created_project,
            })
        })
    }

    /// Finishes the work in progress.
    pub fn stop(&mut self) -> Result<Work, TrackerError> {
        let now = self.clock.time();
        self.store.atomically(|store| {
            let open = store
                .find_open_work()?
                .ok_or(TrackerError::NoActiveSession)?;
            Ok(store.update_work_stop(&open, now)?)
        })
    }

    /// Throws away the work in progress. Nothing of it is kept.
    pub fn cancel(&mut self) -> Result<Work, TrackerError> {
        self.store.atomically(|store| {
            let open = store
                .find_open_work()?
                .ok_or(TrackerError::NoActiveSession)?;
            store.delete_work(&open)?;
            Ok(open)
        })
    }

    /// Records finished work after the fact. `start` and `stop` are local times of day on the
    /// current date. Work in progress is left alone.
    pub fn log(
        &mut self,
        project: &str,
        start: &str,
        stop: &str,
        comment: &str,
    ) -> Result<Logged, TrackerError> {
        let now = self.clock.time();
        let offset = self.clock.offset();
        let to_utc = |value: &str| {
            parse_time_of_day(value)
                .and_then(|time| local_time_today(now, offset, time))
                .ok_or_else(|| {
                    TrackerError::invalid_log(format!(
                        "Can't read \"{value}\" as a time of day, expected HH:MM."
                    ))
                })
        };
        let start = to_utc(start)?;
        let stop = to_utc(stop)?;
        if stop < start {
            return Err(TrackerError::invalid_log(
                "The stop time is earlier than the start time.",
            ));
        }

        self.store.atomically(|store| {
            let (project, created_project) = store.find_or_create_project(project)?;
            let work = store.create_work(NewWork {
                project: &project,
                comment,
                start: Some(start),
                stop: Some(stop),
            })?;
            Ok(Logged {
                work,
                created_project,
            })
        })
    }

    /// Removes a project and all of the work recorded on it.
    pub fn drop_project(&mut self, name: &str) -> Result<Dropped, TrackerError> {
        self.store.atomically(|store| {
            let project = store
                .find_project_by_name(name)?
                .ok_or_else(|| TrackerError::ProjectNotFound(name.to_owned()))?;
            let removed_work = store.delete_project(&project)?;
            Ok(Dropped {
                project,
                removed_work,
            })
        })
    }
}
