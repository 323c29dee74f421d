use chrono::{DateTime, Utc};

use super::{
    entities::{NewWork, Project, ProjectId, Work, WorkFilter},
    error::StoreError,
};

/// Interface for abstracting storage of projects and their work intervals.
///
/// Every mutating call is committed on return unless it runs inside [Store::atomically].
pub trait Store {
    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError>;

    fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;

    /// Fails with [StoreError::DuplicateName] when the name is taken.
    fn create_project(&mut self, name: &str) -> Result<Project, StoreError>;

    /// Looks a project up by name and creates it when missing, as one atomic step.
    /// The flag tells whether the project was created by this call.
    fn find_or_create_project(&mut self, name: &str) -> Result<(Project, bool), StoreError>;

    /// Removes a project together with all of its work. Returns the number of work rows removed.
    fn delete_project(&mut self, project: &Project) -> Result<usize, StoreError>;

    /// Projects in storage order.
    fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    /// The single work interval without a stop instant, if any.
    fn find_open_work(&self) -> Result<Option<Work>, StoreError>;

    /// The closed interval with the latest start. Equal starts resolve to the newest row.
    fn find_last_closed_work(&self) -> Result<Option<Work>, StoreError>;

    /// Closed intervals matching `filter`, latest start first.
    fn query_closed_work(&self, filter: WorkFilter) -> Result<Vec<Work>, StoreError>;

    fn create_work(&mut self, work: NewWork<'_>) -> Result<Work, StoreError>;

    fn update_work_stop(&mut self, work: &Work, stop: DateTime<Utc>) -> Result<Work, StoreError>;

    fn delete_work(&mut self, work: &Work) -> Result<(), StoreError>;

    /// Runs `operation` as a single unit of work. Nothing it changed survives when it fails.
    fn atomically<T, E>(
        &mut self,
        operation: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        Self: Sized,
        E: From<StoreError>;
}
