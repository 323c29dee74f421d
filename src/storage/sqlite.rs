use std::{path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, trace, warn};

use super::{
    entities::{NewWork, Project, ProjectId, Work, WorkFilter, WorkId},
    error::StoreError,
    store::Store,
};

/// Current time in milliseconds since the epoch, as seen by SQLite.
const SQL_NOW_MS: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

const WORK_COLUMNS: &str = "w.id, w.project_id, p.name, w.comment, w.time_start_ms, w.time_stop_ms \
     FROM worklog w JOIN projects p ON p.id = w.project_id";

fn schema() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK (length(name) > 0)
        );
        CREATE TABLE IF NOT EXISTS worklog (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id),
            comment TEXT NOT NULL DEFAULT '',
            time_start_ms INTEGER NOT NULL DEFAULT ({SQL_NOW_MS}),
            time_stop_ms INTEGER,
            CHECK (time_stop_ms IS NULL OR time_stop_ms >= time_start_ms)
        );
        CREATE INDEX IF NOT EXISTS worklog_project_start ON worklog(project_id, time_start_ms);
        CREATE UNIQUE INDEX IF NOT EXISTS worklog_single_open
            ON worklog((time_stop_ms IS NULL)) WHERE time_stop_ms IS NULL;"
    )
}

/// The main realization of [Store], backed by a single SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        debug!("Opening database {path:?}");
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Creates a store that lives only as long as the returned value. Used for testing.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(&schema())?;
        Ok(Self { conn })
    }

    fn query_work(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Work>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, WorkRow::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_work()?);
        }
        Ok(out)
    }

    fn query_one_work(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Work>, StoreError> {
        self.conn
            .query_row(sql, params, WorkRow::from_row)
            .optional()?
            .map(WorkRow::into_work)
            .transpose()
    }

    #[cfg(test)]
    pub(crate) fn open_work_count(&self) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM worklog WHERE time_stop_ms IS NULL",
            [],
            |row| row.get(0),
        )?)
    }

    fn find_work(&self, id: WorkId) -> Result<Option<Work>, StoreError> {
        self.query_one_work(
            &format!("SELECT {WORK_COLUMNS} WHERE w.id = ?1"),
            params![id.as_i64()],
        )
    }
}

impl Store for SqliteStore {
    fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM projects WHERE name = ?1",
                params![name],
                project_from_row,
            )
            .optional()?)
    }

    fn find_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM projects WHERE id = ?1",
                params![id.as_i64()],
                project_from_row,
            )
            .optional()?)
    }

    fn create_project(&mut self, name: &str) -> Result<Project, StoreError> {
        if name.is_empty() {
            return Err(StoreError::InvalidInput("project name must not be empty"));
        }
        self.conn
            .execute("INSERT INTO projects(name) VALUES (?1)", params![name])
            .map_err(|err| map_name_conflict(err, name))?;
        let id = ProjectId::new(self.conn.last_insert_rowid());
        debug!("Created project {name:?} with id {id}");
        Ok(Project {
            id,
            name: name.to_owned(),
        })
    }

    fn find_or_create_project(&mut self, name: &str) -> Result<(Project, bool), StoreError> {
        self.atomically(|store| match store.find_project_by_name(name)? {
            Some(project) => Ok((project, false)),
            None => Ok((store.create_project(name)?, true)),
        })
    }

    fn delete_project(&mut self, project: &Project) -> Result<usize, StoreError> {
        self.atomically(|store| {
            let removed = store.conn.execute(
                "DELETE FROM worklog WHERE project_id = ?1",
                params![project.id.as_i64()],
            )?;
            store
                .conn
                .execute("DELETE FROM projects WHERE id = ?1", params![project.id.as_i64()])?;
            debug!("Deleted project {:?} and {removed} work rows", project.name);
            Ok(removed)
        })
    }

    fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM projects ORDER BY id ASC")?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn find_open_work(&self) -> Result<Option<Work>, StoreError> {
        self.query_one_work(
            &format!("SELECT {WORK_COLUMNS} WHERE w.time_stop_ms IS NULL ORDER BY w.id DESC LIMIT 1"),
            [],
        )
    }

    fn find_last_closed_work(&self) -> Result<Option<Work>, StoreError> {
        self.query_one_work(
            &format!(
                "SELECT {WORK_COLUMNS} WHERE w.time_stop_ms IS NOT NULL \
                 ORDER BY w.time_start_ms DESC, w.id DESC LIMIT 1"
            ),
            [],
        )
    }

    fn query_closed_work(&self, filter: WorkFilter) -> Result<Vec<Work>, StoreError> {
        trace!("Querying closed work {filter:?}");
        self.query_work(
            &format!(
                "SELECT {WORK_COLUMNS} WHERE w.time_stop_ms IS NOT NULL \
                 AND (?1 IS NULL OR w.project_id = ?1) \
                 AND (?2 IS NULL OR w.time_start_ms > ?2) \
                 ORDER BY w.time_start_ms DESC, w.id DESC"
            ),
            params![
                filter.project.map(|p| p.as_i64()),
                filter.started_after.map(|t| t.timestamp_millis()),
            ],
        )
    }

    fn create_work(&mut self, work: NewWork<'_>) -> Result<Work, StoreError> {
        self.conn.execute(
            &format!(
                "INSERT INTO worklog(project_id, comment, time_start_ms, time_stop_ms) \
                 VALUES (?1, ?2, COALESCE(?3, {SQL_NOW_MS}), ?4)"
            ),
            params![
                work.project.id.as_i64(),
                work.comment,
                work.start.map(|t| t.timestamp_millis()),
                work.stop.map(|t| t.timestamp_millis()),
            ],
        )?;
        let id = WorkId::new(self.conn.last_insert_rowid());
        debug!("Created work {id} on {:?}", work.project.name);
        self.find_work(id)?
            .ok_or(StoreError::UnknownWork(id.as_i64()))
    }

    fn update_work_stop(&mut self, work: &Work, stop: DateTime<Utc>) -> Result<Work, StoreError> {
        let updated = self.conn.execute(
            "UPDATE worklog SET time_stop_ms = ?2 WHERE id = ?1",
            params![work.id.as_i64(), stop.timestamp_millis()],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownWork(work.id.as_i64()));
        }
        debug!("Closed work {} at {stop}", work.id);
        self.find_work(work.id)?
            .ok_or(StoreError::UnknownWork(work.id.as_i64()))
    }

    fn delete_work(&mut self, work: &Work) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM worklog WHERE id = ?1", params![work.id.as_i64()])?;
        if deleted == 0 {
            return Err(StoreError::UnknownWork(work.id.as_i64()));
        }
        debug!("Deleted work {}", work.id);
        Ok(())
    }

    fn atomically<T, E>(
        &mut self,
        operation: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        // Savepoints nest, so atomic operations can be composed.
        self.conn
            .execute_batch("SAVEPOINT unit_of_work")
            .map_err(StoreError::from)?;
        match operation(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("RELEASE unit_of_work")
                    .map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO unit_of_work; RELEASE unit_of_work")
                {
                    warn!("Failed to roll back unit of work: {rollback}");
                }
                Err(e)
            }
        }
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId::new(row.get(0)?),
        name: row.get(1)?,
    })
}

/// Raw column values of a work row. Timestamps are converted outside of rusqlite so that bad
/// values surface as [StoreError::InvalidTimestamp].
struct WorkRow {
    id: i64,
    project_id: i64,
    project_name: String,
    comment: String,
    start_ms: i64,
    stop_ms: Option<i64>,
}

impl WorkRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            project_name: row.get(2)?,
            comment: row.get(3)?,
            start_ms: row.get(4)?,
            stop_ms: row.get(5)?,
        })
    }

    fn into_work(self) -> Result<Work, StoreError> {
        Ok(Work {
            id: WorkId::new(self.id),
            project: Project {
                id: ProjectId::new(self.project_id),
                name: self.project_name,
            },
            comment: self.comment,
            start: from_millis(self.start_ms)?,
            stop: self.stop_ms.map(from_millis).transpose()?,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms).ok_or(StoreError::InvalidTimestamp(ms))
}

fn map_name_conflict(err: rusqlite::Error, name: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(code, message)
            if code.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|value| value.contains("UNIQUE constraint failed")) =>
        {
            StoreError::DuplicateName(name.to_owned())
        }
        _ => StoreError::Sql(err),
    }
}
