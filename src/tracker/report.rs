use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::{
    storage::{
        entities::{Project, Work, WorkFilter},
        store::Store,
    },
    utils::{clock::Clock, time::whole_seconds},
};

use super::{
    error::TrackerError,
    window::{TimeWindows, Window},
};

#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    /// Names of projects to report on. Empty means all projects. Names that don't exist are
    /// ignored.
    pub projects: Vec<String>,
    pub window: Option<Window>,
    /// Also list projects that have no time in the window.
    pub include_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub project: Project,
    #[serde(serialize_with = "duration_ser::serialize")]
    pub duration: TimeDelta,
}

impl ReportLine {
    pub fn seconds(&self) -> i64 {
        whole_seconds(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Only work started after this instant was counted.
    pub since: Option<DateTime<Utc>>,
    pub lines: Vec<ReportLine>,
    /// Sum over every project considered, including ones left out of `lines`.
    #[serde(serialize_with = "duration_ser::serialize")]
    pub total: TimeDelta,
}

impl Report {
    pub fn total_seconds(&self) -> i64 {
        whole_seconds(self.total)
    }
}

/// Sums up finished work per project. Work in progress never counts.
pub struct ReportAggregator<'a, S: Store> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: Store> ReportAggregator<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Projects keep storage order, also when they were requested by name.
    pub fn report(&self, request: &ReportRequest) -> Result<Report, TrackerError> {
        let since = request
            .window
            .map(|window| TimeWindows::new(self.clock.time(), self.clock.offset()).resolve(window));

        let projects = self
            .store
            .list_projects()?
            .into_iter()
            .filter(|project| {
                request.projects.is_empty() || request.projects.contains(&project.name)
            });

        let mut lines = vec![];
        let mut total = TimeDelta::zero();
        for project in projects {
            let work = self.store.query_closed_work(
                WorkFilter::default()
                    .for_project(project.id)
                    .started_after(since),
            )?;
            let duration = sum_durations(&work);
            total += duration;

            if duration.is_zero() && !request.include_empty {
                continue;
            }
            lines.push(ReportLine { project, duration });
        }

        Ok(Report {
            since,
            lines,
            total,
        })
    }
}

fn sum_durations(work: &[Work]) -> TimeDelta {
    work.iter()
        .filter_map(Work::duration)
        .fold(TimeDelta::zero(), |acc, next| acc + next)
}

/// Durations are written as whole seconds.
mod duration_ser {
    use chrono::TimeDelta;
    use serde::Serializer;

    use crate::utils::time::whole_seconds;

    pub fn serialize<S>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(whole_seconds(*duration))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};

    use crate::{
        storage::{
            entities::{NewWork, Project},
            sqlite::SqliteStore,
            store::Store,
        },
        tracker::window::Window,
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    use super::{ReportAggregator, ReportRequest};

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        offset()
            .with_ymd_and_hms(2024, 3, d, h, m, 0)
            .unwrap()
            .to_utc()
    }

    /// Thursday 2024-03-14 15:00 at -05:00.
    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_time().return_const(local(14, 15, 0));
        clock.expect_offset().return_const(offset());
        clock
    }

    fn add(
        store: &mut SqliteStore,
        project: &Project,
        start: DateTime<Utc>,
        duration: TimeDelta,
    ) -> Result<()> {
        store.create_work(NewWork {
            project,
            comment: "",
            start: Some(start),
            stop: Some(start + duration),
        })?;
        Ok(())
    }

    fn names(report: &super::Report) -> Vec<&str> {
        report
            .lines
            .iter()
            .map(|line| line.project.name.as_str())
            .collect()
    }

    #[test]
    fn test_sums_closed_work() -> Result<()> {
        *TEST_LOGGING;
        let clock = clock();
        let mut store = SqliteStore::in_memory()?;
        let alpha = store.create_project("alpha")?;
        let beta = store.create_project("beta")?;
        add(&mut store, &alpha, local(12, 9, 0), TimeDelta::seconds(1800))?;
        add(&mut store, &alpha, local(13, 9, 0), TimeDelta::seconds(3600))?;
        add(&mut store, &beta, local(13, 11, 0), TimeDelta::seconds(600))?;

        let report = ReportAggregator::new(&store, &clock).report(&ReportRequest::default())?;
        assert_eq!(report.since, None);
        assert_eq!(names(&report), ["alpha", "beta"]);
        assert_eq!(report.lines[0].seconds(), 5400);
        assert_eq!(report.lines[1].seconds(), 600);
        assert_eq!(report.total_seconds(), 6000);
        assert_eq!(
            report.total,
            report.lines.iter().map(|l| l.duration).sum::<TimeDelta>()
        );
        Ok(())
    }

    #[test]
    fn test_open_and_empty_projects_are_hidden() -> Result<()> {
        let clock = clock();
        let mut store = SqliteStore::in_memory()?;
        let alpha = store.create_project("alpha")?;
        let idle = store.create_project("idle")?;
        add(&mut store, &alpha, local(14, 9, 0), TimeDelta::minutes(20))?;
        store.create_work(NewWork {
            project: &idle,
            comment: "",
            start: Some(local(14, 14, 0)),
            stop: None,
        })?;

        let aggregator = ReportAggregator::new(&store, &clock);
        let report = aggregator.report(&ReportRequest::default())?;
        assert_eq!(names(&report), ["alpha"]);

        let report = aggregator.report(&ReportRequest {
            include_empty: true,
            ..Default::default()
        })?;
        assert_eq!(names(&report), ["alpha", "idle"]);
        assert!(report.lines[1].duration.is_zero());
        assert_eq!(report.total, TimeDelta::minutes(20));
        Ok(())
    }

    #[test]
    fn test_unknown_projects_are_ignored() -> Result<()> {
        let clock = clock();
        let mut store = SqliteStore::in_memory()?;
        let alpha = store.create_project("alpha")?;
        let beta = store.create_project("beta")?;
        add(&mut store, &alpha, local(14, 9, 0), TimeDelta::minutes(20))?;
        add(&mut store, &beta, local(14, 10, 0), TimeDelta::minutes(30))?;

        let report = ReportAggregator::new(&store, &clock).report(&ReportRequest {
            projects: vec!["missing".into(), "beta".into(), "alpha".into()],
            ..Default::default()
        })?;
        assert_eq!(names(&report), ["alpha", "beta"]);

        let report = ReportAggregator::new(&store, &clock).report(&ReportRequest {
            projects: vec!["missing".into()],
            include_empty: true,
            ..Default::default()
        })?;
        assert!(report.lines.is_empty());
        assert!(report.total.is_zero());
        Ok(())
    }

    #[test]
    fn test_window_bounds_are_exclusive() -> Result<()> {
        let clock = clock();
        let mut store = SqliteStore::in_memory()?;
        let alpha = store.create_project("alpha")?;
        // Sunday before the reported week.
        add(&mut store, &alpha, local(10, 9, 0), TimeDelta::minutes(60))?;
        // Exactly at the start of the week.
        add(&mut store, &alpha, local(11, 0, 0), TimeDelta::minutes(5))?;
        add(&mut store, &alpha, local(12, 9, 0), TimeDelta::minutes(10))?;
        add(&mut store, &alpha, local(14, 8, 0), TimeDelta::minutes(15))?;

        let aggregator = ReportAggregator::new(&store, &clock);
        let in_window = |window| -> Result<i64> {
            Ok(aggregator
                .report(&ReportRequest {
                    window: Some(window),
                    ..Default::default()
                })?
                .total
                .num_minutes())
        };

        assert_eq!(in_window(Window::Today)?, 15);
        assert_eq!(in_window(Window::Week)?, 25);
        assert_eq!(in_window(Window::Days(1))?, 15);
        assert_eq!(in_window(Window::Days(4))?, 90);
        assert_eq!(in_window(Window::Weeks(1))?, 90);
        assert_eq!(in_window(Window::Month)?, 90);

        let report = aggregator.report(&ReportRequest {
            window: Some(Window::Week),
            ..Default::default()
        })?;
        assert_eq!(report.since, Some(local(11, 0, 0)));
        Ok(())
    }

    #[test]
    fn test_seconds_are_truncated() -> Result<()> {
        let clock = clock();
        let mut store = SqliteStore::in_memory()?;
        let alpha = store.create_project("alpha")?;
        add(&mut store, &alpha, local(14, 9, 0), TimeDelta::milliseconds(1999))?;
        add(&mut store, &alpha, local(14, 10, 0), TimeDelta::milliseconds(1999))?;

        let report = ReportAggregator::new(&store, &clock).report(&ReportRequest::default())?;
        assert_eq!(report.lines[0].seconds(), 3);
        assert_eq!(report.total_seconds(), 3);

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["total"], 3);
        assert_eq!(json["lines"][0]["project"]["name"], "alpha");
        assert_eq!(json["lines"][0]["duration"], 3);
        Ok(())
    }
}
